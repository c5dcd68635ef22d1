use cinedex_core::{Catalogue, Error, RawRecord, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every catalogue export must provide
pub const REQUIRED_COLUMNS: &[&str] = &[
    "title",
    "type",
    "country",
    "release_year",
    "rating",
    "duration",
    "listed_in",
    "cast",
    "director",
    "description",
    "date_added",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A single JSON array of row objects
    Json,
    /// One JSON object per line
    JsonLines,
}

impl InputFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                InputFormat::JsonLines
            }
            _ => InputFormat::Json,
        }
    }
}

/// Load raw rows from a file, choosing the format by extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path);
    debug!("Loading {:?} as {:?}", path, format);
    let file = File::open(path)?;
    from_reader(BufReader::new(file), format)
}

/// Load and derive a whole catalogue in one step.
pub fn load_catalogue<P: AsRef<Path>>(path: P) -> Result<Catalogue> {
    let raw = load_path(path)?;
    Ok(Catalogue::from_raw(&raw))
}

pub fn from_reader<R: Read>(reader: R, format: InputFormat) -> Result<Vec<RawRecord>> {
    let rows = match format {
        InputFormat::Json => {
            let document: Value = serde_json::from_reader(reader)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            match document {
                Value::Array(rows) => rows,
                other => {
                    return Err(Error::Serialization(format!(
                        "expected a JSON array of rows, found {}",
                        kind_of(&other)
                    )))
                }
            }
        }
        InputFormat::JsonLines => {
            let mut rows = Vec::new();
            for (n, line) in BufReader::new(reader).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line)
                    .map_err(|e| Error::Serialization(format!("line {}: {}", n + 1, e)))?;
                rows.push(row);
            }
            rows
        }
    };

    from_rows(rows)
}

/// Validate the column set and convert each row.
pub fn from_rows(rows: Vec<Value>) -> Result<Vec<RawRecord>> {
    let mut objects = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match row {
            Value::Object(map) => objects.push(map),
            other => {
                return Err(Error::MalformedRow {
                    index,
                    reason: format!("expected an object, found {}", kind_of(&other)),
                })
            }
        }
    }

    if objects.is_empty() {
        warn!("Catalogue input contains no rows");
        return Ok(Vec::new());
    }

    let missing = missing_columns(&objects);
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    let mut unreadable = 0usize;
    let records: Vec<RawRecord> = objects
        .iter()
        .map(|row| convert_row(row, &mut unreadable))
        .collect();

    if unreadable > 0 {
        warn!("{} cells could not be read and were treated as empty", unreadable);
    }
    info!("Loaded {} catalogue rows", records.len());
    Ok(records)
}

/// Required columns that appear in no row at all
pub fn missing_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !rows.iter().any(|row| row.contains_key(**column)))
        .map(|column| column.to_string())
        .collect()
}

fn convert_row(row: &Map<String, Value>, unreadable: &mut usize) -> RawRecord {
    let mut text = |column: &str| text_cell(row.get(column), unreadable);

    RawRecord {
        title: text("title"),
        kind: text("type"),
        country: text("country"),
        rating: text("rating"),
        duration: text("duration"),
        listed_in: text("listed_in"),
        cast: text("cast"),
        director: text("director"),
        description: text("description"),
        date_added: text("date_added"),
        release_year: year_cell(row.get("release_year"), unreadable),
    }
}

fn text_cell(cell: Option<&Value>, unreadable: &mut usize) -> Option<String> {
    let text = match cell? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            match parts {
                Some(parts) => parts.join(", "),
                None => {
                    *unreadable += 1;
                    return None;
                }
            }
        }
        Value::Object(_) => {
            *unreadable += 1;
            return None;
        }
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn year_cell(cell: Option<&Value>, unreadable: &mut usize) -> Option<i32> {
    let year = match cell? {
        Value::Null => return None,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };

    let year = year.and_then(|y| i32::try_from(y).ok());
    if year.is_none() {
        *unreadable += 1;
    }
    year
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn full_row() -> Value {
        json!({
            "show_id": "s1",
            "title": "Dick Johnson Is Dead",
            "type": "Movie",
            "country": "United States",
            "release_year": 2020,
            "rating": "PG-13",
            "duration": "90 min",
            "listed_in": "Documentaries",
            "cast": null,
            "director": "Kirsten Johnson",
            "description": "As her father nears the end of his life...",
            "date_added": "September 25, 2021"
        })
    }

    #[test]
    fn test_from_rows_converts_cells() {
        let records = from_rows(vec![full_row()]).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind.as_deref(), Some("Movie"));
        assert_eq!(record.release_year, Some(2020));
        assert_eq!(record.cast, None);
        assert_eq!(record.director.as_deref(), Some("Kirsten Johnson"));
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let mut row = full_row();
        let map = row.as_object_mut().unwrap();
        map.remove("rating");
        map.remove("listed_in");

        match from_rows(vec![row]) {
            Err(Error::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["rating".to_string(), "listed_in".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_column_present_in_some_rows_is_not_missing() {
        let mut sparse = full_row();
        sparse.as_object_mut().unwrap().remove("country");
        let records = from_rows(vec![sparse, full_row()]).unwrap();
        assert_eq!(records[0].country, None);
        assert_eq!(records[1].country.as_deref(), Some("United States"));
    }

    #[test]
    fn test_release_year_variants() {
        let mut unreadable = 0;
        assert_eq!(year_cell(Some(&json!(1999)), &mut unreadable), Some(1999));
        assert_eq!(year_cell(Some(&json!(1999.0)), &mut unreadable), Some(1999));
        assert_eq!(year_cell(Some(&json!(" 2001 ")), &mut unreadable), Some(2001));
        assert_eq!(unreadable, 0);
        assert_eq!(year_cell(Some(&json!("soon")), &mut unreadable), None);
        assert_eq!(year_cell(Some(&json!(1999.5)), &mut unreadable), None);
        assert_eq!(unreadable, 2);
        assert_eq!(year_cell(Some(&Value::Null), &mut unreadable), None);
        assert_eq!(year_cell(None, &mut unreadable), None);
        assert_eq!(unreadable, 2);
    }

    #[test]
    fn test_text_cells() {
        let mut unreadable = 0;
        assert_eq!(text_cell(Some(&json!("  ")), &mut unreadable), None);
        assert_eq!(
            text_cell(Some(&json!(["Dramas", "Thrillers"])), &mut unreadable),
            Some("Dramas, Thrillers".to_string())
        );
        assert_eq!(text_cell(Some(&json!(42)), &mut unreadable), Some("42".to_string()));
        assert_eq!(text_cell(Some(&json!({"a": 1})), &mut unreadable), None);
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn test_malformed_row() {
        let err = from_rows(vec![full_row(), json!("not a row")]).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { index: 1, .. }));
    }

    #[test]
    fn test_empty_input_is_empty_catalogue() {
        assert!(from_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json!([full_row(), full_row()])).unwrap();
        let records = load_path(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_json_lines_file() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{}", full_row()).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", full_row()).unwrap();

        let catalogue = load_catalogue(file.path()).unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.records()[0].duration_minutes(), Some(90));
    }

    #[test]
    fn test_rejects_non_array_document() {
        let err = from_reader(json!({"title": "x"}).to_string().as_bytes(), InputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(InputFormat::from_path("a/b.jsonl"), InputFormat::JsonLines);
        assert_eq!(InputFormat::from_path("b.NDJSON"), InputFormat::JsonLines);
        assert_eq!(InputFormat::from_path("b.json"), InputFormat::Json);
    }
}
