// Rendering of result shapes to stdout.
//
// JSON is the native shape. CSV writes the row list of a tabular view, one
// column per field; list-valued cells are joined with "; ".

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::cli::Format;

/// Keys that hold the row list of a tabular view, in lookup order.
const ROW_KEYS: &[&str] = &["table", "data", "teams", "top_teams", "players"];

pub fn emit<W: Write>(out: &mut W, value: &Value, format: Format) -> Result<()> {
    match format {
        Format::Json => write_json(out, value),
        Format::Csv => match rows_of(value) {
            Some(rows) => write_csv(out, &rows),
            None => write_json(out, value),
        },
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}

/// Row objects of a tabular view, or `None` for non-tabular shapes such as
/// the error object or season info.
fn rows_of(value: &Value) -> Option<Vec<Map<String, Value>>> {
    if value.get("error").is_some() {
        return None;
    }
    if let Some(items) = value.as_array() {
        return objects(items);
    }
    // Transfer summary: two lists, tagged by direction.
    if let (Some(ins), Some(outs)) = (
        value.get("transfers_in").and_then(Value::as_array),
        value.get("transfers_out").and_then(Value::as_array),
    ) {
        let tag = |items: &Vec<Value>, direction: &str| {
            objects(items).map(|rows| {
                rows.into_iter()
                    .map(|row| {
                        let mut tagged = Map::new();
                        tagged.insert("direction".into(), Value::from(direction));
                        tagged.extend(row);
                        tagged
                    })
                    .collect::<Vec<_>>()
            })
        };
        let mut rows = tag(ins, "in")?;
        rows.extend(tag(outs, "out")?);
        return Some(rows);
    }
    ROW_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .and_then(|items| objects(items))
}

fn objects(items: &[Value]) -> Option<Vec<Map<String, Value>>> {
    items.iter().map(|v| v.as_object().cloned()).collect()
}

fn write_csv<W: Write>(out: &mut W, rows: &[Map<String, Value>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let Some(first) = rows.first() else {
        writer.flush()?;
        return Ok(());
    };
    let headers: Vec<&String> = first.keys().collect();
    writer.write_record(&headers).context("failed to write CSV header")?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default())
            .collect();
        writer.write_record(&record).context("failed to write CSV row")?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
    }
}
