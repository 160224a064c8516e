// Wire formats for samples: `[timestamp_ms, up, down]` tuples in, JSON/CSV exports out
use crate::domain::sample::{aggregate_by_timestamp, quantize_timestamp, Sample};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("expected a [timestamp, up, down] tuple or a list of them")]
    NotATuple,
    #[error("sample {index}: expected 3 fields, got {len}")]
    WrongArity { index: usize, len: usize },
    #[error("sample {index}: timestamp is not an integer")]
    InvalidTimestamp { index: usize },
    #[error("sample {index}: {field} byte count is not a non-negative integer")]
    InvalidCount { index: usize, field: &'static str },
}

/// Parse one tuple or a list of tuples. Nothing is returned unless every tuple is valid.
pub fn parse_samples(body: &Value, resolution_ms: i64) -> Result<Vec<Sample>, IngestError> {
    let items = body.as_array().ok_or(IngestError::NotATuple)?;

    let is_batch = items.first().is_none_or(Value::is_array);
    if !is_batch {
        return Ok(vec![parse_tuple(items, 0, resolution_ms)?]);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let fields = item.as_array().ok_or(IngestError::NotATuple)?;
            parse_tuple(fields, index, resolution_ms)
        })
        .collect()
}

fn parse_tuple(fields: &[Value], index: usize, resolution_ms: i64) -> Result<Sample, IngestError> {
    let [time, up, down] = fields else {
        return Err(IngestError::WrongArity {
            index,
            len: fields.len(),
        });
    };

    let timestamp_ms = time
        .as_i64()
        .ok_or(IngestError::InvalidTimestamp { index })?;
    let up = up
        .as_u64()
        .ok_or(IngestError::InvalidCount { index, field: "up" })?;
    let down = down
        .as_u64()
        .ok_or(IngestError::InvalidCount {
            index,
            field: "down",
        })?;

    Ok(Sample::new(
        quantize_timestamp(timestamp_ms, resolution_ms),
        up,
        down,
    ))
}

/// `[[timestamp, up, down], ...]`, one row per timestamp, oldest first
pub fn render_json(samples: &[Sample]) -> serde_json::Result<String> {
    let rows: Vec<(i64, u64, u64)> = aggregate_by_timestamp(samples)
        .into_iter()
        .map(|(time, bytes)| (time, bytes.up, bytes.down))
        .collect();
    serde_json::to_string(&rows)
}

pub fn render_csv(samples: &[Sample]) -> String {
    let mut csv = String::from("Time,Bytes Sent,Bytes Downloaded\r\n");
    for (time, bytes) in aggregate_by_timestamp(samples) {
        csv.push_str(&format!("{},{},{}\r\n", time, bytes.up, bytes.down));
    }
    csv
}
