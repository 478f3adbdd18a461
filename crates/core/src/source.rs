//! Loading timestamp series from files.

use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: {value:?} is neither microseconds nor an RFC 3339 time")]
    InvalidTimestamp { line: usize, value: String },
    #[error("timestamp {value} at position {index} is before its predecessor {previous}")]
    NotAscending {
        index: usize,
        previous: i64,
        value: i64,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTimestamp {
    Micros(i64),
    Text(String),
}

/// Parse a timestamp series and check it is ascending.
///
/// Accepted inputs:
/// 1. a JSON array of integer microseconds or RFC 3339 strings;
/// 2. newline-separated text, one integer or RFC 3339 time per line, with
///    blank lines and `#` comments skipped.
///
/// An empty input is an empty series.
pub fn parse_timestamps(data: &[u8]) -> Result<Vec<i64>, SourceError> {
    let text = std::str::from_utf8(data)?;
    let timestamps = if text.trim_start().starts_with('[') {
        parse_json(text)?
    } else {
        parse_lines(text)?
    };
    check_ascending(&timestamps)?;
    tracing::debug!(count = timestamps.len(), "parsed timestamps");
    Ok(timestamps)
}

fn parse_json(text: &str) -> Result<Vec<i64>, SourceError> {
    let values: Vec<JsonTimestamp> = serde_json::from_str(text)?;
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            JsonTimestamp::Micros(us) => Ok(us),
            JsonTimestamp::Text(s) => parse_one(&s).ok_or(SourceError::InvalidTimestamp {
                line: i + 1,
                value: s,
            }),
        })
        .collect()
}

fn parse_lines(text: &str) -> Result<Vec<i64>, SourceError> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let us = parse_one(line).ok_or_else(|| SourceError::InvalidTimestamp {
            line: i + 1,
            value: line.to_string(),
        })?;
        out.push(us);
    }
    Ok(out)
}

fn parse_one(value: &str) -> Option<i64> {
    if let Ok(us) = value.parse::<i64>() {
        return Some(us);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_micros())
}

/// Reject a series that is not ascending.
pub fn check_ascending(timestamps: &[i64]) -> Result<(), SourceError> {
    match timestamps.windows(2).position(|w| w[1] < w[0]) {
        Some(i) => Err(SourceError::NotAscending {
            index: i + 1,
            previous: timestamps[i],
            value: timestamps[i + 1],
        }),
        None => Ok(()),
    }
}
