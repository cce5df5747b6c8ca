use crate::error::{ProcessingError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

/// Field text, decoded as UTF-8 with a Windows-1252 fallback for legacy files
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

pub fn field<'r>(
    record: &'r csv::ByteRecord,
    index: usize,
    name: &'static str,
    line: u64,
) -> Result<&'r [u8]> {
    record
        .get(index)
        .ok_or(ProcessingError::MissingField { field: name, line })
}

fn trimmed(bytes: &[u8]) -> Cow<'_, str> {
    match decode_text(bytes) {
        Cow::Borrowed(text) => Cow::Borrowed(text.trim()),
        Cow::Owned(text) => Cow::Owned(text.trim().to_string()),
    }
}

fn invalid(kind: &str, name: &str, value: &str, line: u64) -> ProcessingError {
    ProcessingError::InvalidFormat(format!(
        "Invalid {} for '{}' on line {}: '{}'",
        kind, name, line, value
    ))
}

pub fn parse_required_str(bytes: &[u8], name: &'static str, line: u64) -> Result<String> {
    let text = trimmed(bytes);
    if text.is_empty() {
        return Err(ProcessingError::MissingField { field: name, line });
    }
    Ok(text.into_owned())
}

/// Field text kept as written, padding included; only a blank value is rejected
pub fn parse_untrimmed_str(bytes: &[u8], name: &'static str, line: u64) -> Result<String> {
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(ProcessingError::MissingField { field: name, line });
    }
    Ok(text.into_owned())
}

pub fn parse_optional_str(bytes: &[u8]) -> Option<String> {
    let text = trimmed(bytes);
    if text.is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

pub fn parse_u32(bytes: &[u8], name: &'static str, line: u64) -> Result<u32> {
    let text = parse_required_str(bytes, name, line)?;
    text.parse::<u32>()
        .map_err(|_| invalid("integer", name, &text, line))
}

pub fn parse_i32(bytes: &[u8], name: &'static str, line: u64) -> Result<i32> {
    let text = parse_required_str(bytes, name, line)?;
    text.parse::<i32>()
        .map_err(|_| invalid("integer", name, &text, line))
}

pub fn parse_u8(bytes: &[u8], name: &'static str, line: u64) -> Result<u8> {
    let text = parse_required_str(bytes, name, line)?;
    text.parse::<u8>()
        .map_err(|_| invalid("integer", name, &text, line))
}

pub fn parse_f64(bytes: &[u8], name: &'static str, line: u64) -> Result<f64> {
    let text = parse_required_str(bytes, name, line)?;
    text.parse::<f64>()
        .map_err(|_| invalid("number", name, &text, line))
}

/// Blank means "not measured"
pub fn parse_optional_f64(bytes: &[u8], name: &'static str, line: u64) -> Result<Option<f64>> {
    match parse_optional_str(bytes) {
        None => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid("number", name, &text, line)),
    }
}

pub fn parse_optional_u8(bytes: &[u8], name: &'static str, line: u64) -> Result<Option<u8>> {
    match parse_optional_str(bytes) {
        None => Ok(None),
        Some(text) => text
            .parse::<u8>()
            .map(Some)
            .map_err(|_| invalid("integer", name, &text, line)),
    }
}

/// Exactly `true` or `false`
pub fn parse_bool(bytes: &[u8], name: &'static str, line: u64) -> Result<bool> {
    let text = parse_required_str(bytes, name, line)?;
    match text.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid("boolean", name, &text, line)),
    }
}

/// `YYYY-MM-DD`, or `default` when the field is blank
pub fn parse_date_or(
    bytes: &[u8],
    format: &str,
    default: NaiveDate,
    name: &'static str,
    line: u64,
) -> Result<NaiveDate> {
    match parse_optional_str(bytes) {
        None => Ok(default),
        Some(text) => NaiveDate::parse_from_str(&text, format)
            .map_err(|_| invalid("date", name, &text, line)),
    }
}

/// `YYYYMMDDHH`
pub fn parse_timestamp(bytes: &[u8], name: &'static str, line: u64) -> Result<NaiveDateTime> {
    let text = parse_required_str(bytes, name, line)?;

    if text.len() != 10 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("timestamp", name, &text, line));
    }

    let number = |range: std::ops::Range<usize>| text[range].parse::<u32>().unwrap_or(u32::MAX);
    let year = number(0..4) as i32;
    let month = number(4..6);
    let day = number(6..8);
    let hour = number(8..10);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| invalid("timestamp", name, &text, line))
}
