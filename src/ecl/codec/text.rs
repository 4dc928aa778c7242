//! Fixed-width value text used by formatted keyword files.
//!
//! Every value occupies [`ArrayType::text_width`] characters and a line holds
//! [`ArrayType::columns`] values, so the byte span of an array follows from
//! its header alone.

use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::{ArrayType, NAME_LENGTH};
use crate::ecl::utils;

/// Length of a formatted array header line including the newline.
pub const HEADER_LINE_LENGTH: usize = 31;

/// Formats an array header line: ` 'NAME    '         123 'TYPE'`.
pub fn format_header(name: &str, count: usize, array_type: ArrayType) -> String {
    format!(
        " '{}' {:>11} '{}'\n",
        utils::fixed_width(name, NAME_LENGTH),
        count,
        array_type.name()
    )
}

/// Parses a header line back into `(name, count, type string)`.
pub fn parse_header(line: &str) -> Result<(String, usize, String)> {
    let parts: Vec<&str> = line.split('\'').collect();
    if parts.len() < 5 {
        return Err(EclError::InvalidFormat(format!("malformed array header line: {:?}", line)));
    }
    let name = parts[1].trim_end().to_string();
    let count = parts[2]
        .trim()
        .parse::<usize>()
        .map_err(|_| EclError::InvalidFormat(format!("malformed element count in header: {:?}", line)))?;
    Ok((name, count, parts[3].to_string()))
}

/// Byte span of a formatted payload of `count` elements.
///
/// Each block of values ends with a newline, as does every full line.
pub fn payload_span(array_type: ArrayType, count: usize) -> u64 {
    if array_type == ArrayType::Mess {
        return 0;
    }
    let width = array_type.text_width();
    let columns = array_type.columns();
    array_type
        .block_lengths(count)
        .map(|n| (n * width + n.div_ceil(columns)) as u64)
        .sum()
}

/// Byte span of a formatted payload whose lines end in `\r\n` when `crlf`
/// is set.
pub fn text_span(array_type: ArrayType, count: usize, crlf: bool) -> u64 {
    let span = payload_span(array_type, count);
    if !crlf || array_type == ArrayType::Mess {
        return span;
    }
    let columns = array_type.columns();
    let lines: u64 = array_type.block_lengths(count).map(|n| n.div_ceil(columns) as u64).sum();
    span + lines
}

/// Splits a finite value into its sign, `digits` mantissa digits
/// for a `0.ddd` form, and the matching decimal exponent.
///
/// Rounding is left to the float formatter so powers of ten never print as
/// `1.000`.
fn scientific_parts(value: f64, digits: usize) -> (&'static str, String, i32) {
    if value == 0.0 {
        return ("", "0".repeat(digits), 0);
    }
    let text = format!("{:.*e}", digits.saturating_sub(1), value.abs());
    let (lead, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let pow = exp.parse::<i32>().unwrap_or(0) + 1;
    let sign = if value < 0.0 { "-" } else { "" };
    (sign, lead.replace('.', ""), pow)
}

/// Formats a float as `  0.dddddddddE+ee` (REAL) or `  0.dddd…D+ee` (DOUB).
///
/// A three digit exponent takes the place of the marker, as in
/// `0.dddd…-123`, so the field width never changes.
fn format_scientific(value: f64, digits: usize, exponent_marker: char, width: usize) -> String {
    if !value.is_finite() {
        return format!("{:>width$}", value, width = width);
    }
    let (sign, mantissa, pow) = scientific_parts(value, digits);
    let body = format!("{}0.{}", sign, mantissa);
    if pow.abs() >= 100 {
        return format!("  {:>mw$}{:+04}", body, pow, mw = digits + 3);
    }
    format!("  {:>mw$}{}{:+03}", body, exponent_marker, pow, mw = digits + 3)
}

/// Formats a REAL value in its 17 character field.
pub fn format_real(value: f32) -> String {
    format_scientific(f64::from(value), 8, 'E', ArrayType::Real.text_width())
}

/// Formats a DOUB value in its 23 character field.
pub fn format_doub(value: f64) -> String {
    format_scientific(value, 14, 'D', ArrayType::Doub.text_width())
}

pub fn format_inte(value: i32) -> String {
    format!(" {:>11}", value)
}

pub fn format_logi(value: bool) -> String {
    if value { "  T".to_string() } else { "  F".to_string() }
}

/// Formats a quoted string padded to `width` characters.
pub fn format_string(value: &str, width: usize) -> String {
    format!(" '{}'", utils::fixed_width(value, width))
}

/// Splits a formatted payload into its fixed-width value fields.
///
/// Fields are cut positionally within each line, so quoted strings may
/// contain blanks. A `\r` before the newline is dropped.
pub fn split_fields<'a>(text: &'a [u8], width: usize) -> impl Iterator<Item = &'a [u8]> + 'a {
    text.split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .flat_map(move |line| line.chunks(width.max(1)))
        .filter(|field| !field.iter().all(u8::is_ascii_whitespace))
}

fn field_str<'a>(field: &'a [u8], name: &str) -> Result<&'a str> {
    std::str::from_utf8(field)
        .map(str::trim)
        .map_err(|_| EclError::InvalidFormat(format!("non-text numeric field in array '{}'", name)))
}

fn malformed(name: &str, token: &str) -> EclError {
    EclError::MalformedKeywordData { keyword: name.to_string(), token: token.to_string() }
}

pub fn parse_inte(field: &[u8], name: &str) -> Result<i32> {
    let token = field_str(field, name)?;
    token.parse::<i32>().map_err(|_| malformed(name, token))
}

/// Rewrites a Fortran float token for Rust's parser: `D` becomes `E` and a
/// bare signed exponent such as `0.1-123` gets its `E` back.
fn float_token(token: &str) -> String {
    let mut text = token.replace(['D', 'd'], "E");
    if !text.contains(['E', 'e']) {
        if let Some(at) = text.rfind(['+', '-']).filter(|at| *at > 0) {
            text.insert(at, 'E');
        }
    }
    text
}

pub fn parse_real(field: &[u8], name: &str) -> Result<f32> {
    let token = field_str(field, name)?;
    float_token(token).parse::<f32>().map_err(|_| malformed(name, token))
}

pub fn parse_doub(field: &[u8], name: &str) -> Result<f64> {
    let token = field_str(field, name)?;
    float_token(token).parse::<f64>().map_err(|_| malformed(name, token))
}

pub fn parse_logi(field: &[u8], name: &str) -> Result<bool> {
    let token = field_str(field, name)?;
    match token {
        "T" | "t" => Ok(true),
        "F" | "f" => Ok(false),
        other => Err(malformed(name, other)),
    }
}

/// Extracts the text between the quotes of a string field.
pub fn parse_string(field: &[u8]) -> String {
    let start = field.iter().position(|b| *b == b'\'').map_or(0, |p| p + 1);
    let end = field.iter().rposition(|b| *b == b'\'').filter(|e| *e >= start).unwrap_or(field.len());
    utils::decode_text(&field[start..end])
}
