//! GRDECL deck text.
//!
//! A keyword sits alone at the start of a line and its data follows as
//! whitespace separated tokens up to a lone `/`. Tokens may be run-length
//! compressed as `N*value`, and `--` starts a comment that runs to the end
//! of the line.

use std::io::{BufRead, Seek, SeekFrom};

use log::{debug, trace, warn};

use crate::ecl::types::elements::{ArrayData, EclArray};
use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::NAME_LENGTH;

/// Largest number of values a single keyword may expand to.
pub const DEFAULT_MAX_ELEMENTS: usize = i32::MAX as usize;

/// Starting capacity of a keyword data buffer.
const INITIAL_CAPACITY: usize = 64;

/// Placeholder token produced for defaulted items (`N*`) in deck records.
pub const DEFAULT_ITEM: &str = "*";

/// Parsing options for keyword data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrdeclOptions {
    /// Fail on tokens that are not numbers instead of skipping them.
    pub strict: bool,
    /// Element cap; beyond it the data is dropped and flagged.
    pub max_elements: usize,
}

impl Default for GrdeclOptions {
    fn default() -> Self {
        Self { strict: true, max_elements: DEFAULT_MAX_ELEMENTS }
    }
}

/// Numeric kind requested for a keyword's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrdeclKind {
    Int,
    Float,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrdeclValues {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl GrdeclValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Data read for one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct GrdeclData {
    pub values: GrdeclValues,
    /// The data exceeded [`GrdeclOptions::max_elements`]; `values` is empty.
    pub size_limit_exceeded: bool,
}

impl GrdeclData {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts into a keyword array, failing if the size limit was hit.
    pub fn into_array(self, keyword: &str, limit: usize) -> Result<EclArray> {
        if self.size_limit_exceeded {
            return Err(EclError::SizeLimitExceeded { keyword: keyword.to_string(), limit });
        }
        Ok(match self.values {
            GrdeclValues::Int(v) => EclArray::inte(keyword, v),
            GrdeclValues::Float(v) => EclArray::real(keyword, v),
            GrdeclValues::Double(v) => EclArray::doub(keyword, v),
        })
    }
}

impl From<GrdeclValues> for ArrayData {
    fn from(values: GrdeclValues) -> Self {
        match values {
            GrdeclValues::Int(v) => ArrayData::Inte(v),
            GrdeclValues::Float(v) => ArrayData::Real(v),
            GrdeclValues::Double(v) => ArrayData::Doub(v),
        }
    }
}

/// A value type that can be parsed from a deck token.
trait DeckValue: Copy {
    fn parse_token(token: &str) -> Option<Self>;
}

impl DeckValue for i32 {
    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl DeckValue for f32 {
    fn parse_token(token: &str) -> Option<Self> {
        token.replace(['D', 'd'], "E").parse().ok()
    }
}

impl DeckValue for f64 {
    fn parse_token(token: &str) -> Option<Self> {
        token.replace(['D', 'd'], "E").parse().ok()
    }
}

/// Removes a trailing `--` comment.
fn strip_comment(line: &str) -> &str {
    match line.find("--") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Reads one raw line, `None` at end of file.
fn next_line<R: BufRead>(stream: &mut R) -> Result<Option<String>> {
    let mut raw = Vec::new();
    if stream.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

/// Splits `N*value` into its repeat count and value.
///
/// Plain tokens repeat once. Returns `None` if the multiplier is not a
/// positive integer.
fn split_multiplier(token: &str) -> Option<(usize, &str)> {
    match token.split_once('*') {
        Some((count, value)) => count.parse::<usize>().ok().filter(|n| *n > 0).map(|n| (n, value)),
        None => Some((1, token)),
    }
}

/// Splits a token at a `/` terminator. Returns the data part and whether
/// the terminator was present.
fn split_terminator(token: &str) -> (&str, bool) {
    match token.find('/') {
        Some(pos) => (&token[..pos], true),
        None => (token, false),
    }
}

/// Advances to the next keyword that starts a line.
///
/// If the stream is in the middle of a line, the rest of that line is
/// skipped first. Comment lines and data lines are passed over. On success
/// the stream sits at the first character of the keyword; at end of file it
/// is left where it was and `false` is returned.
///
/// A stream already at the start of a keyword line stays there, so calling
/// this twice finds the same keyword. Consume it with [`read_keyword_name`]
/// or use [`next_keyword`] to step from keyword to keyword.
pub fn seek_next_keyword<R: BufRead + Seek>(stream: &mut R) -> Result<bool> {
    let start = stream.stream_position()?;
    if start > 0 {
        stream.seek(SeekFrom::Start(start - 1))?;
        let mut previous = [0u8; 1];
        stream.read_exact(&mut previous)?;
        if previous[0] != b'\n' {
            next_line(stream)?;
        }
    }

    loop {
        let line_start = stream.stream_position()?;
        let mut raw = Vec::new();
        if stream.read_until(b'\n', &mut raw)? == 0 {
            stream.seek(SeekFrom::Start(start))?;
            return Ok(false);
        }
        let lead = raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let rest = &raw[lead..];
        if rest.is_empty() || rest.starts_with(b"--") {
            continue;
        }
        if rest[0].is_ascii_alphabetic() {
            stream.seek(SeekFrom::Start(line_start + lead as u64))?;
            return Ok(true);
        }
    }
}

/// Reads the keyword at the current position and consumes its line.
pub fn read_keyword_name<R: BufRead>(stream: &mut R) -> Result<Option<String>> {
    let Some(line) = next_line(stream)? else {
        return Ok(None);
    };
    Ok(strip_comment(&line)
        .split_whitespace()
        .next()
        .map(|token| token.chars().take(NAME_LENGTH).collect()))
}

/// Finds the next keyword and consumes its line.
///
/// Repeated calls walk the keywords of a deck in order, passing over the
/// data of each one. Returns `None` at end of file.
pub fn next_keyword<R: BufRead + Seek>(stream: &mut R) -> Result<Option<String>> {
    if !seek_next_keyword(stream)? {
        return Ok(None);
    }
    let name = read_keyword_name(stream)?;
    trace!("Next keyword: {:?}", name);
    Ok(name)
}

/// Scans forward for `name`, stopping at `limit` if given.
fn find_forward<R: BufRead + Seek>(name: &str, stream: &mut R, limit: Option<u64>) -> Result<bool> {
    while seek_next_keyword(stream)? {
        let position = stream.stream_position()?;
        if limit.is_some_and(|limit| position >= limit) {
            return Ok(false);
        }
        if read_keyword_name(stream)?.as_deref() == Some(name) {
            stream.seek(SeekFrom::Start(position))?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Positions the stream at the next occurrence of keyword `name`.
///
/// With `wrap_around`, the search restarts once from the beginning of the
/// file. When the keyword is not found the position is restored.
pub fn seek_keyword<R: BufRead + Seek>(name: &str, wrap_around: bool, stream: &mut R) -> Result<bool> {
    let start = stream.stream_position()?;
    if find_forward(name, stream, None)? {
        return Ok(true);
    }
    if wrap_around && start > 0 {
        stream.seek(SeekFrom::Start(0))?;
        if find_forward(name, stream, Some(start))? {
            return Ok(true);
        }
    }
    stream.seek(SeekFrom::Start(start))?;
    trace!("Keyword {} not found", name);
    Ok(false)
}

fn collect_values<T: DeckValue, R: BufRead>(
    stream: &mut R,
    keyword: &str,
    options: &GrdeclOptions,
) -> Result<(Vec<T>, bool)> {
    let mut values: Vec<T> = Vec::with_capacity(INITIAL_CAPACITY.min(options.max_elements));
    let mut exceeded = false;

    while let Some(line) = next_line(stream)? {
        for token in strip_comment(&line).split_whitespace() {
            let (token, terminated) = split_terminator(token);
            if !token.is_empty() {
                let parsed = split_multiplier(token)
                    .and_then(|(count, value)| T::parse_token(value).map(|v| (count, v)));
                match parsed {
                    Some((count, value)) if !exceeded => {
                        if values.len().saturating_add(count) > options.max_elements {
                            warn!("Keyword {} exceeds {} elements; data dropped", keyword, options.max_elements);
                            exceeded = true;
                            values = Vec::new();
                        } else {
                            if values.capacity() - values.len() < count {
                                let wanted = (values.len() + count).max(values.capacity() * 2);
                                values.reserve_exact(wanted.min(options.max_elements) - values.len());
                            }
                            values.extend(std::iter::repeat(value).take(count));
                        }
                    }
                    Some(_) => {}
                    None if options.strict => {
                        return Err(EclError::MalformedKeywordData {
                            keyword: keyword.to_string(),
                            token: token.to_string(),
                        });
                    }
                    None => debug!("Skipping token '{}' in keyword {}", token, keyword),
                }
            }
            if terminated {
                return Ok((values, exceeded));
            }
        }
    }

    warn!("Keyword {} is not terminated by '/'", keyword);
    Ok((values, exceeded))
}

/// Reads keyword data from the current position up to the terminating `/`.
///
/// The stream must sit just past the keyword line. `keyword` is only used
/// for messages.
pub fn read_keyword_data<R: BufRead>(
    stream: &mut R,
    keyword: &str,
    options: &GrdeclOptions,
    kind: GrdeclKind,
) -> Result<GrdeclData> {
    let (values, size_limit_exceeded) = match kind {
        GrdeclKind::Int => {
            let (v, exceeded) = collect_values::<i32, _>(stream, keyword, options)?;
            (GrdeclValues::Int(v), exceeded)
        }
        GrdeclKind::Float => {
            let (v, exceeded) = collect_values::<f32, _>(stream, keyword, options)?;
            (GrdeclValues::Float(v), exceeded)
        }
        GrdeclKind::Double => {
            let (v, exceeded) = collect_values::<f64, _>(stream, keyword, options)?;
            (GrdeclValues::Double(v), exceeded)
        }
    };
    debug!("Read {} values for keyword {}", values.len(), keyword);
    Ok(GrdeclData { values, size_limit_exceeded })
}

/// Finds keyword `name` and reads its data.
pub fn read_keyword<R: BufRead + Seek>(
    name: &str,
    wrap_around: bool,
    stream: &mut R,
    options: &GrdeclOptions,
    kind: GrdeclKind,
) -> Result<Option<GrdeclData>> {
    if !seek_keyword(name, wrap_around, stream)? {
        return Ok(None);
    }
    read_keyword_name(stream)?;
    read_keyword_data(stream, name, options, kind).map(Some)
}

/// Reads `count` slash-terminated records of raw items.
///
/// `N*value` expands to `N` copies of `value` and a bare `N*` to `N`
/// [`DEFAULT_ITEM`] placeholders. Quotes around items are removed.
pub fn read_records<R: BufRead>(stream: &mut R, count: usize) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::with_capacity(count);
    let mut current = Vec::new();

    while records.len() < count {
        let Some(line) = next_line(stream)? else {
            return Err(EclError::InvalidFormat(format!(
                "expected {} records but the file ended after {}",
                count,
                records.len()
            )));
        };
        for token in strip_comment(&line).split_whitespace() {
            let (token, terminated) = split_terminator(token);
            if !token.is_empty() {
                match split_multiplier(token) {
                    Some((n, "")) => current.extend(std::iter::repeat(DEFAULT_ITEM.to_string()).take(n)),
                    Some((n, value)) => {
                        current.extend(std::iter::repeat(value.trim_matches('\'').to_string()).take(n))
                    }
                    None => current.push(token.trim_matches('\'').to_string()),
                }
            }
            if terminated {
                records.push(std::mem::take(&mut current));
                if records.len() == count {
                    break;
                }
            }
        }
    }
    Ok(records)
}

/// Guesses whether a stream holds GRDECL text.
///
/// The first line that is neither blank nor a comment must hold a single
/// keyword-like token. The stream position is restored.
pub fn is_grdecl_file<R: BufRead + Seek>(stream: &mut R) -> Result<bool> {
    let start = stream.stream_position()?;
    let mut verdict = false;
    while let Some(line) = next_line(stream)? {
        let content = strip_comment(&line).trim();
        if content.is_empty() {
            continue;
        }
        let mut tokens = content.split_whitespace();
        verdict = match (tokens.next(), tokens.next()) {
            (Some(keyword), None) => {
                keyword.len() <= NAME_LENGTH
                    && keyword.starts_with(|c: char| c.is_ascii_alphabetic())
                    && keyword.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
            }
            _ => false,
        };
        break;
    }
    stream.seek(SeekFrom::Start(start))?;
    Ok(verdict)
}
