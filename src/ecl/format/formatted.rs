//! Formatted (text) keyword files.
//!
//! The text layout is fully determined by the array header, so the scan
//! seeks over payloads exactly as the binary scan does.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use log::{debug, info, trace};

use crate::ecl::codec::record::RecordStream;
use crate::ecl::codec::text;
use crate::ecl::types::elements::{ArrayData, EclArray};
use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::{ArrayEntry, ArrayType};

use super::ScanResult;

/// Longest header line accepted when looking for its newline.
const MAX_HEADER_LINE: usize = 128;

/// Reads the next header line, skipping blank lines.
///
/// Returns `None` at end of file. On success the reader sits just past the
/// newline that ends the header.
fn read_header_line<R: Read + Seek>(reader: &mut R) -> Result<Option<String>> {
    loop {
        let start = reader.stream_position()?;
        let mut buf = [0u8; MAX_HEADER_LINE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
            if buf[..filled].contains(&b'\n') {
                break;
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        let (line, consumed) = match buf[..filled].iter().position(|b| *b == b'\n') {
            Some(pos) => (&buf[..pos], pos + 1),
            None if filled < buf.len() => (&buf[..filled], filled),
            None => {
                return Err(EclError::InvalidFormat(format!("array header at offset {} has no line end", start)));
            }
        };
        reader.seek(SeekFrom::Start(start + consumed as u64))?;
        let line = String::from_utf8_lossy(line);
        if line.trim().is_empty() {
            continue;
        }
        return Ok(Some(line.into_owned()));
    }
}

/// Indexes every array header of a formatted file without parsing values.
pub fn scan<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<ScanResult> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    let mut entries = Vec::new();

    while let Some(line) = read_header_line(reader)? {
        let (name, count, type_name) = text::parse_header(&line)?;
        let array_type = ArrayType::from_name(&type_name)
            .ok_or_else(|| EclError::UnsupportedArrayType { name: name.clone(), type_name })?;
        let offset = reader.stream_position()?;
        let span = text::text_span(array_type, count, line.ends_with('\r'));
        if offset + span > file_len {
            return Err(EclError::InvalidFormat(format!(
                "array '{}' needs {} bytes at offset {} but {} ends at {}",
                name,
                span,
                offset,
                path.display(),
                file_len
            )));
        }
        trace!("Indexed {} {} x{} at {}", name, array_type, count, offset);
        reader.seek(SeekFrom::Start(offset + span))?;
        entries.push(ArrayEntry { name, array_type, count, offset });
    }

    let end_offset = reader.stream_position()?;
    info!("Scanned {} arrays in formatted file {}", entries.len(), path.display());
    Ok(ScanResult { entries, end_offset })
}

/// Whether the header line ending just before `offset` ends in `\r\n`.
fn header_ends_with_crlf<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<bool> {
    if offset < 2 {
        return Ok(false);
    }
    reader.seek(SeekFrom::Start(offset - 2))?;
    let mut tail = [0u8; 2];
    reader.read_exact(&mut tail)?;
    Ok(tail == *b"\r\n")
}

/// Reads the exact text window of one array and parses it positionally.
pub fn load<R: Read + Seek>(reader: &mut R, entry: &ArrayEntry) -> Result<ArrayData> {
    debug!("Loading formatted array {} ({} x{})", entry.name, entry.array_type, entry.count);
    if entry.array_type == ArrayType::Mess {
        return Ok(ArrayData::Mess);
    }
    let crlf = header_ends_with_crlf(reader, entry.offset)?;
    reader.seek(SeekFrom::Start(entry.offset))?;
    let mut window = vec![0u8; text::text_span(entry.array_type, entry.count, crlf) as usize];
    reader.read_exact(&mut window)?;

    let name = entry.name.as_str();
    let fields = text::split_fields(&window, entry.array_type.text_width());
    let data = match entry.array_type {
        ArrayType::Inte => ArrayData::Inte(fields.map(|f| text::parse_inte(f, name)).collect::<Result<_>>()?),
        ArrayType::Real => ArrayData::Real(fields.map(|f| text::parse_real(f, name)).collect::<Result<_>>()?),
        ArrayType::Doub => ArrayData::Doub(fields.map(|f| text::parse_doub(f, name)).collect::<Result<_>>()?),
        ArrayType::Logi => ArrayData::Logi(fields.map(|f| text::parse_logi(f, name)).collect::<Result<_>>()?),
        ArrayType::Char | ArrayType::C0nn(_) => ArrayData::Str(fields.map(text::parse_string).collect()),
        ArrayType::Mess => ArrayData::Mess,
    };

    if data.len() != entry.count {
        return Err(EclError::DimensionMismatch {
            array: entry.name.clone(),
            expected: entry.count,
            actual: data.len(),
        });
    }
    Ok(data)
}

/// Writes one array as a header line followed by its value lines.
///
/// The stream must be in formatted mode; record markers are not written.
pub fn write_array<W: Write + Seek>(stream: &mut RecordStream<W>, array: &EclArray) -> Result<()> {
    if !stream.is_formatted() {
        return Err(EclError::InvalidState("formatted arrays need a formatted stream".to_string()));
    }
    let mut out = text::format_header(&array.name, array.len(), array.array_type);
    let block_size = array.array_type.block_size();
    let columns = array.array_type.columns();

    let fields: Vec<String> = match &array.data {
        ArrayData::Inte(values) => values.iter().map(|v| text::format_inte(*v)).collect(),
        ArrayData::Real(values) => values.iter().map(|v| text::format_real(*v)).collect(),
        ArrayData::Doub(values) => values.iter().map(|v| text::format_doub(*v)).collect(),
        ArrayData::Logi(values) => values.iter().map(|v| text::format_logi(*v)).collect(),
        ArrayData::Str(values) => {
            let width = array.array_type.element_width();
            values.iter().map(|v| text::format_string(v, width)).collect()
        }
        ArrayData::Mess => Vec::new(),
    };

    for block in fields.chunks(block_size) {
        for line in block.chunks(columns) {
            for field in line {
                out.push_str(field);
            }
            out.push('\n');
        }
    }

    let (bytes, _, _) = WINDOWS_1252.encode(&out);
    stream.begin_write(0)?;
    stream.write_payload(&bytes)?;
    stream.end_write()?;
    debug!("Wrote formatted array {} ({} x{})", array.name, array.array_type, array.len());
    Ok(())
}
