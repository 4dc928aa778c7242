//! Binary keyword files.
//!
//! Each array is a 16 byte header record `[name:8][count:i32][type:4]`
//! followed by its payload split into blocks of 1000 elements (105 for
//! strings), every block stored as its own Fortran record.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info, trace};

use crate::ecl::codec::record::RecordStream;
use crate::ecl::types::elements::{ArrayData, EclArray};
use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::{ArrayEntry, ArrayType, ByteOrder, StreamMode, NAME_LENGTH, TYPE_LENGTH};
use crate::ecl::utils;

use super::ScanResult;

/// Payload length of an array header record.
pub const HEADER_PAYLOAD_LENGTH: usize = NAME_LENGTH + 4 + TYPE_LENGTH;

/// Size of a Fortran record's two length markers.
const MARKER_OVERHEAD: u64 = 8;

/// On-disk size of an array payload including its record markers.
pub fn payload_span(array_type: ArrayType, count: usize) -> u64 {
    let width = array_type.element_width() as u64;
    array_type
        .block_lengths(count)
        .map(|n| MARKER_OVERHEAD + n as u64 * width)
        .sum()
}

/// Parses a 16 byte header payload into an entry at `offset`.
fn parse_header(payload: &[u8], byte_order: ByteOrder, offset: u64) -> Result<ArrayEntry> {
    if payload.len() != HEADER_PAYLOAD_LENGTH {
        return Err(EclError::InvalidFormat(format!(
            "array header record has {} bytes, expected {}",
            payload.len(),
            HEADER_PAYLOAD_LENGTH
        )));
    }
    let name = utils::decode_text(&payload[..NAME_LENGTH]);
    let count = utils::decode_i32s(&payload[NAME_LENGTH..NAME_LENGTH + 4], byte_order)[0];
    let type_name = utils::decode_text(&payload[NAME_LENGTH + 4..]);
    let array_type = ArrayType::from_name(&type_name)
        .ok_or_else(|| EclError::UnsupportedArrayType { name: name.clone(), type_name: type_name.clone() })?;
    let count = usize::try_from(count)
        .map_err(|_| EclError::InvalidFormat(format!("negative element count {} for array '{}'", count, name)))?;
    Ok(ArrayEntry { name, array_type, count, offset })
}

/// Indexes every array header of a binary file without reading payloads.
pub fn scan<R: Read + Seek>(reader: &mut R, byte_order: ByteOrder, path: &Path) -> Result<ScanResult> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    let mut stream = RecordStream::new(reader, StreamMode::Read, false, byte_order).with_path(path);
    let mut entries = Vec::new();

    while let Some(header) = stream.read_record()? {
        let offset = stream.position()?;
        let entry = parse_header(&header, byte_order, offset)?;
        let span = payload_span(entry.array_type, entry.count);
        if offset + span > file_len {
            return Err(EclError::InvalidFormat(format!(
                "array '{}' needs {} bytes at offset {} but {} ends at {}",
                entry.name,
                span,
                offset,
                path.display(),
                file_len
            )));
        }
        trace!("Indexed {} {} x{} at {}", entry.name, entry.array_type, entry.count, offset);
        stream.seek_to(offset + span)?;
        entries.push(entry);
    }

    let end_offset = stream.position()?;
    info!("Scanned {} arrays in binary file {}", entries.len(), path.display());
    Ok(ScanResult { entries, end_offset })
}

/// Reads and decodes the payload of one indexed array.
pub fn load<R: Read + Seek>(reader: &mut R, entry: &ArrayEntry, byte_order: ByteOrder, path: &Path) -> Result<ArrayData> {
    debug!("Loading array {} ({} x{})", entry.name, entry.array_type, entry.count);
    reader.seek(SeekFrom::Start(entry.offset))?;
    let mut stream = RecordStream::new(reader, StreamMode::Read, false, byte_order).with_path(path);
    let width = entry.element_width();
    let mut raw = Vec::with_capacity(entry.count * width);

    for n in entry.array_type.block_lengths(entry.count) {
        let block = stream.read_record()?.ok_or_else(|| {
            EclError::InvalidFormat(format!("unexpected end of file inside array '{}'", entry.name))
        })?;
        if block.len() != n * width {
            return Err(EclError::InvalidFormat(format!(
                "block of array '{}' has {} bytes, expected {}",
                entry.name,
                block.len(),
                n * width
            )));
        }
        raw.extend_from_slice(&block);
    }

    Ok(decode_payload(&raw, entry.array_type, byte_order))
}

fn decode_payload(raw: &[u8], array_type: ArrayType, byte_order: ByteOrder) -> ArrayData {
    match array_type {
        ArrayType::Inte => ArrayData::Inte(utils::decode_i32s(raw, byte_order)),
        ArrayType::Real => ArrayData::Real(utils::decode_f32s(raw, byte_order)),
        ArrayType::Doub => ArrayData::Doub(utils::decode_f64s(raw, byte_order)),
        ArrayType::Logi => ArrayData::Logi(utils::decode_i32s(raw, byte_order).into_iter().map(|v| v != 0).collect()),
        ArrayType::Char | ArrayType::C0nn(_) => {
            ArrayData::Str(raw.chunks(array_type.element_width()).map(utils::decode_text).collect())
        }
        ArrayType::Mess => ArrayData::Mess,
    }
}

/// Whether the first block of a LOGI array stores `true` as `1`.
///
/// ECLIPSE writes `-1`; other toolchains write `1`.
pub fn logi_uses_positive_true<R: Read + Seek>(
    reader: &mut R,
    entry: &ArrayEntry,
    byte_order: ByteOrder,
    path: &Path,
) -> Result<bool> {
    reader.seek(SeekFrom::Start(entry.offset))?;
    let mut stream = RecordStream::new(reader, StreamMode::Read, false, byte_order).with_path(path);
    let Some(block) = stream.read_record()? else {
        return Ok(false);
    };
    Ok(utils::decode_i32s(&block, byte_order).contains(&1))
}

/// Writes one array: the header record followed by its payload blocks.
pub fn write_array<W: Write + Seek>(stream: &mut RecordStream<W>, array: &EclArray) -> Result<()> {
    let order = stream.byte_order();
    let count = i32::try_from(array.len())
        .map_err(|_| EclError::InvalidFormat(format!("array '{}' has too many elements", array.name)))?;

    let mut header = Vec::with_capacity(HEADER_PAYLOAD_LENGTH);
    utils::encode_text(&mut header, &array.name, NAME_LENGTH);
    utils::encode_i32s(&mut header, [count], order);
    utils::encode_text(&mut header, &array.array_type.name(), TYPE_LENGTH);
    stream.write_record(&header)?;

    let block_size = array.array_type.block_size();
    let width = array.array_type.element_width();
    let mut block = Vec::with_capacity(block_size * width);
    match &array.data {
        ArrayData::Inte(values) => {
            for chunk in values.chunks(block_size) {
                block.clear();
                utils::encode_i32s(&mut block, chunk.iter().copied(), order);
                stream.write_record(&block)?;
            }
        }
        ArrayData::Real(values) => {
            for chunk in values.chunks(block_size) {
                block.clear();
                utils::encode_f32s(&mut block, chunk, order);
                stream.write_record(&block)?;
            }
        }
        ArrayData::Doub(values) => {
            for chunk in values.chunks(block_size) {
                block.clear();
                utils::encode_f64s(&mut block, chunk, order);
                stream.write_record(&block)?;
            }
        }
        ArrayData::Logi(values) => {
            for chunk in values.chunks(block_size) {
                block.clear();
                utils::encode_i32s(&mut block, chunk.iter().map(|&v| if v { -1 } else { 0 }), order);
                stream.write_record(&block)?;
            }
        }
        ArrayData::Str(values) => {
            for chunk in values.chunks(block_size) {
                block.clear();
                for value in chunk {
                    utils::encode_text(&mut block, value, width);
                }
                stream.write_record(&block)?;
            }
        }
        ArrayData::Mess => {}
    }
    debug!("Wrote array {} ({} x{})", array.name, array.array_type, array.len());
    Ok(())
}
