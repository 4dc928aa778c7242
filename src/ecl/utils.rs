//! Low-level byte reading utilities

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::WINDOWS_1252;

use super::types::models::ByteOrder;

/// Read a 4-byte signed integer in the given byte order.
///
/// Used for Fortran record markers and array header counts.
pub fn read_i32(reader: &mut impl Read, order: ByteOrder) -> io::Result<i32> {
    match order {
        ByteOrder::Big => reader.read_i32::<BigEndian>(),
        ByteOrder::Little => reader.read_i32::<LittleEndian>(),
    }
}

/// Write a 4-byte signed integer in the given byte order.
pub fn write_i32(writer: &mut impl Write, value: i32, order: ByteOrder) -> io::Result<()> {
    match order {
        ByteOrder::Big => writer.write_i32::<BigEndian>(value),
        ByteOrder::Little => writer.write_i32::<LittleEndian>(value),
    }
}

/// Decode a packed buffer of 4-byte integers.
pub fn decode_i32s(bytes: &[u8], order: ByteOrder) -> Vec<i32> {
    let mut out = vec![0i32; bytes.len() / 4];
    match order {
        ByteOrder::Big => BigEndian::read_i32_into(&bytes[..out.len() * 4], &mut out),
        ByteOrder::Little => LittleEndian::read_i32_into(&bytes[..out.len() * 4], &mut out),
    }
    out
}

/// Decode a packed buffer of 4-byte floats.
pub fn decode_f32s(bytes: &[u8], order: ByteOrder) -> Vec<f32> {
    let mut out = vec![0f32; bytes.len() / 4];
    match order {
        ByteOrder::Big => BigEndian::read_f32_into(&bytes[..out.len() * 4], &mut out),
        ByteOrder::Little => LittleEndian::read_f32_into(&bytes[..out.len() * 4], &mut out),
    }
    out
}

/// Decode a packed buffer of 8-byte floats.
pub fn decode_f64s(bytes: &[u8], order: ByteOrder) -> Vec<f64> {
    let mut out = vec![0f64; bytes.len() / 8];
    match order {
        ByteOrder::Big => BigEndian::read_f64_into(&bytes[..out.len() * 8], &mut out),
        ByteOrder::Little => LittleEndian::read_f64_into(&bytes[..out.len() * 8], &mut out),
    }
    out
}

/// Append integers to a byte buffer.
pub fn encode_i32s(out: &mut Vec<u8>, values: impl IntoIterator<Item = i32>, order: ByteOrder) {
    for v in values {
        match order {
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Append 4-byte floats to a byte buffer.
pub fn encode_f32s(out: &mut Vec<u8>, values: &[f32], order: ByteOrder) {
    for v in values {
        match order {
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Append 8-byte floats to a byte buffer.
pub fn encode_f64s(out: &mut Vec<u8>, values: &[f64], order: ByteOrder) {
    for v in values {
        match order {
            ByteOrder::Big => out.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Decode a fixed-width character field and strip the blank padding.
///
/// ECLIPSE character data is single-byte; bytes outside ASCII are mapped
/// through Windows-1252 so that foreign toolchains never fail a read.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.trim_end_matches([' ', '\0']).to_string()
}

/// Encode a string into exactly `width` bytes, blank padded or truncated.
pub fn encode_text(out: &mut Vec<u8>, text: &str, width: usize) {
    let (bytes, _, _) = WINDOWS_1252.encode(text);
    let take = bytes.len().min(width);
    out.extend_from_slice(&bytes[..take]);
    out.extend(std::iter::repeat(b' ').take(width - take));
}

/// Pads or truncates a string to exactly `width` characters.
pub fn fixed_width(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}
