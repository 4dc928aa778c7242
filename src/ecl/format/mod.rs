//! On-disk encodings of keyword arrays.
//!
//! - `binary`: Fortran record based keyword files (`.UNRST`, `.EGRID`, ...)
//! - `formatted`: fixed-width text keyword files (`.FUNRST`, `.FEGRID`, ...)
//! - `grdecl`: free-form deck text with run-length compression

pub mod binary;
pub mod formatted;
pub mod grdecl;

use crate::ecl::types::models::ArrayEntry;

/// Output of a header-only pass over a keyword file.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Entries in file order.
    pub entries: Vec<ArrayEntry>,
    /// Offset just past the last payload.
    pub end_offset: u64,
}
