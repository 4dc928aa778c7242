//! Core data structures for ECLIPSE keyword files.
//!
//! This module defines the fundamental types used throughout the library:
//! - Array type tags and their on-disk geometry
//! - Index entries produced by the header scan
//! - Byte order and stream mode enumerations

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Length of an array name and of a `CHAR` element on disk.
pub const NAME_LENGTH: usize = 8;

/// Length of the type string in an array header.
pub const TYPE_LENGTH: usize = 4;

/// Elements per Fortran record for numeric and logical arrays.
pub const BLOCKSIZE_NUMERIC: usize = 1000;

/// Elements per Fortran record for character arrays.
pub const BLOCKSIZE_CHAR: usize = 105;

/// Matches variable-width string type names like `C042`.
static C0NN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn c0nn_regex() -> &'static Regex {
    C0NN_PATTERN.get_or_init(|| Regex::new(r"^C(\d{3})$").expect("Invalid C0NN type regex pattern"))
}

/// Byte order of the length markers and numeric payloads of a binary file.
///
/// ECLIPSE writes big-endian files; the order is global to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    /// The opposite byte order.
    pub fn flipped(self) -> Self {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }
}

/// Open mode of a [`RecordStream`](crate::ecl::codec::record::RecordStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Read,
    Write,
    Append,
}

/// Element type tag of a keyword array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayType {
    /// Signed 32-bit integers (`INTE`).
    Inte,
    /// 32-bit floats (`REAL`).
    Real,
    /// 64-bit floats (`DOUB`).
    Doub,
    /// Logicals (`LOGI`), stored as 32-bit integers in binary files.
    Logi,
    /// Fixed 8-character strings (`CHAR`).
    Char,
    /// Strings of the given width (`C0NN`).
    C0nn(usize),
    /// Message marker without payload (`MESS`).
    Mess,
}

impl ArrayType {
    /// Parses a 4-character type string from an array header.
    ///
    /// Returns `None` for unknown tags; the caller decides whether that is fatal.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "INTE" => Some(Self::Inte),
            "REAL" => Some(Self::Real),
            "DOUB" => Some(Self::Doub),
            "LOGI" => Some(Self::Logi),
            "CHAR" => Some(Self::Char),
            "MESS" => Some(Self::Mess),
            other => c0nn_regex()
                .captures(other)
                .and_then(|cap| cap[1].parse::<usize>().ok())
                .filter(|width| *width > 0)
                .map(Self::C0nn),
        }
    }

    /// The 4-character type string written to array headers.
    pub fn name(&self) -> String {
        match self {
            Self::Inte => "INTE".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Doub => "DOUB".to_string(),
            Self::Logi => "LOGI".to_string(),
            Self::Char => "CHAR".to_string(),
            Self::Mess => "MESS".to_string(),
            Self::C0nn(width) => format!("C{:03}", width),
        }
    }

    /// Bytes per element in a binary payload.
    pub fn element_width(&self) -> usize {
        match self {
            Self::Inte | Self::Real | Self::Logi => 4,
            Self::Doub => 8,
            Self::Char => NAME_LENGTH,
            Self::C0nn(width) => *width,
            Self::Mess => 0,
        }
    }

    /// Whether elements are strings.
    pub fn is_alpha(&self) -> bool {
        matches!(self, Self::Char | Self::C0nn(_) | Self::Mess)
    }

    /// Number of elements written per record (binary) or per block (formatted).
    pub fn block_size(&self) -> usize {
        if self.is_alpha() {
            BLOCKSIZE_CHAR
        } else {
            BLOCKSIZE_NUMERIC
        }
    }

    /// Number of values per line in formatted files.
    pub fn columns(&self) -> usize {
        match self {
            Self::Inte => 6,
            Self::Real => 4,
            Self::Doub => 3,
            Self::Logi => 25,
            Self::Char | Self::C0nn(_) => 7,
            Self::Mess => 1,
        }
    }

    /// Fixed character width of one value in formatted files.
    pub fn text_width(&self) -> usize {
        match self {
            Self::Inte => 12,
            Self::Real => 17,
            Self::Doub => 23,
            Self::Logi => 3,
            Self::Char => NAME_LENGTH + 3,
            Self::C0nn(width) => width + 3,
            Self::Mess => 0,
        }
    }

    /// Number of blocks needed to hold `count` elements.
    pub fn num_blocks(&self, count: usize) -> usize {
        count.div_ceil(self.block_size())
    }

    /// Element counts of each block, in order.
    pub fn block_lengths(&self, count: usize) -> impl Iterator<Item = usize> {
        let block_size = self.block_size();
        (0..self.num_blocks(count)).map(move |ib| block_size.min(count - ib * block_size))
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One named array found by the header scan.
///
/// The payload is not part of the entry; the facade memoizes it separately
/// so that entries stay cheap to list and clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayEntry {
    /// Array name with trailing blanks removed.
    pub name: String,
    pub array_type: ArrayType,
    /// Declared number of elements.
    pub count: usize,
    /// Absolute byte offset where the payload starts (just past the header).
    pub offset: u64,
}

impl ArrayEntry {
    /// Bytes per element in a binary payload.
    pub fn element_width(&self) -> usize {
        self.array_type.element_width()
    }
}
