//! Custom error types for the eclio crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum EclError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The trailing length marker of a Fortran record differs from its header.
    #[error("Corrupt record #{record} in {path}: header={header}, trailer={trailer}")]
    CorruptRecord {
        path: PathBuf,
        record: u64,
        header: u32,
        trailer: u32,
    },

    /// A typed accessor was used on an array stored with another type.
    #[error("Type mismatch for array '{name}': requested {expected}, stored {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A strict-mode GRDECL keyword contained a token that is not a number.
    #[error("Malformed data in keyword '{keyword}': cannot parse token '{token}'")]
    MalformedKeywordData { keyword: String, token: String },

    /// The array header carries a type string this reader does not know.
    #[error("Unsupported array type '{type_name}' for array '{name}'")]
    UnsupportedArrayType { name: String, type_name: String },

    /// A keyword data buffer would grow past the configured element limit.
    #[error("Keyword '{keyword}' exceeds the maximum of {limit} elements")]
    SizeLimitExceeded { keyword: String, limit: usize },

    /// An array length disagrees with the header-declared count times stride.
    #[error("Dimension mismatch for array '{array}': expected {expected} elements, found {actual}")]
    DimensionMismatch {
        array: String,
        expected: usize,
        actual: usize,
    },

    /// A required array is not present in the (restricted) file view.
    #[error("Missing array '{0}'")]
    MissingArray(String),

    /// An array index or occurrence outside the file.
    #[error("No array at index {index} (file holds {len} arrays)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The record stream was used outside of its begin/end protocol.
    #[error("Invalid record stream state: {0}")]
    InvalidState(String),

    /// The file is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A VFP table axis or value buffer is inconsistent.
    #[error("Invalid VFP table {table}: {reason}")]
    InvalidVfpTable { table: u32, reason: String },

    /// A VFP table cell was never assigned a finite value.
    #[error("VFP table {table} has no value at (t={t}, w={w}, g={g}, a={a}, f={f})")]
    MissingVfpValue {
        table: u32,
        t: usize,
        w: usize,
        g: usize,
        a: usize,
        f: usize,
    },

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

/// A convenience `Result` type alias using the crate's `EclError` type.
pub type Result<T> = std::result::Result<T, EclError>;
