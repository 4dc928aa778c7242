//! # eclio
//!
//! Readers and writers for ECLIPSE-style reservoir simulation result files.
//!
//! - Fortran unformatted record streams with byte order detection
//! - Binary and formatted keyword array files, indexed on open and loaded lazily
//! - GRDECL deck text with `N*value` run-length expansion
//! - Restart step decoding into wells, groups, connections, segments, UDQs,
//!   actions and network nodes
//! - VFP lift tables and project version strings
pub mod ecl;

// Re-export the main types for convenience
pub use ecl::{
    ArrayFile,
    ArrayView,
    EclError,
    OpenOptions,
    Result,
    restart::{
        RestartFile,
        header::RestartHeader,
        state::RestartState,
        units::{UnitSystem, UnitSystemTables},
        well_state::{GridId, WellState},
    },
    types::{
        elements::{ArrayData, EclArray},
        models::{ArrayEntry, ArrayType, ByteOrder},
    },
    version::ProjectVersion,
    vfp::VfpTable,
};
