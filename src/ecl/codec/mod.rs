//! Record framing and value text codecs.

pub mod record;
pub mod text;

pub use record::{is_fortran_file, RecordStream};
