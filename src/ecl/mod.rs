//! Core ECLIPSE result file module

pub mod codec;
pub mod format;
pub mod reader;
pub mod restart;
pub mod types;
pub mod utils;
pub mod version;
pub mod vfp;
pub mod view;

pub use reader::{ArrayFile, OpenOptions};
pub use types::error::{EclError, Result};
pub use view::ArrayView;
