//! Foundational data structures, error types, and typed payloads.

pub mod elements;
pub mod error;
pub mod models;
