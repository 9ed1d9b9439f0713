//! Result output
//!
//! - `text`: human-readable console report
//! - `json`: machine-readable report file

pub mod json;
pub mod text;
