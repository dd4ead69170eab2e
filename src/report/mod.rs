//! Report export formats

pub mod json;
pub mod jsonl;
