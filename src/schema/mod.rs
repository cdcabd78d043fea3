//! exam.snapshot_record.v1 schema
//!
//! This module defines the record-stream input format for course snapshots
//! and the adapter that assembles, validates and cleans them.

mod adapter;
mod records;

pub use adapter::*;
pub use records::*;
