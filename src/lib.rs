//! Exam Insight - Deterministic compute engine for exam analytics
//!
//! Insight turns a snapshot of evaluated exam answers into student and class
//! analytics through a set of pure engines: statistical primitives →
//! classification rules → mastery aggregation → trends → learning gaps →
//! item analysis.
//!
//! ## Modules
//!
//! - **Student view**: Chapter/concept/difficulty mastery, multi-dimension
//!   trends and prioritized learning gaps
//! - **Educator view**: Class statistics, weak areas, at-risk students and
//!   item (question) analysis

pub mod aggregate;
pub mod class;
pub mod classify;
pub mod config;
pub mod error;
pub mod gaps;
pub mod items;
pub mod mastery;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use pipeline::{ClassReport, InsightProcessor, StudentReport};
pub use types::CourseSnapshot;

// Engine exports
pub use class::ClassAnalyzer;
pub use gaps::{GapAnalyzer, GapDetector};
pub use items::ItemAnalysisEngine;
pub use mastery::MasteryAggregator;
pub use trend::TrendEngine;

// Schema exports
pub use schema::{SnapshotAdapter, SnapshotRecord, SCHEMA_VERSION};

/// Insight version embedded in every report
pub const INSIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "exam-insight";
