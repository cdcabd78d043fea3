//! exam.snapshot_record.v1 schema definition
//!
//! A course snapshot can be streamed as one tagged record per line instead of
//! a single document. Each record carries a `record_type` discriminator:
//! - `course` opens the stream and names the course
//! - `chapter`, `concept`, `student` carry metadata
//! - `attempt`, `answer` carry evaluated results
//! - `prior_accuracy` carries a persisted chapter accuracy

use crate::types::{
    AnswerRecord, AttemptSummary, ChapterMeta, ConceptMeta, PriorAccuracy, StudentMeta,
};
use serde::{Deserialize, Serialize};

/// Current record schema version
pub const SCHEMA_VERSION: &str = "exam.snapshot_record.v1";

/// Header record naming the course the stream belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseHeader {
    pub course_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
}

impl CourseHeader {
    /// A header without a version is accepted as current
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.schema_version {
            Some(version) if version != SCHEMA_VERSION => {
                Err(ValidationError::InvalidSchemaVersion {
                    expected: SCHEMA_VERSION.to_string(),
                    actual: version.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// One line of a snapshot stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum SnapshotRecord {
    Course(CourseHeader),
    Chapter(ChapterMeta),
    Concept(ConceptMeta),
    Student(StudentMeta),
    Attempt(AttemptSummary),
    Answer(AnswerRecord),
    PriorAccuracy(PriorAccuracy),
}

/// Record kinds, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Course,
    Chapter,
    Concept,
    Student,
    Attempt,
    Answer,
    PriorAccuracy,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Course => "course",
            RecordKind::Chapter => "chapter",
            RecordKind::Concept => "concept",
            RecordKind::Student => "student",
            RecordKind::Attempt => "attempt",
            RecordKind::Answer => "answer",
            RecordKind::PriorAccuracy => "prior_accuracy",
        }
    }
}

impl SnapshotRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            SnapshotRecord::Course(_) => RecordKind::Course,
            SnapshotRecord::Chapter(_) => RecordKind::Chapter,
            SnapshotRecord::Concept(_) => RecordKind::Concept,
            SnapshotRecord::Student(_) => RecordKind::Student,
            SnapshotRecord::Attempt(_) => RecordKind::Attempt,
            SnapshotRecord::Answer(_) => RecordKind::Answer,
            SnapshotRecord::PriorAccuracy(_) => RecordKind::PriorAccuracy,
        }
    }
}

pub(crate) fn validate_percentage(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PercentageOutOfRange { value })
    }
}

pub(crate) fn validate_time_spent(seconds: Option<f64>) -> Result<(), ValidationError> {
    match seconds {
        Some(value) if !value.is_finite() || value < 0.0 => {
            Err(ValidationError::InvalidTimeSpent { value })
        }
        _ => Ok(()),
    }
}

/// Validation errors for snapshot records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Percentage out of range [0, 100]: {value}")]
    PercentageOutOfRange { value: f64 },

    #[error("Invalid time spent: {value}")]
    InvalidTimeSpent { value: f64 },

    #[error("Unknown chapter: {chapter_id}")]
    UnknownChapter { chapter_id: u64 },

    #[error("Unknown concept: {concept_id}")]
    UnknownConcept { concept_id: u64 },
}
