//! Adapter for assembling snapshot records into a CourseSnapshot
//!
//! Accepts a whole snapshot document, a JSON array of records, or an NDJSON
//! record stream. Assembled snapshots are validated per record and invalid
//! records are dropped before analysis.

use crate::error::AnalyticsError;
use crate::schema::records::*;
use crate::types::CourseSnapshot;
use std::collections::{BTreeMap, BTreeSet};

/// Adapter for converting snapshot records to a course snapshot
pub struct SnapshotAdapter;

impl SnapshotAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<SnapshotRecord>, AnalyticsError> {
        let records: Vec<SnapshotRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SnapshotRecord>, AnalyticsError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SnapshotRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(AnalyticsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse a snapshot in any supported layout.
    ///
    /// A leading `[` is a record array; otherwise a whole snapshot document
    /// is tried first and an NDJSON stream second.
    pub fn parse(input: &str) -> Result<CourseSnapshot, AnalyticsError> {
        let trimmed = input.trim_start();
        if trimmed.starts_with('[') {
            return Self::from_records(Self::parse_array(trimmed)?);
        }
        match serde_json::from_str::<CourseSnapshot>(trimmed) {
            Ok(snapshot) => Ok(snapshot),
            Err(_) => Self::from_records(Self::parse_ndjson(trimmed)?),
        }
    }

    /// Assemble records into a snapshot. Exactly one course id is allowed.
    pub fn from_records(
        records: impl IntoIterator<Item = SnapshotRecord>,
    ) -> Result<CourseSnapshot, AnalyticsError> {
        let mut course_id: Option<u64> = None;
        let mut snapshot = CourseSnapshot::default();
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

        for record in records {
            *counts.entry(record.kind().as_str()).or_default() += 1;
            match record {
                SnapshotRecord::Course(header) => {
                    header
                        .validate()
                        .map_err(|e| AnalyticsError::InvalidRecord(e.to_string()))?;
                    match course_id {
                        Some(id) if id != header.course_id => {
                            return Err(AnalyticsError::InvalidRecord(format!(
                                "stream mixes courses {} and {}",
                                id, header.course_id
                            )));
                        }
                        _ => course_id = Some(header.course_id),
                    }
                }
                SnapshotRecord::Chapter(chapter) => snapshot.chapters.push(chapter),
                SnapshotRecord::Concept(concept) => snapshot.concepts.push(concept),
                SnapshotRecord::Student(student) => snapshot.students.push(student),
                SnapshotRecord::Attempt(attempt) => snapshot.attempts.push(attempt),
                SnapshotRecord::Answer(answer) => snapshot.answers.push(answer),
                SnapshotRecord::PriorAccuracy(prior) => {
                    snapshot.prior_chapter_accuracy.push(prior)
                }
            }
        }

        snapshot.course_id =
            course_id.ok_or_else(|| AnalyticsError::MissingField("course record".to_string()))?;
        log::debug!("course {}: assembled {:?}", snapshot.course_id, counts);
        Ok(snapshot)
    }

    /// Validate every attempt, answer and prior accuracy of a snapshot.
    ///
    /// Indices are positions within the record's own collection.
    pub fn validate_snapshot(snapshot: &CourseSnapshot) -> Vec<ValidationResult> {
        let chapters: BTreeSet<u64> = snapshot.chapters.iter().map(|c| c.id).collect();
        let concepts: BTreeSet<u64> = snapshot.concepts.iter().map(|c| c.id).collect();
        let mut results = Vec::new();

        for (idx, attempt) in snapshot.attempts.iter().enumerate() {
            if let Err(error) = validate_percentage(attempt.percentage) {
                results.push(ValidationResult {
                    record: RecordKind::Attempt,
                    index: idx,
                    error,
                });
            }
        }

        for (idx, answer) in snapshot.answers.iter().enumerate() {
            let error = match validate_time_spent(answer.time_spent_seconds) {
                Err(error) => Some(error),
                Ok(()) if !chapters.contains(&answer.chapter_id) => {
                    Some(ValidationError::UnknownChapter {
                        chapter_id: answer.chapter_id,
                    })
                }
                Ok(()) => answer
                    .concept_ids
                    .iter()
                    .find(|id| !concepts.contains(id))
                    .map(|id| ValidationError::UnknownConcept { concept_id: *id }),
            };
            if let Some(error) = error {
                results.push(ValidationResult {
                    record: RecordKind::Answer,
                    index: idx,
                    error,
                });
            }
        }

        for (idx, prior) in snapshot.prior_chapter_accuracy.iter().enumerate() {
            if let Err(error) = validate_percentage(prior.accuracy) {
                results.push(ValidationResult {
                    record: RecordKind::PriorAccuracy,
                    index: idx,
                    error,
                });
            }
        }

        results
    }

    /// Drop every record that fails validation, logging each one
    pub fn clean(mut snapshot: CourseSnapshot) -> CourseSnapshot {
        let invalid = Self::validate_snapshot(&snapshot);
        if invalid.is_empty() {
            return snapshot;
        }

        let mut dropped: [BTreeSet<usize>; 3] = Default::default();
        for result in &invalid {
            log::warn!(
                "dropping {} #{}: {}",
                result.record.as_str(),
                result.index,
                result.error
            );
            let slot = match result.record {
                RecordKind::Attempt => 0,
                RecordKind::Answer => 1,
                _ => 2,
            };
            dropped[slot].insert(result.index);
        }

        snapshot.attempts = retain_indices(snapshot.attempts, &dropped[0]);
        snapshot.answers = retain_indices(snapshot.answers, &dropped[1]);
        snapshot.prior_chapter_accuracy =
            retain_indices(snapshot.prior_chapter_accuracy, &dropped[2]);
        snapshot
    }
}

fn retain_indices<T>(items: Vec<T>, dropped: &BTreeSet<usize>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !dropped.contains(idx))
        .map(|(_, item)| item)
        .collect()
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub record: RecordKind,
    pub index: usize,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STREAM: &str = r#"{"record_type":"course","course_id":9,"schema_version":"exam.snapshot_record.v1"}
{"record_type":"chapter","id":1,"name":"Numbers","sequence_order":1}
{"record_type":"concept","id":10,"name":"Fractions","chapter_id":1}

{"record_type":"student","id":7,"name":"Ada"}
{"record_type":"attempt","attempt_id":1,"student_id":7,"exam_id":3,"percentage":64.0,"submitted_at":"2024-03-04T10:00:00Z"}
{"record_type":"answer","attempt_id":1,"student_id":7,"exam_id":3,"question_id":1,"is_correct":true,"chapter_id":1,"concept_ids":[10],"difficulty":"easy","submitted_at":"2024-03-04T10:00:00Z"}
{"record_type":"answer","attempt_id":1,"student_id":7,"exam_id":3,"question_id":2,"is_correct":false,"chapter_id":4,"difficulty":"easy","submitted_at":"2024-03-04T10:00:00Z"}
{"record_type":"prior_accuracy","student_id":7,"chapter_id":1,"accuracy":55.0}"#;

    #[test]
    fn test_parse_ndjson_and_assemble() {
        let records = SnapshotAdapter::parse_ndjson(STREAM).unwrap();
        assert_eq!(records.len(), 8);

        let snapshot = SnapshotAdapter::from_records(records).unwrap();
        assert_eq!(snapshot.course_id, 9);
        assert_eq!(snapshot.chapters.len(), 1);
        assert_eq!(snapshot.answers.len(), 2);
        assert_eq!(snapshot.prior_accuracy(7, 1), Some(55.0));
    }

    #[test]
    fn test_parse_detects_layout() {
        let from_stream = SnapshotAdapter::parse(STREAM).unwrap();
        assert_eq!(from_stream.course_id, 9);

        let document = serde_json::to_string(&from_stream).unwrap();
        assert_eq!(SnapshotAdapter::parse(&document).unwrap(), from_stream);

        let array = r#"[{"record_type":"course","course_id":2}]"#;
        assert_eq!(SnapshotAdapter::parse(array).unwrap().course_id, 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"record_type\":\"course\",\"course_id\":1}\nnot json";
        let err = SnapshotAdapter::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_course_record_is_required_and_unique() {
        let records =
            SnapshotAdapter::parse_array(r#"[{"record_type":"student","id":1,"name":"A"}]"#)
                .unwrap();
        assert!(matches!(
            SnapshotAdapter::from_records(records),
            Err(AnalyticsError::MissingField(_))
        ));

        let records = SnapshotAdapter::parse_array(
            r#"[{"record_type":"course","course_id":1},{"record_type":"course","course_id":2}]"#,
        )
        .unwrap();
        assert!(matches!(
            SnapshotAdapter::from_records(records),
            Err(AnalyticsError::InvalidRecord(_))
        ));

        let stale = r#"[{"record_type":"course","course_id":1,"schema_version":"exam.snapshot_record.v0"}]"#;
        let err = SnapshotAdapter::parse(stale).unwrap_err();
        assert!(err.to_string().contains("Invalid schema version"));
    }

    #[test]
    fn test_validate_and_clean() {
        let mut snapshot = SnapshotAdapter::parse(STREAM).unwrap();
        snapshot.attempts[0].percentage = f64::INFINITY;

        let results = SnapshotAdapter::validate_snapshot(&snapshot);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record, RecordKind::Attempt);
        assert_eq!(
            results[1],
            ValidationResult {
                record: RecordKind::Answer,
                index: 1,
                error: ValidationError::UnknownChapter { chapter_id: 4 },
            }
        );

        let cleaned = SnapshotAdapter::clean(snapshot);
        assert!(cleaned.attempts.is_empty());
        assert_eq!(cleaned.answers.len(), 1);
        assert_eq!(cleaned.answers[0].question_id, 1);
        assert!(SnapshotAdapter::validate_snapshot(&cleaned).is_empty());
    }

    #[test]
    fn test_unknown_concept_and_negative_time() {
        let mut snapshot = SnapshotAdapter::parse(STREAM).unwrap();
        snapshot.answers[0].concept_ids.insert(99);
        snapshot.answers[1].chapter_id = 1;
        snapshot.answers[1].time_spent_seconds = Some(-3.0);

        let errors: Vec<ValidationError> = SnapshotAdapter::validate_snapshot(&snapshot)
            .into_iter()
            .map(|r| r.error)
            .collect();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownConcept { concept_id: 99 },
                ValidationError::InvalidTimeSpent { value: -3.0 },
            ]
        );
    }
}
