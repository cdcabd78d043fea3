//! Learning gap detection
//!
//! Four independent detectors (foundational, conceptual, application, speed)
//! each scan a student's answers for one kind of gap. Their results are
//! concatenated and then prioritized with a single stable sort, so the final
//! order does not depend on how the detectors were scheduled.

mod application;
mod conceptual;
mod foundational;
mod speed;

pub use application::ApplicationGapDetector;
pub use conceptual::ConceptualGapDetector;
pub use foundational::FoundationalGapDetector;
pub use speed::SpeedGapDetector;

use crate::aggregate::{by_chapter, AggregateBucket};
use crate::classify::GapSeverity;
use crate::stats::round2;
use crate::types::{AnswerRecord, CourseSnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Accuracy every gap is measured against
pub const TARGET_ACCURACY: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    /// A prerequisite chapter is weak
    Foundational,
    /// A concept is repeatedly answered wrong
    Conceptual,
    /// Recall is fine but constructed answers fail
    Application,
    /// Accurate but much slower than the class
    Speed,
}

impl GapType {
    /// Sort rank at equal severity, foundations first
    pub fn rank(&self) -> u8 {
        match self {
            GapType::Foundational => 0,
            GapType::Conceptual => 1,
            GapType::Application => 2,
            GapType::Speed => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::Foundational => "foundational",
            GapType::Conceptual => "conceptual",
            GapType::Application => "application",
            GapType::Speed => "speed",
        }
    }

    /// Follow-up steps suggested for this kind of gap
    pub fn action_items(&self, topic: &str) -> Vec<String> {
        match self {
            GapType::Foundational => vec![
                format!("Review foundational material for {}", topic),
                "Complete prerequisite practice exercises".to_string(),
                "Watch tutorial videos on basic concepts".to_string(),
                "Take a mini-quiz to assess improvement".to_string(),
            ],
            GapType::Conceptual => vec![
                format!("Re-read the chapter on {}", topic),
                "Create summary notes or flashcards".to_string(),
                "Work through solved examples step by step".to_string(),
                "Explain the concept to someone else or write it out".to_string(),
            ],
            GapType::Application => vec![
                "Practice with real-world problem scenarios".to_string(),
                "Work on case studies and complex problems".to_string(),
                "Start with guided problems, then try unguided ones".to_string(),
                "Review worked solutions to understand problem-solving approaches".to_string(),
            ],
            GapType::Speed => vec![
                "Practice with timed quizzes".to_string(),
                "Review shortcuts and efficient methods".to_string(),
                "Build muscle memory through repetition".to_string(),
                "Focus on one topic at a time until fluent".to_string(),
            ],
        }
    }
}

/// Estimated effort to close a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationTime {
    #[serde(rename = "3-4 weeks")]
    ThreeToFourWeeks,
    #[serde(rename = "2-3 weeks")]
    TwoToThreeWeeks,
    #[serde(rename = "1-2 weeks")]
    OneToTwoWeeks,
    #[serde(rename = "few days")]
    FewDays,
}

impl RemediationTime {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy < 30.0 {
            RemediationTime::ThreeToFourWeeks
        } else if accuracy < 50.0 {
            RemediationTime::TwoToThreeWeeks
        } else if accuracy < 70.0 {
            RemediationTime::OneToTwoWeeks
        } else {
            RemediationTime::FewDays
        }
    }
}

/// One detected learning gap. Recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningGap {
    /// Name-based id over (student, gap type, subject); stable across re-runs
    pub gap_id: Uuid,
    pub gap_type: GapType,
    pub severity: GapSeverity,
    pub chapter_id: u64,
    pub chapter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_name: Option<String>,
    pub current_accuracy: f64,
    pub target_accuracy: f64,
    /// 0-100
    pub impact_score: f64,
    pub recommendation: String,
    pub action_items: Vec<String>,
    pub estimated_fix_time: RemediationTime,
}

impl LearningGap {
    /// Start a gap on a chapter; detectors fill in the rest
    fn new(
        ctx: &GapContext<'_>,
        gap_type: GapType,
        subject: &str,
        chapter_id: u64,
        current_accuracy: f64,
    ) -> Self {
        Self {
            gap_id: gap_id(ctx.student_id, gap_type, subject),
            gap_type,
            severity: GapSeverity::from_accuracy(current_accuracy),
            chapter_id,
            chapter_name: ctx.chapter_name(chapter_id),
            concept_id: None,
            concept_name: None,
            prerequisite_id: None,
            prerequisite_name: None,
            current_accuracy: round2(current_accuracy),
            target_accuracy: TARGET_ACCURACY,
            impact_score: 0.0,
            recommendation: String::new(),
            action_items: Vec::new(),
            estimated_fix_time: RemediationTime::from_accuracy(current_accuracy),
        }
    }
}

/// Deterministic gap id
pub fn gap_id(student_id: u64, gap_type: GapType, subject: &str) -> Uuid {
    let name = format!("{}:{}:{}", student_id, gap_type.as_str(), subject);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Read-only view shared by every detector for one student
pub struct GapContext<'a> {
    pub snapshot: &'a CourseSnapshot,
    pub student_id: u64,
    /// The student's answers
    pub answers: Vec<&'a AnswerRecord>,
    /// The student's answers grouped by chapter
    pub chapters: BTreeMap<u64, AggregateBucket>,
}

impl<'a> GapContext<'a> {
    pub fn new(snapshot: &'a CourseSnapshot, student_id: u64) -> Self {
        let answers: Vec<&AnswerRecord> = snapshot.student_answers(student_id).collect();
        let chapters = by_chapter(answers.iter().copied());
        Self {
            snapshot,
            student_id,
            answers,
            chapters,
        }
    }

    /// Unrounded student accuracy in a chapter, `None` without answers
    pub fn chapter_accuracy(&self, chapter_id: u64) -> Option<f64> {
        self.chapters
            .get(&chapter_id)
            .filter(|b| !b.is_empty())
            .map(AggregateBucket::raw_accuracy)
    }

    pub fn chapter_name(&self, chapter_id: u64) -> String {
        self.snapshot
            .chapter(chapter_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }
}

/// A single kind of gap detection
pub trait GapDetector {
    fn gap_type(&self) -> GapType;

    /// Gaps of this kind; empty when nothing qualifies
    fn detect(&self, ctx: &GapContext<'_>) -> Vec<LearningGap>;
}

/// Result of a full gap run for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningGapsReport {
    pub student_id: u64,
    pub course_id: u64,
    pub analysis_date: NaiveDate,
    pub total_gaps: usize,
    pub critical_gaps: usize,
    pub high_gaps: usize,
    /// Prioritized, most urgent first
    pub gaps: Vec<LearningGap>,
    pub priority_order: Vec<Uuid>,
}

/// Runs every detector and prioritizes the merged result
pub struct GapAnalyzer {
    detectors: Vec<Box<dyn GapDetector>>,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self {
            detectors: vec![
                Box::new(FoundationalGapDetector),
                Box::new(ConceptualGapDetector),
                Box::new(ApplicationGapDetector),
                Box::new(SpeedGapDetector),
            ],
        }
    }
}

impl GapAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a custom set of detectors
    pub fn with_detectors(detectors: Vec<Box<dyn GapDetector>>) -> Self {
        Self { detectors }
    }

    pub fn analyze(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
        analysis_date: NaiveDate,
    ) -> LearningGapsReport {
        let ctx = GapContext::new(snapshot, student_id);

        let mut gaps = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(&ctx);
            log::debug!(
                "student {}: {} {} gaps",
                student_id,
                found.len(),
                detector.gap_type().as_str()
            );
            gaps.extend(found);
        }
        prioritize(&mut gaps);

        let count = |severity: GapSeverity| {
            gaps.iter().filter(|g| g.severity == severity).count()
        };
        LearningGapsReport {
            student_id,
            course_id: snapshot.course_id,
            analysis_date,
            total_gaps: gaps.len(),
            critical_gaps: count(GapSeverity::Critical),
            high_gaps: count(GapSeverity::High),
            priority_order: gaps.iter().map(|g| g.gap_id).collect(),
            gaps,
        }
    }
}

/// Order by severity, then gap type, then impact descending.
/// The sort is stable, so full ties keep detector emission order.
pub fn prioritize(gaps: &mut [LearningGap]) {
    gaps.sort_by(compare_priority);
}

fn compare_priority(a: &LearningGap, b: &LearningGap) -> Ordering {
    a.severity
        .rank()
        .cmp(&b.severity.rank())
        .then_with(|| a.gap_type.rank().cmp(&b.gap_type.rank()))
        .then_with(|| b.impact_score.total_cmp(&a.impact_score))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn gap(gap_type: GapType, severity: GapSeverity, impact: f64, subject: &str) -> LearningGap {
        let snapshot = CourseSnapshot::new(1);
        let ctx = GapContext::new(&snapshot, 1);
        let mut gap = LearningGap::new(&ctx, gap_type, subject, 1, 40.0);
        gap.severity = severity;
        gap.impact_score = impact;
        gap
    }

    #[test]
    fn test_critical_sorts_before_high_regardless_of_impact() {
        let mut gaps = vec![
            gap(GapType::Foundational, GapSeverity::High, 99.0, "a"),
            gap(GapType::Speed, GapSeverity::Critical, 1.0, "b"),
        ];
        prioritize(&mut gaps);
        assert_eq!(gaps[0].severity, GapSeverity::Critical);
    }

    #[test]
    fn test_type_then_impact_order() {
        let mut gaps = vec![
            gap(GapType::Conceptual, GapSeverity::High, 80.0, "a"),
            gap(GapType::Foundational, GapSeverity::High, 10.0, "b"),
            gap(GapType::Conceptual, GapSeverity::High, 90.0, "c"),
            gap(GapType::Conceptual, GapSeverity::High, 90.0, "d"),
        ];
        let tie_first = gaps[2].gap_id;
        prioritize(&mut gaps);

        let types: Vec<GapType> = gaps.iter().map(|g| g.gap_type).collect();
        assert_eq!(
            types,
            vec![
                GapType::Foundational,
                GapType::Conceptual,
                GapType::Conceptual,
                GapType::Conceptual
            ]
        );
        assert_eq!(gaps[1].impact_score, 90.0);
        // equal keys keep emission order
        assert_eq!(gaps[1].gap_id, tie_first);
        assert_eq!(gaps[3].impact_score, 80.0);
    }

    #[test]
    fn test_remediation_bands() {
        assert_eq!(
            RemediationTime::from_accuracy(10.0),
            RemediationTime::ThreeToFourWeeks
        );
        assert_eq!(
            RemediationTime::from_accuracy(45.0),
            RemediationTime::TwoToThreeWeeks
        );
        assert_eq!(
            RemediationTime::from_accuracy(69.9),
            RemediationTime::OneToTwoWeeks
        );
        assert_eq!(RemediationTime::from_accuracy(70.0), RemediationTime::FewDays);
        assert_eq!(
            serde_json::to_string(&RemediationTime::FewDays).unwrap(),
            "\"few days\""
        );
    }

    #[test]
    fn test_gap_ids_are_deterministic() {
        let a = gap_id(7, GapType::Conceptual, "12");
        assert_eq!(a, gap_id(7, GapType::Conceptual, "12"));
        assert_ne!(a, gap_id(7, GapType::Speed, "12"));
        assert_ne!(a, gap_id(8, GapType::Conceptual, "12"));
    }

    #[test]
    fn test_analyzer_merges_and_counts() {
        let mut answers = answers(1, 1, 4, 10);
        answers.extend(super::test_support::answers(1, 2, 5, 10));
        let mut snapshot = snapshot_with(answers);
        snapshot.chapters = vec![chapter(1, &[]), chapter(2, &[1])];

        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let report = GapAnalyzer::new().analyze(&snapshot, 1, date);

        assert_eq!(report.total_gaps, 1);
        assert_eq!(report.high_gaps, 1);
        assert_eq!(report.critical_gaps, 0);
        assert_eq!(report.priority_order, vec![report.gaps[0].gap_id]);

        let again = GapAnalyzer::new().analyze(&snapshot, 1, date);
        assert_eq!(again, report);
    }

    #[test]
    fn test_custom_detector_set() {
        let mut answers = answers(1, 1, 4, 10);
        answers.extend(super::test_support::answers(1, 2, 5, 10));
        let mut snapshot = snapshot_with(answers);
        snapshot.chapters = vec![chapter(1, &[]), chapter(2, &[1])];
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        let speed_only = GapAnalyzer::with_detectors(vec![Box::new(SpeedGapDetector)]);
        assert_eq!(speed_only.analyze(&snapshot, 1, date).total_gaps, 0);

        let foundational_only =
            GapAnalyzer::with_detectors(vec![Box::new(FoundationalGapDetector)]);
        let report = foundational_only.analyze(&snapshot, 1, date);
        assert_eq!(report.total_gaps, 1);
        assert_eq!(report.gaps[0].gap_type, GapType::Foundational);
    }

    #[test]
    fn test_empty_student_has_no_gaps() {
        let snapshot = snapshot_with(Vec::new());
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let report = GapAnalyzer::new().analyze(&snapshot, 1, date);
        assert_eq!(report.total_gaps, 0);
        assert!(report.priority_order.is_empty());
    }
}
