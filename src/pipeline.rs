//! Pipeline orchestration
//!
//! This module provides the public API for Exam Insight. It runs every
//! engine over one course snapshot and assembles the student and class
//! reports:
//!
//! 1. SnapshotAdapter - Parse and clean the input records
//! 2. MasteryAggregator - Chapter, concept and difficulty performance
//! 3. TrendEngine - Score and per-dimension trends
//! 4. GapAnalyzer - Learning gaps in priority order
//! 5. ItemAnalysisEngine / ClassAnalyzer - Educator view

use crate::class::{
    class_alerts, AtRiskStudent, ClassAlert, ClassAnalyzer, ClassStatistics,
    DifficultyCalibration, GradeCount, StudentStanding, WeakArea,
};
use crate::classify::Grade;
use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::gaps::{GapAnalyzer, LearningGapsReport};
use crate::items::{ItemAnalysisEngine, QuestionEffectiveness};
use crate::mastery::{
    ChapterAnalysis, ChapterComparisonReport, ConceptAnalysis, DifficultyAnalysis,
    MasteryAggregator,
};
use crate::schema::SnapshotAdapter;
use crate::trend::{MultiDimensionTrend, TrendComparison, TrendEngine};
use crate::types::CourseSnapshot;
use crate::{INSIGHT_VERSION, PRODUCER_NAME};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Engine that produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Producer {
    fn current() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: INSIGHT_VERSION.to_string(),
        }
    }
}

/// Everything computed for one student of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    pub producer: Producer,
    pub course_id: u64,
    pub student_id: u64,
    /// Day the analysis is keyed under
    pub analysis_date: NaiveDate,
    pub computed_at: DateTime<Utc>,
    /// Grade of the overall answer accuracy
    pub grade: Grade,
    pub chapters: ChapterAnalysis,
    pub chapter_comparison: ChapterComparisonReport,
    pub concepts: ConceptAnalysis,
    pub difficulty: DifficultyAnalysis,
    pub trends: MultiDimensionTrend,
    pub class_trend: TrendComparison,
    pub learning_gaps: LearningGapsReport,
    /// `None` when the student has no attempts
    pub standing: Option<StudentStanding>,
}

/// Educator view of a course, or of one exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub producer: Producer,
    pub course_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<u64>,
    pub analysis_date: NaiveDate,
    pub computed_at: DateTime<Utc>,
    pub statistics: ClassStatistics,
    pub grade_distribution: Vec<GradeCount>,
    pub weak_areas: Vec<WeakArea>,
    pub at_risk_students: Vec<AtRiskStudent>,
    /// Exam-scoped only
    pub item_analysis: Vec<QuestionEffectiveness>,
    /// Exam-scoped only
    pub calibration: Vec<DifficultyCalibration>,
    pub alerts: Vec<ClassAlert>,
}

/// Report builder holding the analysis configuration.
///
/// Reports are pure functions of the snapshot, the configuration and the
/// computation time.
pub struct InsightProcessor {
    config: AnalyticsConfig,
}

impl Default for InsightProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
        }
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Load and validate the configuration from JSON
    pub fn load_config(&mut self, json: &str) -> Result<(), AnalyticsError> {
        self.config = AnalyticsConfig::from_json(json)?;
        Ok(())
    }

    pub fn save_config(&self) -> Result<String, AnalyticsError> {
        self.config
            .to_json()
            .map_err(|e| AnalyticsError::EncodingError(e.to_string()))
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn student_report(&self, snapshot: &CourseSnapshot, student_id: u64) -> StudentReport {
        self.student_report_at(snapshot, student_id, Utc::now())
    }

    /// Student report computed as of `computed_at`
    pub fn student_report_at(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
        computed_at: DateTime<Utc>,
    ) -> StudentReport {
        let trend_engine = TrendEngine::new(self.config.moving_average_window);
        let analysis_date = computed_at.date_naive();

        let chapters = MasteryAggregator::chapters(snapshot, student_id, None);
        let report = StudentReport {
            producer: Producer::current(),
            course_id: snapshot.course_id,
            student_id,
            analysis_date,
            computed_at,
            grade: Grade::from_percentage(chapters.raw_overall_accuracy()),
            chapter_comparison: MasteryAggregator::compare_chapters(snapshot, student_id),
            concepts: MasteryAggregator::concepts(snapshot, student_id, None),
            difficulty: MasteryAggregator::difficulty(
                snapshot,
                student_id,
                None,
                &self.config.difficulty_benchmarks,
            ),
            trends: trend_engine.multi_dimension(snapshot, student_id),
            class_trend: trend_engine.compare_with_class(snapshot, student_id),
            learning_gaps: GapAnalyzer::new().analyze(snapshot, student_id, analysis_date),
            standing: ClassAnalyzer::new(self.config.clone()).standing(snapshot, student_id),
            chapters,
        };

        log::debug!(
            "student {} in course {}: {} chapters, {} gaps",
            student_id,
            snapshot.course_id,
            report.chapters.chapters.len(),
            report.learning_gaps.total_gaps
        );
        report
    }

    pub fn class_report(&self, snapshot: &CourseSnapshot, exam_id: Option<u64>) -> ClassReport {
        self.class_report_at(snapshot, exam_id, Utc::now())
    }

    /// Class report computed as of `computed_at`
    pub fn class_report_at(
        &self,
        snapshot: &CourseSnapshot,
        exam_id: Option<u64>,
        computed_at: DateTime<Utc>,
    ) -> ClassReport {
        let analyzer = ClassAnalyzer::new(self.config.clone());

        let statistics = analyzer.statistics(snapshot, exam_id);
        let weak_areas = analyzer.weak_areas(snapshot, exam_id);
        let at_risk_students = analyzer.at_risk_students(snapshot);
        let (item_analysis, calibration) = match exam_id {
            Some(id) => (
                ItemAnalysisEngine::new(self.config.discrimination_group_fraction)
                    .analyze_exam(snapshot, id),
                analyzer.calibration(snapshot, id),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let alerts = class_alerts(&statistics, &weak_areas, &item_analysis, &at_risk_students);

        log::debug!(
            "course {} exam {:?}: {} attempts, {} alerts",
            snapshot.course_id,
            exam_id,
            statistics.submitted_count,
            alerts.len()
        );

        ClassReport {
            producer: Producer::current(),
            course_id: snapshot.course_id,
            exam_id,
            analysis_date: computed_at.date_naive(),
            computed_at,
            grade_distribution: analyzer.grade_distribution(snapshot, exam_id),
            statistics,
            weak_areas,
            at_risk_students,
            item_analysis,
            calibration,
            alerts,
        }
    }

    /// Parse a snapshot (document, record array or NDJSON), drop invalid
    /// records and return the student report as JSON
    pub fn student_report_from_json(
        &self,
        snapshot_json: &str,
        student_id: u64,
    ) -> Result<String, AnalyticsError> {
        let snapshot = load_snapshot(snapshot_json)?;
        encode(&self.student_report(&snapshot, student_id))
    }

    pub fn class_report_from_json(
        &self,
        snapshot_json: &str,
        exam_id: Option<u64>,
    ) -> Result<String, AnalyticsError> {
        let snapshot = load_snapshot(snapshot_json)?;
        encode(&self.class_report(&snapshot, exam_id))
    }
}

/// Parse and clean a snapshot in any supported layout
pub fn load_snapshot(input: &str) -> Result<CourseSnapshot, AnalyticsError> {
    let snapshot = SnapshotAdapter::parse(input)?;
    Ok(SnapshotAdapter::clean(snapshot))
}

fn encode<T: Serialize>(report: &T) -> Result<String, AnalyticsError> {
    serde_json::to_string(report).map_err(|e| AnalyticsError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassAlert;
    use crate::gaps::GapType;
    use crate::types::{
        AnswerRecord, AttemptSummary, ChapterMeta, Difficulty, QuestionType, StudentMeta,
    };
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        format!("2024-03-{:02}T10:00:00Z", day).parse().unwrap()
    }

    /// Two chapters (2 builds on 1), two students, two exams a week apart
    fn sample_snapshot() -> CourseSnapshot {
        let mut snapshot = CourseSnapshot::new(5);
        snapshot.chapters = vec![
            ChapterMeta {
                id: 1,
                name: "Numbers".to_string(),
                sequence_order: 1,
                prerequisites: Vec::new(),
            },
            ChapterMeta {
                id: 2,
                name: "Algebra".to_string(),
                sequence_order: 2,
                prerequisites: vec![1],
            },
        ];
        snapshot.students = vec![
            StudentMeta {
                id: 1,
                name: "Ada".to_string(),
            },
            StudentMeta {
                id: 2,
                name: "Grace".to_string(),
            },
        ];

        let mut attempt_id = 0;
        for (student_id, exam_id, day, chapter_1, chapter_2) in [
            (1, 1, 4, 1, 2),
            (1, 2, 11, 1, 1),
            (2, 1, 4, 4, 4),
            (2, 2, 11, 4, 4),
        ] {
            attempt_id += 1;
            let mut correct_total = 0;
            for (chapter_id, correct) in [(1, chapter_1), (2, chapter_2)] {
                for q in 0..4u64 {
                    let is_correct = q < correct;
                    correct_total += is_correct as u32;
                    snapshot.answers.push(AnswerRecord {
                        attempt_id,
                        student_id,
                        exam_id,
                        question_id: exam_id * 100 + chapter_id * 10 + q,
                        is_correct,
                        is_skipped: false,
                        time_spent_seconds: Some(40.0),
                        chapter_id,
                        concept_ids: Default::default(),
                        difficulty: Difficulty::Medium,
                        question_type: QuestionType::Mcq,
                        selected_option_id: None,
                        submitted_at: at(day),
                    });
                }
            }
            snapshot.attempts.push(AttemptSummary {
                attempt_id,
                student_id,
                exam_id,
                percentage: correct_total as f64 / 8.0 * 100.0,
                submitted_at: at(day),
            });
        }
        snapshot
    }

    #[test]
    fn test_student_report() {
        let snapshot = sample_snapshot();
        let report = InsightProcessor::new().student_report_at(&snapshot, 1, at(12));

        assert_eq!(report.producer.name, "exam-insight");
        assert_eq!(report.analysis_date, at(12).date_naive());
        // 5 of 16 answers correct
        assert_eq!(report.chapters.overall_accuracy, 31.25);
        assert_eq!(report.grade, Grade::F);
        assert_eq!(report.trends.overall.data_points, 2);

        // Numbers 25%, Algebra 37.5%: both under 60, so a foundational gap
        let gaps = &report.learning_gaps;
        assert_eq!(gaps.total_gaps, 1);
        assert_eq!(gaps.gaps[0].gap_type, GapType::Foundational);
        assert_eq!(gaps.priority_order, vec![gaps.gaps[0].gap_id]);

        let standing = report.standing.unwrap();
        assert_eq!(standing.rank, 2);
        assert_eq!(standing.class_size, 2);
    }

    #[test]
    fn test_student_report_is_reproducible() {
        let snapshot = sample_snapshot();
        let processor = InsightProcessor::new();

        let first = processor.student_report_at(&snapshot, 1, at(12));
        let second = processor.student_report_at(&snapshot, 1, at(12));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_student_gets_empty_report() {
        let report = InsightProcessor::new().student_report_at(&sample_snapshot(), 99, at(12));

        assert!(report.chapters.chapters.is_empty());
        assert_eq!(report.learning_gaps.total_gaps, 0);
        assert!(report.standing.is_none());
    }

    #[test]
    fn test_class_report_course_and_exam() {
        let snapshot = sample_snapshot();
        let processor = InsightProcessor::new();

        let course = processor.class_report_at(&snapshot, None, at(12));
        assert_eq!(course.statistics.submitted_count, 4);
        assert!(course.item_analysis.is_empty());
        assert!(course.calibration.is_empty());
        assert_eq!(course.at_risk_students.len(), 1);
        assert_eq!(course.at_risk_students[0].student_name, "Ada");

        let exam = processor.class_report_at(&snapshot, Some(1), at(12));
        assert_eq!(exam.exam_id, Some(1));
        assert_eq!(exam.statistics.submitted_count, 2);
        assert_eq!(exam.item_analysis.len(), 8);
        assert_eq!(exam.calibration.len(), 1);
        assert!(!exam.alerts.contains(&ClassAlert::OnTrack));
    }

    #[test]
    fn test_json_boundary() {
        let processor = InsightProcessor::new();
        let json = serde_json::to_string(&sample_snapshot()).unwrap();

        let report = processor.student_report_from_json(&json, 2).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["student_id"], 2);
        assert_eq!(value["producer"]["name"], "exam-insight");

        assert!(matches!(
            processor.class_report_from_json("not json", None),
            Err(AnalyticsError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_round_trip() {
        let mut processor = InsightProcessor::new();
        processor.load_config(r#"{"pass_threshold": 55.0}"#).unwrap();
        assert_eq!(processor.config().pass_threshold, 55.0);

        let saved = processor.save_config().unwrap();
        let reloaded = AnalyticsConfig::from_json(&saved).unwrap();
        assert_eq!(&reloaded, processor.config());

        assert!(processor
            .load_config(r#"{"moving_average_window": 0}"#)
            .is_err());
    }
}
