//! Class analytics
//!
//! The educator view over a whole course (or one exam): score statistics,
//! grade distribution, class-wide weak areas, at-risk students, difficulty
//! calibration and structured alerts. Also places a single student within
//! the class.

use crate::aggregate::{by_difficulty, AggregateBucket};
use crate::classify::{grade_counts, GapSeverity, Grade};
use crate::config::AnalyticsConfig;
use crate::items::QuestionEffectiveness;
use crate::stats::{
    average, iqr_outliers, median, percentage, percentile, quartile, round2, std_dev, z_score,
    Quartiles,
};
use crate::trend::TrendDirection;
use crate::types::{AnswerRecord, AttemptSummary, CourseSnapshot, Difficulty};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Score change between exams that counts as a sharp move
const SCORE_SWING: f64 = 10.0;

/// Calibration tolerance around a difficulty benchmark
const CALIBRATION_BAND: f64 = 15.0;

const LOW_PASS_RATE: f64 = 60.0;
const HIGH_STD_DEV: f64 = 20.0;
const ALERT_WEAK_AREA_NAMES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStatistics {
    /// Enrolled students
    pub total_students: usize,
    /// Evaluated attempts
    pub submitted_count: usize,
    pub mean_score: f64,
    pub median_score: f64,
    pub std_dev: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub pass_rate: f64,
    pub pass_threshold: f64,
    pub quartiles: Quartiles,
    /// Attempts whose score lies outside the IQR fences
    pub outlier_attempts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakArea {
    pub chapter_id: u64,
    pub chapter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_name: Option<String>,
    pub class_accuracy: f64,
    /// Distinct students with at least one wrong answer here
    pub students_struggling: usize,
    pub struggling_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskIssue {
    BelowPassingThreshold,
    DecliningPerformance,
    /// Latest score fell sharply from the one before
    SharpScoreDrop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskStudent {
    pub student_id: u64,
    pub student_name: String,
    /// Mean attempt score
    pub current_score: f64,
    pub latest_score: f64,
    pub exam_count: usize,
    pub trend: TrendDirection,
    pub risk_level: GapSeverity,
    pub issues: Vec<RiskIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    TooEasy,
    TooHard,
    WellCalibrated,
}

impl CalibrationStatus {
    pub fn classify(accuracy: f64, benchmark: f64) -> Self {
        if accuracy > benchmark + CALIBRATION_BAND {
            CalibrationStatus::TooEasy
        } else if accuracy < benchmark - CALIBRATION_BAND {
            CalibrationStatus::TooHard
        } else {
            CalibrationStatus::WellCalibrated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCalibration {
    pub difficulty: Difficulty,
    pub total_students: usize,
    pub total_attempts: u32,
    pub correct_count: u32,
    pub accuracy: f64,
    pub benchmark: f64,
    pub avg_time: f64,
    pub calibration: CalibrationStatus,
}

/// Structured educator alert; wording is left to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassAlert {
    LowPassRate { pass_rate: f64 },
    HighVariance { std_dev: f64 },
    WeakAreas { chapters: Vec<String> },
    QuestionsNeedRevision { count: usize },
    CriticalRiskStudents { count: usize },
    OnTrack,
}

/// One student's position among the per-student class means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStanding {
    pub student_id: u64,
    pub mean_score: f64,
    pub percentile: f64,
    pub z_score: f64,
    /// 1 = best
    pub rank: usize,
    pub class_size: usize,
}

/// Class-level analyses under one configuration
#[derive(Debug, Clone)]
pub struct ClassAnalyzer {
    config: AnalyticsConfig,
}

impl Default for ClassAnalyzer {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl ClassAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    fn scoped_attempts<'a>(
        snapshot: &'a CourseSnapshot,
        exam_id: Option<u64>,
    ) -> Vec<&'a AttemptSummary> {
        snapshot
            .attempts
            .iter()
            .filter(|a| exam_id.map_or(true, |id| a.exam_id == id))
            .collect()
    }

    pub fn statistics(&self, snapshot: &CourseSnapshot, exam_id: Option<u64>) -> ClassStatistics {
        let attempts = Self::scoped_attempts(snapshot, exam_id);
        let scores: Vec<f64> = attempts.iter().map(|a| a.percentage).collect();
        let pass_threshold = self.config.pass_threshold;

        if scores.is_empty() {
            return ClassStatistics {
                total_students: snapshot.students.len(),
                submitted_count: 0,
                mean_score: 0.0,
                median_score: 0.0,
                std_dev: 0.0,
                min_score: 0.0,
                max_score: 0.0,
                pass_rate: 0.0,
                pass_threshold,
                quartiles: Quartiles::default(),
                outlier_attempts: Vec::new(),
            };
        }

        let passed = scores.iter().filter(|s| **s >= pass_threshold).count();
        let outlier_attempts = iqr_outliers(&scores, self.config.outlier_iqr_multiplier)
            .into_iter()
            .map(|i| attempts[i].attempt_id)
            .collect();
        let q = quartile(&scores);

        ClassStatistics {
            total_students: snapshot.students.len(),
            submitted_count: attempts.len(),
            mean_score: round2(average(&scores)),
            median_score: round2(median(&scores)),
            std_dev: round2(std_dev(&scores)),
            min_score: round2(scores.iter().copied().fold(f64::INFINITY, f64::min)),
            max_score: round2(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            pass_rate: percentage(passed as f64, scores.len() as f64),
            pass_threshold,
            quartiles: Quartiles {
                q1: round2(q.q1),
                q2: round2(q.q2),
                q3: round2(q.q3),
            },
            outlier_attempts,
        }
    }

    /// Grades in fixed order; empty without scores
    pub fn grade_distribution(
        &self,
        snapshot: &CourseSnapshot,
        exam_id: Option<u64>,
    ) -> Vec<GradeCount> {
        let scores: Vec<f64> = Self::scoped_attempts(snapshot, exam_id)
            .iter()
            .map(|a| a.percentage)
            .collect();
        if scores.is_empty() {
            return Vec::new();
        }
        grade_counts(&scores)
            .into_iter()
            .map(|(grade, count)| GradeCount {
                grade,
                count,
                percentage: percentage(count as f64, scores.len() as f64),
            })
            .collect()
    }

    /// Scopes under the weak-area threshold, weakest first. Course-wide
    /// results are per chapter; for one exam they split by concept too.
    pub fn weak_areas(&self, snapshot: &CourseSnapshot, exam_id: Option<u64>) -> Vec<WeakArea> {
        let mut groups: BTreeMap<(u64, Option<u64>), Vec<&AnswerRecord>> = BTreeMap::new();
        for answer in snapshot
            .answers
            .iter()
            .filter(|a| exam_id.map_or(true, |id| a.exam_id == id))
        {
            if exam_id.is_some() && !answer.concept_ids.is_empty() {
                for concept_id in &answer.concept_ids {
                    groups
                        .entry((answer.chapter_id, Some(*concept_id)))
                        .or_default()
                        .push(answer);
                }
            } else {
                groups.entry((answer.chapter_id, None)).or_default().push(answer);
            }
        }

        let mut areas: Vec<WeakArea> = groups
            .into_iter()
            .filter_map(|((chapter_id, concept_id), answers)| {
                let bucket = AggregateBucket::from_answers(answers.iter().copied());
                let class_accuracy = bucket.raw_accuracy();
                if class_accuracy >= self.config.weak_area_threshold {
                    return None;
                }
                let students: BTreeSet<u64> = answers.iter().map(|a| a.student_id).collect();
                let struggling: BTreeSet<u64> = answers
                    .iter()
                    .filter(|a| !a.is_correct)
                    .map(|a| a.student_id)
                    .collect();
                Some(WeakArea {
                    chapter_id,
                    chapter_name: snapshot
                        .chapter(chapter_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    concept_id,
                    concept_name: concept_id
                        .and_then(|id| snapshot.concept(id))
                        .map(|c| c.name.clone()),
                    class_accuracy: round2(class_accuracy),
                    students_struggling: struggling.len(),
                    struggling_percentage: percentage(
                        struggling.len() as f64,
                        students.len() as f64,
                    ),
                })
            })
            .collect();

        areas.sort_by(|a, b| a.class_accuracy.total_cmp(&b.class_accuracy));
        areas.truncate(self.config.weak_area_limit);
        areas
    }

    /// Students with a low mean or a sharp latest drop, lowest mean first
    pub fn at_risk_students(&self, snapshot: &CourseSnapshot) -> Vec<AtRiskStudent> {
        let mut at_risk: Vec<AtRiskStudent> = snapshot
            .attempting_students()
            .into_iter()
            .filter_map(|student_id| {
                let scores: Vec<f64> = snapshot
                    .student_attempts(student_id)
                    .iter()
                    .map(|a| a.percentage)
                    .collect();
                let latest = *scores.last()?;
                let mean = average(&scores);
                let sharp_drop =
                    scores.len() >= 2 && latest < scores[scores.len() - 2] - SCORE_SWING;
                if mean >= self.config.at_risk_threshold && !sharp_drop {
                    return None;
                }

                let trend = score_trend(&scores);
                let mut issues = Vec::new();
                if mean < self.config.pass_threshold {
                    issues.push(RiskIssue::BelowPassingThreshold);
                }
                if trend == TrendDirection::Declining {
                    issues.push(RiskIssue::DecliningPerformance);
                }
                if sharp_drop {
                    issues.push(RiskIssue::SharpScoreDrop);
                }

                Some(AtRiskStudent {
                    student_id,
                    student_name: snapshot
                        .students
                        .iter()
                        .find(|s| s.id == student_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                    current_score: round2(mean),
                    latest_score: round2(latest),
                    exam_count: scores.len(),
                    trend,
                    risk_level: risk_level(mean),
                    issues,
                })
            })
            .collect();

        at_risk.sort_by(|a, b| a.current_score.total_cmp(&b.current_score));
        log::debug!("course {}: {} students at risk", snapshot.course_id, at_risk.len());
        at_risk
    }

    /// Class accuracy per difficulty level of one exam vs its benchmark
    pub fn calibration(
        &self,
        snapshot: &CourseSnapshot,
        exam_id: u64,
    ) -> Vec<DifficultyCalibration> {
        let answers: Vec<&AnswerRecord> = snapshot.exam_answers(exam_id).collect();
        let buckets = by_difficulty(answers.iter().copied());

        buckets
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(level, bucket)| {
                let accuracy = bucket.raw_accuracy();
                let benchmark = *self.config.difficulty_benchmarks.get(level);
                let students: BTreeSet<u64> = answers
                    .iter()
                    .filter(|a| a.difficulty == level)
                    .map(|a| a.student_id)
                    .collect();
                DifficultyCalibration {
                    difficulty: level,
                    total_students: students.len(),
                    total_attempts: bucket.total,
                    correct_count: bucket.correct,
                    accuracy: round2(accuracy),
                    benchmark,
                    avg_time: round2(bucket.avg_time()),
                    calibration: CalibrationStatus::classify(accuracy, benchmark),
                }
            })
            .collect()
    }

    /// Where one student stands among per-student mean scores.
    /// `None` when the student has no attempts.
    pub fn standing(&self, snapshot: &CourseSnapshot, student_id: u64) -> Option<StudentStanding> {
        let means: Vec<(u64, f64)> = snapshot
            .attempting_students()
            .into_iter()
            .map(|id| {
                let scores: Vec<f64> = snapshot
                    .student_attempts(id)
                    .iter()
                    .map(|a| a.percentage)
                    .collect();
                (id, average(&scores))
            })
            .collect();
        let (_, mean_score) = *means.iter().find(|(id, _)| *id == student_id)?;

        let values: Vec<f64> = means.iter().map(|(_, m)| *m).collect();
        let better = values.iter().filter(|m| **m > mean_score).count();
        Some(StudentStanding {
            student_id,
            mean_score: round2(mean_score),
            percentile: percentile(mean_score, &values),
            z_score: round2(z_score(mean_score, average(&values), std_dev(&values))),
            rank: better + 1,
            class_size: values.len(),
        })
    }
}

/// Newest vs oldest score: a swing over 10 points in either direction
fn score_trend(scores: &[f64]) -> TrendDirection {
    let (Some(oldest), Some(newest)) = (scores.first(), scores.last()) else {
        return TrendDirection::InsufficientData;
    };
    if scores.len() < 2 {
        TrendDirection::InsufficientData
    } else if *newest > oldest + SCORE_SWING {
        TrendDirection::Improving
    } else if *newest < oldest - SCORE_SWING {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Risk from a mean score (<30 critical, <40 high, <50 medium)
pub fn risk_level(mean_score: f64) -> GapSeverity {
    if mean_score < 30.0 {
        GapSeverity::Critical
    } else if mean_score < 40.0 {
        GapSeverity::High
    } else if mean_score < 50.0 {
        GapSeverity::Medium
    } else {
        GapSeverity::Low
    }
}

/// Alerts in a fixed order; `OnTrack` alone when nothing fires
pub fn class_alerts(
    statistics: &ClassStatistics,
    weak_areas: &[WeakArea],
    questions: &[QuestionEffectiveness],
    at_risk: &[AtRiskStudent],
) -> Vec<ClassAlert> {
    let mut alerts = Vec::new();

    // A scope nobody submitted to has no pass rate to report on
    if statistics.submitted_count > 0 && statistics.pass_rate < LOW_PASS_RATE {
        alerts.push(ClassAlert::LowPassRate {
            pass_rate: statistics.pass_rate,
        });
    }
    if statistics.std_dev > HIGH_STD_DEV {
        alerts.push(ClassAlert::HighVariance {
            std_dev: statistics.std_dev,
        });
    }
    if !weak_areas.is_empty() {
        alerts.push(ClassAlert::WeakAreas {
            chapters: weak_areas
                .iter()
                .take(ALERT_WEAK_AREA_NAMES)
                .map(|w| w.chapter_name.clone())
                .collect(),
        });
    }
    let flagged = questions
        .iter()
        .filter(|q| q.effectiveness.needs_revision())
        .count();
    if flagged > 0 {
        alerts.push(ClassAlert::QuestionsNeedRevision { count: flagged });
    }
    let critical = at_risk
        .iter()
        .filter(|s| s.risk_level == GapSeverity::Critical)
        .count();
    if critical > 0 {
        alerts.push(ClassAlert::CriticalRiskStudents { count: critical });
    }

    if alerts.is_empty() {
        alerts.push(ClassAlert::OnTrack);
    }
    alerts
}
