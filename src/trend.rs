//! Trend analysis
//!
//! Regression-based analysis of an ordered score series: direction, slope,
//! moving average and a next-value prediction with confidence. The same
//! algorithm is applied independently to every dimension (overall scores,
//! weekly chapter accuracy, weekly difficulty accuracy, per-attempt time
//! efficiency). Each call recomputes from scratch; there is no carried state.

use crate::aggregate::{by_chapter, by_difficulty, group_by, week_start, AggregateBucket};
use crate::config::DEFAULT_MOVING_AVERAGE_WINDOW;
use crate::stats::{
    average, consistency_score, moving_average, regression_slope, round2, round_to, std_dev,
};
use crate::types::{CourseSnapshot, DifficultyBreakdown};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Points needed before a next value is predicted
pub const PREDICTION_MIN_POINTS: usize = 3;

/// Points used for the recent slope behind the prediction confidence
const RECENT_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Result of analysing one ordered series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// Change per step (4dp)
    pub slope: f64,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// 0-100, higher = steadier
    pub consistency_score: f64,
    /// Sample standard deviation of the series
    pub volatility: f64,
    pub moving_average: Vec<f64>,
    pub predicted_next: Option<f64>,
    /// 0-100
    pub confidence_level: f64,
    pub data_points: usize,
}

/// Stateless trend analyser
#[derive(Debug, Clone, Copy)]
pub struct TrendEngine {
    window_size: usize,
}

impl Default for TrendEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MOVING_AVERAGE_WINDOW)
    }
}

impl TrendEngine {
    /// Create an engine with the given moving-average window
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    /// Analyse an ordered score series (oldest first).
    ///
    /// Fewer than two points report `InsufficientData` with zero slope and
    /// full consistency; an empty series never fails.
    pub fn analyze(&self, scores: &[f64]) -> TrendResult {
        if scores.len() < 2 {
            let only = scores.first().copied().unwrap_or(0.0);
            return TrendResult {
                direction: TrendDirection::InsufficientData,
                slope: 0.0,
                avg_score: round2(only),
                min_score: round2(only),
                max_score: round2(only),
                consistency_score: 100.0,
                volatility: 0.0,
                moving_average: Vec::new(),
                predicted_next: None,
                confidence_level: 0.0,
                data_points: scores.len(),
            };
        }

        let slope = regression_slope(scores);
        let volatility = std_dev(scores);
        let consistency = consistency_score(scores);
        let direction = direction_for(slope, volatility);
        let window = self.window_size.min(scores.len());
        let (predicted_next, confidence_level) = predict_next(scores, slope, consistency);

        TrendResult {
            direction,
            slope: round_to(slope, 4),
            avg_score: round2(average(scores)),
            min_score: round2(scores.iter().copied().fold(f64::INFINITY, f64::min)),
            max_score: round2(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            consistency_score: round2(consistency),
            volatility: round2(volatility),
            moving_average: moving_average(scores, window),
            predicted_next,
            confidence_level,
            data_points: scores.len(),
        }
    }
}

/// Classify a slope; noisier series need a steeper slope to leave `Stable`.
pub fn direction_for(slope: f64, volatility: f64) -> TrendDirection {
    let threshold = 0.5 + volatility / 100.0;
    if slope > threshold {
        TrendDirection::Improving
    } else if slope < -threshold {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Linear one-step prediction clamped to 0-100, with a confidence that drops
/// when the recent slope disagrees with the overall one.
fn predict_next(scores: &[f64], slope: f64, consistency: f64) -> (Option<f64>, f64) {
    if scores.len() < PREDICTION_MIN_POINTS {
        return (None, 0.0);
    }
    let last = scores[scores.len() - 1];
    let predicted = (last + slope).clamp(0.0, 100.0);

    let recent_slope = regression_slope(&scores[scores.len() - RECENT_WINDOW..]);
    let aligned = (slope > 0.0 && recent_slope > 0.0) || (slope < 0.0 && recent_slope < 0.0);
    let confidence = if aligned {
        consistency.min(90.0)
    } else {
        (consistency * 0.7).min(60.0)
    };

    (Some(round2(predicted)), round2(confidence))
}

/// Accuracy for one weekly period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub period_start: NaiveDate,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterTrend {
    pub chapter_id: u64,
    pub chapter_name: String,
    pub data_points: Vec<PeriodPoint>,
    pub trend: TrendResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTrend {
    pub data_points: Vec<PeriodPoint>,
    pub trend: TrendResult,
}

/// Accuracy per second of answering time for one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub submitted_at: DateTime<Utc>,
    pub avg_time: f64,
    pub accuracy: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEfficiencyTrend {
    pub data_points: Vec<EfficiencyPoint>,
    pub trend: TrendResult,
}

/// Trends across every dimension for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDimensionTrend {
    pub overall: TrendResult,
    pub by_chapter: Vec<ChapterTrend>,
    /// `None` for levels the student never answered
    pub by_difficulty: DifficultyBreakdown<Option<DimensionTrend>>,
    pub time_efficiency: TimeEfficiencyTrend,
}

impl TrendEngine {
    /// Attempt scores of one student, oldest first
    pub fn score_history(snapshot: &CourseSnapshot, student_id: u64) -> Vec<f64> {
        snapshot
            .student_attempts(student_id)
            .iter()
            .map(|a| a.percentage)
            .collect()
    }

    pub fn analyze_student(&self, snapshot: &CourseSnapshot, student_id: u64) -> TrendResult {
        self.analyze(&Self::score_history(snapshot, student_id))
    }

    /// Run the trend algorithm independently over every dimension
    pub fn multi_dimension(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
    ) -> MultiDimensionTrend {
        let overall = self.analyze_student(snapshot, student_id);
        let by_chapter = self.chapter_trends(snapshot, student_id);
        let by_difficulty = self.difficulty_trends(snapshot, student_id);
        let time_efficiency = self.time_efficiency_trend(snapshot, student_id);

        log::debug!(
            "student {}: overall {:?}, {} chapter trends",
            student_id,
            overall.direction,
            by_chapter.len()
        );

        MultiDimensionTrend {
            overall,
            by_chapter,
            by_difficulty,
            time_efficiency,
        }
    }

    fn chapter_trends(&self, snapshot: &CourseSnapshot, student_id: u64) -> Vec<ChapterTrend> {
        let names = snapshot.chapter_names();
        let weekly = group_by(snapshot.student_answers(student_id), |a| {
            (a.chapter_id, week_start(a.submitted_at))
        });

        let mut per_chapter: BTreeMap<u64, Vec<(NaiveDate, &AggregateBucket)>> = BTreeMap::new();
        for ((chapter_id, week), bucket) in &weekly {
            per_chapter.entry(*chapter_id).or_default().push((*week, bucket));
        }

        per_chapter
            .into_iter()
            .map(|(chapter_id, periods)| ChapterTrend {
                chapter_id,
                chapter_name: names.get(&chapter_id).unwrap_or(&"").to_string(),
                data_points: period_points(&periods),
                trend: self.analyze(&raw_accuracies(&periods)),
            })
            .collect()
    }

    fn difficulty_trends(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
    ) -> DifficultyBreakdown<Option<DimensionTrend>> {
        let weekly = group_by(snapshot.student_answers(student_id), |a| {
            (a.difficulty, week_start(a.submitted_at))
        });

        DifficultyBreakdown::from_fn(|level| {
            let periods: Vec<(NaiveDate, &AggregateBucket)> = weekly
                .iter()
                .filter(|((d, _), _)| *d == level)
                .map(|((_, week), bucket)| (*week, bucket))
                .collect();
            if periods.is_empty() {
                return None;
            }
            Some(DimensionTrend {
                data_points: period_points(&periods),
                trend: self.analyze(&raw_accuracies(&periods)),
            })
        })
    }

    fn time_efficiency_trend(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
    ) -> TimeEfficiencyTrend {
        let timed = snapshot
            .student_answers(student_id)
            .filter(|a| a.time_spent_seconds.is_some());
        let per_attempt = group_by(timed, |a| (a.submitted_at, a.attempt_id));

        let mut series = Vec::with_capacity(per_attempt.len());
        let data_points: Vec<EfficiencyPoint> = per_attempt
            .iter()
            .map(|((submitted_at, _), bucket)| {
                let avg_time = bucket.avg_time();
                let accuracy = bucket.raw_accuracy();
                let efficiency = if avg_time > 0.0 { accuracy / avg_time } else { 0.0 };
                series.push(efficiency);
                EfficiencyPoint {
                    submitted_at: *submitted_at,
                    avg_time: round2(avg_time),
                    accuracy: round2(accuracy),
                    efficiency: round_to(efficiency, 4),
                }
            })
            .collect();

        TimeEfficiencyTrend {
            trend: self.analyze(&series),
            data_points,
        }
    }

    /// Compare a student's trend with the class weekly-mean trend
    pub fn compare_with_class(
        &self,
        snapshot: &CourseSnapshot,
        student_id: u64,
    ) -> TrendComparison {
        let student = self.analyze_student(snapshot, student_id);

        let mut weekly: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for attempt in &snapshot.attempts {
            weekly
                .entry(week_start(attempt.submitted_at))
                .or_default()
                .push(attempt.percentage);
        }
        let class_series: Vec<f64> = weekly.values().map(|scores| average(scores)).collect();
        let class = self.analyze(&class_series);

        TrendComparison {
            relation: TrendRelation::between(student.direction, class.direction),
            score_difference: round2(student.avg_score - class.avg_score),
            slope_difference: round_to(student.slope - class.slope, 4),
            student,
            class,
        }
    }
}

fn period_points(periods: &[(NaiveDate, &AggregateBucket)]) -> Vec<PeriodPoint> {
    periods
        .iter()
        .map(|(week, bucket)| PeriodPoint {
            period_start: *week,
            accuracy: bucket.accuracy(),
        })
        .collect()
}

/// Full-precision series the trend algorithm runs on
fn raw_accuracies(periods: &[(NaiveDate, &AggregateBucket)]) -> Vec<f64> {
    periods.iter().map(|(_, bucket)| bucket.raw_accuracy()).collect()
}

/// How a student's direction relates to the class direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendRelation {
    ImprovingWithClass,
    OutpacingClass,
    DecliningWithClass,
    FallingBehindClass,
    StableWhileClassImproves,
    StableWhileClassDeclines,
    BothStable,
}

impl TrendRelation {
    pub fn between(student: TrendDirection, class: TrendDirection) -> Self {
        use TrendDirection::*;
        match (student, class) {
            (Improving, Improving) => TrendRelation::ImprovingWithClass,
            (Improving, _) => TrendRelation::OutpacingClass,
            (Declining, Declining) => TrendRelation::DecliningWithClass,
            (Declining, _) => TrendRelation::FallingBehindClass,
            (_, Improving) => TrendRelation::StableWhileClassImproves,
            (_, Declining) => TrendRelation::StableWhileClassDeclines,
            _ => TrendRelation::BothStable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendComparison {
    pub student: TrendResult,
    pub class: TrendResult,
    pub relation: TrendRelation,
    pub score_difference: f64,
    pub slope_difference: f64,
}

/// Overall accuracy per chapter for one student
pub fn chapter_accuracy(snapshot: &CourseSnapshot, student_id: u64) -> BTreeMap<u64, f64> {
    by_chapter(snapshot.student_answers(student_id))
        .into_iter()
        .map(|(id, bucket)| (id, bucket.accuracy()))
        .collect()
}

/// Overall accuracy per difficulty level for one student
pub fn difficulty_accuracy(
    snapshot: &CourseSnapshot,
    student_id: u64,
) -> DifficultyBreakdown<Option<f64>> {
    by_difficulty(snapshot.student_answers(student_id))
        .map(|_, bucket| (!bucket.is_empty()).then(|| bucket.accuracy()))
}
