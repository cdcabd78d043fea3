//! Classification rules
//!
//! Threshold tables that map a score onto an ordinal category. Each table is
//! evaluated top-down and the first lower bound the score reaches wins, so the
//! bands are exhaustive and never overlap.

use serde::{Deserialize, Serialize};

/// Ordinal mastery of a scope, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

const MASTERY_BANDS: [(f64, MasteryLevel); 4] = [
    (90.0, MasteryLevel::Expert),
    (75.0, MasteryLevel::Advanced),
    (60.0, MasteryLevel::Intermediate),
    (40.0, MasteryLevel::Beginner),
];

impl MasteryLevel {
    pub fn from_accuracy(accuracy: f64) -> Self {
        MASTERY_BANDS
            .iter()
            .find(|(bound, _)| accuracy >= *bound)
            .map(|(_, level)| *level)
            .unwrap_or(MasteryLevel::Novice)
    }

    /// Advanced or expert
    pub fn is_mastered(&self) -> bool {
        *self >= MasteryLevel::Advanced
    }

    /// Novice or beginner
    pub fn is_struggling(&self) -> bool {
        *self <= MasteryLevel::Beginner
    }
}

/// Standing relative to a benchmark accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTag {
    NeedsImprovement,
    BelowAverage,
    Average,
    AboveAverage,
    Excellent,
}

const PERFORMANCE_BANDS: [(f64, PerformanceTag); 4] = [
    (15.0, PerformanceTag::Excellent),
    (5.0, PerformanceTag::AboveAverage),
    (-5.0, PerformanceTag::Average),
    (-15.0, PerformanceTag::BelowAverage),
];

impl PerformanceTag {
    /// Classify `accuracy - benchmark`
    pub fn from_deviation(deviation: f64) -> Self {
        PERFORMANCE_BANDS
            .iter()
            .find(|(bound, _)| deviation >= *bound)
            .map(|(_, tag)| *tag)
            .unwrap_or(PerformanceTag::NeedsImprovement)
    }

    pub fn classify(accuracy: f64, benchmark: f64) -> Self {
        Self::from_deviation(accuracy - benchmark)
    }
}

/// Urgency of a learning gap or risk, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    Critical,
    High,
    Medium,
    Low,
}

const SEVERITY_BANDS: [(f64, GapSeverity); 3] = [
    (30.0, GapSeverity::Critical),
    (50.0, GapSeverity::High),
    (70.0, GapSeverity::Medium),
];

impl GapSeverity {
    /// Severity of a scope with the given accuracy (upper bounds, exclusive)
    pub fn from_accuracy(accuracy: f64) -> Self {
        SEVERITY_BANDS
            .iter()
            .find(|(bound, _)| accuracy < *bound)
            .map(|(_, severity)| *severity)
            .unwrap_or(GapSeverity::Low)
    }

    /// Sort rank, 0 = most urgent
    pub fn rank(&self) -> u8 {
        match self {
            GapSeverity::Critical => 0,
            GapSeverity::High => 1,
            GapSeverity::Medium => 2,
            GapSeverity::Low => 3,
        }
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

const GRADE_BANDS: [(f64, Grade); 11] = [
    (90.0, Grade::APlus),
    (85.0, Grade::A),
    (80.0, Grade::AMinus),
    (75.0, Grade::BPlus),
    (70.0, Grade::B),
    (65.0, Grade::BMinus),
    (60.0, Grade::CPlus),
    (55.0, Grade::C),
    (50.0, Grade::CMinus),
    (45.0, Grade::DPlus),
    (40.0, Grade::D),
];

impl Grade {
    /// Every grade, best first
    pub const ALL: [Grade; 12] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::F,
    ];

    pub fn from_percentage(percentage: f64) -> Self {
        GRADE_BANDS
            .iter()
            .find(|(bound, _)| percentage >= *bound)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Number of scores per grade, in [`Grade::ALL`] order
pub fn grade_counts(scores: &[f64]) -> Vec<(Grade, usize)> {
    let mut counts: Vec<(Grade, usize)> = Grade::ALL.iter().map(|g| (*g, 0)).collect();
    for score in scores {
        let grade = Grade::from_percentage(*score);
        if let Some(slot) = counts.iter_mut().find(|(g, _)| *g == grade) {
            slot.1 += 1;
        }
    }
    counts
}
