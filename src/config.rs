//! Engine configuration
//!
//! Tunable thresholds for the analyses. Every field has a default, so a
//! partial JSON document only overrides what it names.

use crate::error::AnalyticsError;
use crate::types::DifficultyBreakdown;
use serde::{Deserialize, Serialize};

/// Default moving-average window (number of exams)
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;

/// Share of attempts in each of the top and bottom discrimination groups
pub const DEFAULT_DISCRIMINATION_FRACTION: f64 = 0.27;

/// Expected accuracy per difficulty level
pub fn default_benchmarks() -> DifficultyBreakdown<f64> {
    DifficultyBreakdown {
        easy: 85.0,
        medium: 70.0,
        hard: 55.0,
        expert: 40.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Window for the overall score moving average
    pub moving_average_window: usize,
    pub difficulty_benchmarks: DifficultyBreakdown<f64>,
    /// Minimum attempt score counted as a pass
    pub pass_threshold: f64,
    /// Average score under which a student is flagged at risk
    pub at_risk_threshold: f64,
    /// Class accuracy under which a chapter/concept is a weak area
    pub weak_area_threshold: f64,
    pub weak_area_limit: usize,
    pub discrimination_group_fraction: f64,
    pub outlier_iqr_multiplier: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            difficulty_benchmarks: default_benchmarks(),
            pass_threshold: 40.0,
            at_risk_threshold: 50.0,
            weak_area_threshold: 60.0,
            weak_area_limit: 10,
            discrimination_group_fraction: DEFAULT_DISCRIMINATION_FRACTION,
            outlier_iqr_multiplier: 1.5,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.moving_average_window == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "moving_average_window must be at least 1".to_string(),
            ));
        }
        if !(self.discrimination_group_fraction > 0.0 && self.discrimination_group_fraction <= 0.5)
        {
            return Err(AnalyticsError::InvalidConfig(format!(
                "discrimination_group_fraction must be in (0, 0.5], got {}",
                self.discrimination_group_fraction
            )));
        }
        if !(self.outlier_iqr_multiplier > 0.0) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "outlier_iqr_multiplier must be positive, got {}",
                self.outlier_iqr_multiplier
            )));
        }
        for (level, benchmark) in self.difficulty_benchmarks.iter() {
            if !(0.0..=100.0).contains(benchmark) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "benchmark for {} must be within 0-100, got {}",
                    level.as_str(),
                    benchmark
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
