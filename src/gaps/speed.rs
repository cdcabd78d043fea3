//! Accurate but much slower than the class

use super::{GapContext, GapDetector, GapType, LearningGap, RemediationTime};
use crate::aggregate::group_by;
use crate::classify::GapSeverity;
use crate::stats::round2;

const MIN_ACCURACY: f64 = 70.0;

/// Student mean time must exceed the class mean by this factor
const SLOW_RATIO: f64 = 1.5;

pub struct SpeedGapDetector;

impl GapDetector for SpeedGapDetector {
    fn gap_type(&self) -> GapType {
        GapType::Speed
    }

    fn detect(&self, ctx: &GapContext<'_>) -> Vec<LearningGap> {
        let student = group_by(
            ctx.answers.iter().copied().filter(|a| a.time_spent_seconds.is_some()),
            |a| a.chapter_id,
        );
        let class = group_by(
            ctx.snapshot
                .answers
                .iter()
                .filter(|a| a.time_spent_seconds.is_some()),
            |a| a.chapter_id,
        );

        let mut gaps = Vec::new();
        for chapter in ctx.snapshot.chapters_in_order() {
            let (Some(mine), Some(everyone)) = (student.get(&chapter.id), class.get(&chapter.id))
            else {
                continue;
            };
            let class_time = everyone.avg_time();
            if class_time <= 0.0 {
                continue;
            }
            let accuracy = mine.raw_accuracy();
            let student_time = mine.avg_time();
            if accuracy < MIN_ACCURACY || student_time <= class_time * SLOW_RATIO {
                continue;
            }

            let ratio = student_time / class_time;
            let mut gap = LearningGap::new(
                ctx,
                GapType::Speed,
                &chapter.id.to_string(),
                chapter.id,
                accuracy,
            );
            gap.severity = severity_for_ratio(ratio);
            gap.impact_score = round2((ratio - 1.0) * 50.0).min(100.0);
            gap.estimated_fix_time = RemediationTime::OneToTwoWeeks;
            gap.recommendation = format!(
                "'{}' is understood but takes {:.1}x longer than the class. \
                 Practice timed exercises.",
                chapter.name, ratio
            );
            gap.action_items = GapType::Speed.action_items(&chapter.name);
            gaps.push(gap);
        }
        gaps
    }
}

/// Speed gaps grade on how much slower the student is, never critical
pub fn severity_for_ratio(ratio: f64) -> GapSeverity {
    if ratio >= 2.5 {
        GapSeverity::High
    } else if ratio >= 2.0 {
        GapSeverity::Medium
    } else {
        GapSeverity::Low
    }
}
