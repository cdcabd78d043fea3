//! Recall is solid but constructed answers fail

use super::{GapContext, GapDetector, GapType, LearningGap};
use crate::aggregate::{group_by, AggregateBucket};
use crate::stats::round2;
use crate::types::{QuestionCategory, QuestionType};
use std::collections::BTreeMap;

const STRONG_RECALL_ACCURACY: f64 = 70.0;
const WEAK_APPLICATION_ACCURACY: f64 = 50.0;

pub struct ApplicationGapDetector;

impl GapDetector for ApplicationGapDetector {
    fn gap_type(&self) -> GapType {
        GapType::Application
    }

    fn detect(&self, ctx: &GapContext<'_>) -> Vec<LearningGap> {
        let buckets = group_by(ctx.answers.iter().copied(), |a| {
            (a.chapter_id, a.question_type)
        });

        let mut gaps = Vec::new();
        for chapter in ctx.snapshot.chapters_in_order() {
            // both kinds of question must have been answered
            let (Some(recall_accuracy), Some(application_accuracy)) = (
                best_accuracy(&buckets, chapter.id, QuestionCategory::Recall),
                best_accuracy(&buckets, chapter.id, QuestionCategory::Application),
            ) else {
                continue;
            };
            if recall_accuracy <= STRONG_RECALL_ACCURACY
                || application_accuracy >= WEAK_APPLICATION_ACCURACY
            {
                continue;
            }

            let mut gap = LearningGap::new(
                ctx,
                GapType::Application,
                &chapter.id.to_string(),
                chapter.id,
                application_accuracy,
            );
            gap.impact_score = round2(recall_accuracy - application_accuracy).min(100.0);
            gap.recommendation = format!(
                "'{}' theory is understood ({:.0}% recall) but applying it lags ({:.0}%). \
                 Focus on practice problems.",
                chapter.name, recall_accuracy, application_accuracy
            );
            gap.action_items = GapType::Application.action_items(&chapter.name);
            gaps.push(gap);
        }
        gaps
    }
}

/// Highest per-question-type accuracy within one category of a chapter
fn best_accuracy(
    buckets: &BTreeMap<(u64, QuestionType), AggregateBucket>,
    chapter_id: u64,
    category: QuestionCategory,
) -> Option<f64> {
    buckets
        .iter()
        .filter(|((id, question_type), bucket)| {
            *id == chapter_id && question_type.category() == category && !bucket.is_empty()
        })
        .map(|(_, bucket)| bucket.raw_accuracy())
        .max_by(f64::total_cmp)
}
