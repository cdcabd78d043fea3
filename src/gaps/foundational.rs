//! Weak prerequisites under a weak chapter

use super::{GapContext, GapDetector, GapType, LearningGap};
use crate::stats::round2;

/// Chapters below this accuracy have their prerequisites inspected
const WEAK_CHAPTER_ACCURACY: f64 = 60.0;

/// Prerequisites below this accuracy become gaps
const WEAK_PREREQUISITE_ACCURACY: f64 = 60.0;

/// A weak prerequisite also drags down every chapter built on it
const CASCADE_FACTOR: f64 = 1.3;

pub struct FoundationalGapDetector;

impl GapDetector for FoundationalGapDetector {
    fn gap_type(&self) -> GapType {
        GapType::Foundational
    }

    fn detect(&self, ctx: &GapContext<'_>) -> Vec<LearningGap> {
        let mut gaps = Vec::new();

        for chapter in ctx.snapshot.chapters_in_order() {
            if chapter.prerequisites.is_empty() {
                continue;
            }
            let Some(chapter_accuracy) = ctx.chapter_accuracy(chapter.id) else {
                continue;
            };
            if chapter_accuracy >= WEAK_CHAPTER_ACCURACY {
                continue;
            }

            for prereq_id in &chapter.prerequisites {
                // A prerequisite the student never answered carries no signal
                let Some(prereq_accuracy) = ctx.chapter_accuracy(*prereq_id) else {
                    continue;
                };
                if prereq_accuracy >= WEAK_PREREQUISITE_ACCURACY {
                    continue;
                }

                let prereq_name = ctx.chapter_name(*prereq_id);
                let subject = format!("{}:{}", chapter.id, prereq_id);
                let mut gap = LearningGap::new(
                    ctx,
                    GapType::Foundational,
                    &subject,
                    chapter.id,
                    prereq_accuracy,
                );
                gap.prerequisite_id = Some(*prereq_id);
                gap.prerequisite_name = Some(prereq_name.clone());
                gap.impact_score = foundational_impact(prereq_accuracy);
                gap.recommendation = recommendation(&prereq_name, &chapter.name, prereq_accuracy);
                gap.action_items = GapType::Foundational.action_items(&prereq_name);
                gaps.push(gap);
            }
        }

        gaps
    }
}

/// `(100 - accuracy) * 1.3`, capped at 100
pub fn foundational_impact(prereq_accuracy: f64) -> f64 {
    round2((100.0 - prereq_accuracy) * CASCADE_FACTOR).min(100.0)
}

fn recommendation(prereq: &str, chapter: &str, accuracy: f64) -> String {
    if accuracy < 30.0 {
        format!(
            "Review '{}' before continuing with '{}'; the prerequisite is very weak.",
            prereq, chapter
        )
    } else if accuracy < 50.0 {
        format!(
            "'{}' is a prerequisite for '{}' and needs attention.",
            prereq, chapter
        )
    } else {
        format!(
            "Review '{}' to strengthen the foundation for '{}'.",
            prereq, chapter
        )
    }
}
