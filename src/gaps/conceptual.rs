//! Concepts the student keeps getting wrong

use super::{GapContext, GapDetector, GapType, LearningGap};
use crate::aggregate::by_concept;
use crate::stats::round2;

/// Attempts needed before a concept can be judged
const MIN_ATTEMPTS: u32 = 3;

const WEAK_CONCEPT_ACCURACY: f64 = 50.0;

pub struct ConceptualGapDetector;

impl GapDetector for ConceptualGapDetector {
    fn gap_type(&self) -> GapType {
        GapType::Conceptual
    }

    fn detect(&self, ctx: &GapContext<'_>) -> Vec<LearningGap> {
        let buckets = by_concept(ctx.answers.iter().copied());

        ctx.snapshot
            .concepts
            .iter()
            .filter_map(|concept| {
                let bucket = buckets.get(&concept.id)?;
                let accuracy = bucket.raw_accuracy();
                if bucket.total < MIN_ATTEMPTS || accuracy >= WEAK_CONCEPT_ACCURACY {
                    return None;
                }

                let mut gap = LearningGap::new(
                    ctx,
                    GapType::Conceptual,
                    &concept.id.to_string(),
                    concept.chapter_id,
                    accuracy,
                );
                gap.concept_id = Some(concept.id);
                gap.concept_name = Some(concept.name.clone());
                gap.impact_score = round2(100.0 - accuracy).min(100.0);
                gap.recommendation = recommendation(&concept.name, accuracy);
                gap.action_items = GapType::Conceptual.action_items(&concept.name);
                Some(gap)
            })
            .collect()
    }
}

fn recommendation(concept: &str, accuracy: f64) -> String {
    if accuracy < 30.0 {
        format!(
            "Revisit the fundamentals of '{}' and work through basic examples.",
            concept
        )
    } else {
        format!(
            "Focus on the core principles of '{}' and practice with varied examples.",
            concept
        )
    }
}
