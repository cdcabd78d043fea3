//! Item analysis
//!
//! Per-question psychometrics for one exam: difficulty index (share correct),
//! discrimination index (top vs bottom scorers) and an effectiveness label.

use crate::config::DEFAULT_DISCRIMINATION_FRACTION;
use crate::stats::round_to;
use crate::types::{AnswerRecord, AttemptSummary, CourseSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Most common wrong options reported per question
const WRONG_ANSWER_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffectiveness {
    /// Weaker students do better than stronger ones
    NeedsReview,
    TooEasy,
    TooHard,
    PoorDiscriminator,
    Effective,
    Acceptable,
}

impl ItemEffectiveness {
    /// Rules are checked in order; the first match wins.
    pub fn classify(difficulty_index: f64, discrimination_index: f64) -> Self {
        if discrimination_index < 0.0 {
            ItemEffectiveness::NeedsReview
        } else if difficulty_index > 0.9 {
            ItemEffectiveness::TooEasy
        } else if difficulty_index < 0.2 {
            ItemEffectiveness::TooHard
        } else if discrimination_index < 0.2 {
            ItemEffectiveness::PoorDiscriminator
        } else if (0.3..=0.7).contains(&difficulty_index) {
            ItemEffectiveness::Effective
        } else {
            ItemEffectiveness::Acceptable
        }
    }

    /// Labels an educator should act on
    pub fn needs_revision(&self) -> bool {
        matches!(
            self,
            ItemEffectiveness::NeedsReview
                | ItemEffectiveness::TooHard
                | ItemEffectiveness::PoorDiscriminator
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub option_id: u64,
    pub selection_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEffectiveness {
    pub question_id: u64,
    pub total_attempts: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Share answering correctly, 0-1 (higher = easier)
    pub difficulty_index: f64,
    /// -1 to 1
    pub discrimination_index: f64,
    pub effectiveness: ItemEffectiveness,
    pub common_wrong_answers: Vec<WrongAnswer>,
}

/// Attempts in the top and bottom score groups of an exam
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscriminationGroups {
    pub top: BTreeSet<u64>,
    pub bottom: BTreeSet<u64>,
    pub group_size: usize,
}

impl DiscriminationGroups {
    /// Rank attempts by score and slice `max(1, floor(n * fraction))` from
    /// each end. Equal scores keep input order; with very few attempts the
    /// groups may overlap.
    pub fn from_attempts(attempts: &[&AttemptSummary], fraction: f64) -> Self {
        if attempts.is_empty() {
            return Self::default();
        }
        let mut ranked: Vec<&AttemptSummary> = attempts.to_vec();
        ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        let n = ranked.len();
        let group_size = ((n as f64 * fraction).floor() as usize).clamp(1, n);
        Self {
            top: ranked[..group_size].iter().map(|a| a.attempt_id).collect(),
            bottom: ranked[n - group_size..].iter().map(|a| a.attempt_id).collect(),
            group_size,
        }
    }

    /// `(correct_top - correct_bottom) / group_size` over one question's
    /// answers; zero when there are no groups.
    pub fn discrimination_index(&self, answers: &[&AnswerRecord]) -> f64 {
        if self.group_size == 0 {
            return 0.0;
        }
        let correct_in = |group: &BTreeSet<u64>| {
            answers
                .iter()
                .filter(|a| a.is_correct && group.contains(&a.attempt_id))
                .count() as f64
        };
        let d = (correct_in(&self.top) - correct_in(&self.bottom)) / self.group_size as f64;
        d.clamp(-1.0, 1.0)
    }
}

/// Question quality analysis for a single exam
#[derive(Debug, Clone, Copy)]
pub struct ItemAnalysisEngine {
    group_fraction: f64,
}

impl Default for ItemAnalysisEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DISCRIMINATION_FRACTION)
    }
}

impl ItemAnalysisEngine {
    pub fn new(group_fraction: f64) -> Self {
        Self { group_fraction }
    }

    /// One entry per question with at least one answer, by question id
    pub fn analyze_exam(
        &self,
        snapshot: &CourseSnapshot,
        exam_id: u64,
    ) -> Vec<QuestionEffectiveness> {
        let attempts: Vec<&AttemptSummary> = snapshot.exam_attempts(exam_id).collect();
        let groups = DiscriminationGroups::from_attempts(&attempts, self.group_fraction);

        let mut by_question: BTreeMap<u64, Vec<&AnswerRecord>> = BTreeMap::new();
        for answer in snapshot.exam_answers(exam_id) {
            by_question.entry(answer.question_id).or_default().push(answer);
        }

        let items: Vec<QuestionEffectiveness> = by_question
            .into_iter()
            .filter(|(_, answers)| !answers.is_empty())
            .map(|(question_id, answers)| {
                let total = answers.len() as u32;
                let correct = answers.iter().filter(|a| a.is_correct).count() as u32;
                let difficulty_index = correct as f64 / total as f64;
                let discrimination_index = groups.discrimination_index(&answers);

                QuestionEffectiveness {
                    question_id,
                    total_attempts: total,
                    correct_count: correct,
                    incorrect_count: total - correct,
                    difficulty_index: round_to(difficulty_index, 3),
                    discrimination_index: round_to(discrimination_index, 3),
                    effectiveness: ItemEffectiveness::classify(
                        difficulty_index,
                        discrimination_index,
                    ),
                    common_wrong_answers: common_wrong_answers(&answers),
                }
            })
            .collect();

        log::debug!(
            "exam {}: {} questions over {} attempts (group size {})",
            exam_id,
            items.len(),
            attempts.len(),
            groups.group_size
        );
        items
    }
}

/// Most selected wrong options; ties go to the lower option id
fn common_wrong_answers(answers: &[&AnswerRecord]) -> Vec<WrongAnswer> {
    let mut counts: BTreeMap<u64, u32> = BTreeMap::new();
    for answer in answers.iter().filter(|a| !a.is_correct) {
        if let Some(option_id) = answer.selected_option_id {
            *counts.entry(option_id).or_default() += 1;
        }
    }
    let mut wrong: Vec<WrongAnswer> = counts
        .into_iter()
        .map(|(option_id, selection_count)| WrongAnswer {
            option_id,
            selection_count,
        })
        .collect();
    wrong.sort_by(|a, b| b.selection_count.cmp(&a.selection_count));
    wrong.truncate(WRONG_ANSWER_LIMIT);
    wrong
}
