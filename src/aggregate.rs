//! Answer aggregation
//!
//! Groups answer records into transient buckets (per chapter, concept,
//! difficulty, week, ...) with the counts every engine derives its metrics
//! from. Buckets are built on demand and never persisted.

use crate::stats::percentage;
use crate::types::{AnswerRecord, DifficultyBreakdown};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Counts for one grouping of answers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBucket {
    pub total: u32,
    pub correct: u32,
    /// Answered but wrong
    pub incorrect: u32,
    pub skipped: u32,
    /// Sum of tracked time (seconds)
    pub total_time: f64,
    /// Answers with a tracked time
    pub timed: u32,
}

impl AggregateBucket {
    pub fn add(&mut self, answer: &AnswerRecord) {
        self.total += 1;
        if answer.is_correct {
            self.correct += 1;
        } else if answer.is_skipped {
            self.skipped += 1;
        } else {
            self.incorrect += 1;
        }
        if let Some(seconds) = answer.time_spent_seconds {
            self.total_time += seconds;
            self.timed += 1;
        }
    }

    pub fn from_answers<'a>(answers: impl IntoIterator<Item = &'a AnswerRecord>) -> Self {
        let mut bucket = Self::default();
        for answer in answers {
            bucket.add(answer);
        }
        bucket
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Correct share in percent (2dp) for output records; zero for an empty bucket
    pub fn accuracy(&self) -> f64 {
        percentage(self.correct as f64, self.total as f64)
    }

    /// Unrounded correct share in percent. Thresholds and classifications
    /// compare against this, never against [`accuracy`](Self::accuracy).
    pub fn raw_accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }

    /// Mean tracked time per answer; zero when nothing was timed
    pub fn avg_time(&self) -> f64 {
        if self.timed == 0 {
            return 0.0;
        }
        self.total_time / self.timed as f64
    }
}

/// Group answers by an arbitrary key. Keys are ordered for deterministic output.
pub fn group_by<'a, K, F>(
    answers: impl IntoIterator<Item = &'a AnswerRecord>,
    key: F,
) -> BTreeMap<K, AggregateBucket>
where
    K: Ord,
    F: Fn(&AnswerRecord) -> K,
{
    let mut buckets: BTreeMap<K, AggregateBucket> = BTreeMap::new();
    for answer in answers {
        buckets.entry(key(answer)).or_default().add(answer);
    }
    buckets
}

pub fn by_chapter<'a>(
    answers: impl IntoIterator<Item = &'a AnswerRecord>,
) -> BTreeMap<u64, AggregateBucket> {
    group_by(answers, |a| a.chapter_id)
}

/// Group by concept. An answer tagged with several concepts counts toward each.
pub fn by_concept<'a>(
    answers: impl IntoIterator<Item = &'a AnswerRecord>,
) -> BTreeMap<u64, AggregateBucket> {
    let mut buckets: BTreeMap<u64, AggregateBucket> = BTreeMap::new();
    for answer in answers {
        for concept_id in &answer.concept_ids {
            buckets.entry(*concept_id).or_default().add(answer);
        }
    }
    buckets
}

pub fn by_difficulty<'a>(
    answers: impl IntoIterator<Item = &'a AnswerRecord>,
) -> DifficultyBreakdown<AggregateBucket> {
    let mut breakdown: DifficultyBreakdown<AggregateBucket> = DifficultyBreakdown::default();
    for answer in answers {
        breakdown.get_mut(answer.difficulty).add(answer);
    }
    breakdown
}

/// Monday of the week containing `at` (UTC)
pub fn week_start(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, QuestionType};
    use std::collections::BTreeSet;

    fn answer(chapter_id: u64, correct: bool, time: Option<f64>) -> AnswerRecord {
        AnswerRecord {
            attempt_id: 1,
            student_id: 1,
            exam_id: 1,
            question_id: 1,
            is_correct: correct,
            is_skipped: false,
            time_spent_seconds: time,
            chapter_id,
            concept_ids: BTreeSet::new(),
            difficulty: Difficulty::Medium,
            question_type: QuestionType::Mcq,
            selected_option_id: None,
            submitted_at: "2024-03-06T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_bucket_counts() {
        let mut skipped = answer(1, false, None);
        skipped.is_skipped = true;
        let answers = vec![
            answer(1, true, Some(30.0)),
            answer(1, false, Some(50.0)),
            answer(1, true, None),
            skipped,
        ];
        let bucket = AggregateBucket::from_answers(&answers);

        assert_eq!(bucket.total, 4);
        assert_eq!(bucket.correct, 2);
        assert_eq!(bucket.incorrect, 1);
        assert_eq!(bucket.skipped, 1);
        assert_eq!(bucket.accuracy(), 50.0);
        assert!((bucket.avg_time() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_bucket_defaults() {
        let bucket = AggregateBucket::default();
        assert!(bucket.is_empty());
        assert_eq!(bucket.accuracy(), 0.0);
        assert_eq!(bucket.raw_accuracy(), 0.0);
        assert_eq!(bucket.avg_time(), 0.0);
    }

    #[test]
    fn test_raw_accuracy_keeps_precision() {
        let bucket = AggregateBucket {
            total: 25_000,
            correct: 14_999,
            incorrect: 10_001,
            ..Default::default()
        };
        assert_eq!(bucket.accuracy(), 60.0);
        assert!((bucket.raw_accuracy() - 59.996).abs() < 1e-9);
        assert!(bucket.raw_accuracy() < 60.0);
    }

    #[test]
    fn test_grouping() {
        let mut tagged = answer(2, true, None);
        tagged.concept_ids = [10, 11].into_iter().collect();
        tagged.difficulty = Difficulty::Hard;
        let answers = vec![answer(1, true, None), answer(1, false, None), tagged];

        let chapters = by_chapter(&answers);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[&1].total, 2);

        let concepts = by_concept(&answers);
        assert_eq!(concepts.keys().copied().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(concepts[&11].correct, 1);

        let levels = by_difficulty(&answers);
        assert_eq!(levels.medium.total, 2);
        assert_eq!(levels.hard.total, 1);
        assert!(levels.easy.is_empty());
    }

    #[test]
    fn test_week_start() {
        // Wednesday -> Monday of the same week
        let wed = "2024-03-06T23:59:00Z".parse().unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let monday = "2024-03-04T00:00:00Z".parse().unwrap();
        assert_eq!(week_start(monday), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }
}
