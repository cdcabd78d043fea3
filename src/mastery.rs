//! Mastery aggregation
//!
//! Turns per-scope answer buckets (chapter, concept, difficulty) into
//! classified performance records. Scopes without answers are omitted.

use crate::aggregate::{by_chapter, by_concept, by_difficulty, AggregateBucket};
use crate::classify::{MasteryLevel, PerformanceTag};
use crate::stats::{average, consistency_score, percentage, round2};
use crate::types::{AnswerRecord, CourseSnapshot, Difficulty, DifficultyBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Expected seconds per question when the class has no timings for a concept
const DEFAULT_EXPECTED_TIME: f64 = 60.0;

/// Time efficiency reported when the student has no timings
const UNTIMED_EFFICIENCY: f64 = 50.0;

/// Prerequisite concepts below this accuracy count as weak
const WEAK_PREREQUISITE_ACCURACY: f64 = 60.0;

/// Drop between consecutive difficulty levels that signals a transition issue
const TRANSITION_DROP: f64 = 30.0;

/// Deviation from the class beyond which a chapter is above/below average
const CLASS_DEVIATION_BAND: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterPerformance {
    pub chapter_id: u64,
    pub chapter_name: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub skipped_answers: u32,
    pub accuracy: f64,
    pub mastery_level: MasteryLevel,
    pub avg_time_per_question: f64,
    pub total_time_spent: f64,
    /// Accuracy change against the previously stored analysis
    pub improvement_from_last: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterAnalysis {
    pub exam_id: Option<u64>,
    pub chapters: Vec<ChapterPerformance>,
    pub overall_accuracy: f64,
    pub strongest_chapter: Option<ChapterPerformance>,
    pub weakest_chapter: Option<ChapterPerformance>,
}

impl ChapterAnalysis {
    /// Overall accuracy at full precision, for grading
    pub fn raw_overall_accuracy(&self) -> f64 {
        let bucket = AggregateBucket {
            total: self.chapters.iter().map(|c| c.total_questions).sum(),
            correct: self.chapters.iter().map(|c| c.correct_answers).sum(),
            ..Default::default()
        };
        bucket.raw_accuracy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStanding {
    AboveAverage,
    Average,
    BelowAverage,
}

impl ClassStanding {
    pub fn from_deviation(deviation: f64) -> Self {
        if deviation > CLASS_DEVIATION_BAND {
            ClassStanding::AboveAverage
        } else if deviation >= -CLASS_DEVIATION_BAND {
            ClassStanding::Average
        } else {
            ClassStanding::BelowAverage
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterComparison {
    pub chapter_id: u64,
    pub chapter_name: String,
    pub student_accuracy: f64,
    pub class_accuracy: f64,
    pub deviation: f64,
    pub standing: ClassStanding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterComparisonReport {
    pub comparisons: Vec<ChapterComparison>,
    pub chapters_above_average: usize,
    pub chapters_below_average: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptPerformance {
    pub concept_id: u64,
    pub concept_name: String,
    pub chapter_id: u64,
    pub chapter_name: String,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub accuracy: f64,
    /// Weighted blend of accuracy, time efficiency and consistency
    pub understanding_score: f64,
    pub time_efficiency: f64,
    pub consistency: f64,
    pub mastery_level: MasteryLevel,
    pub prerequisites: Vec<u64>,
    pub is_prerequisite_weak: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptAnalysis {
    pub chapter_id: Option<u64>,
    pub concepts: Vec<ConceptPerformance>,
    pub mastered_concepts: usize,
    pub struggling_concepts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPerformance {
    pub difficulty: Difficulty,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub avg_time: f64,
    pub benchmark: f64,
    pub performance_tag: PerformanceTag,
    pub deviation_from_benchmark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAnalysis {
    pub exam_id: Option<u64>,
    /// `None` for levels without answers
    pub breakdown: DifficultyBreakdown<Option<DifficultyPerformance>>,
    pub transition_issue: bool,
    pub recommended_difficulty: Difficulty,
}

/// Builds chapter, concept and difficulty performance records
pub struct MasteryAggregator;

impl MasteryAggregator {
    /// Per-chapter performance, optionally restricted to one exam
    pub fn chapters(
        snapshot: &CourseSnapshot,
        student_id: u64,
        exam_id: Option<u64>,
    ) -> ChapterAnalysis {
        let answers = scoped_answers(snapshot, student_id, exam_id);
        let buckets = by_chapter(answers.iter().copied());

        let chapters: Vec<ChapterPerformance> = snapshot
            .chapters_in_order()
            .into_iter()
            .filter_map(|chapter| {
                let bucket = buckets.get(&chapter.id).filter(|b| !b.is_empty())?;
                let accuracy = bucket.raw_accuracy();
                let improvement_from_last = snapshot
                    .prior_accuracy(student_id, chapter.id)
                    .map(|prior| round2(accuracy - prior));
                Some(ChapterPerformance {
                    chapter_id: chapter.id,
                    chapter_name: chapter.name.clone(),
                    total_questions: bucket.total,
                    correct_answers: bucket.correct,
                    incorrect_answers: bucket.incorrect,
                    skipped_answers: bucket.skipped,
                    accuracy: round2(accuracy),
                    mastery_level: MasteryLevel::from_accuracy(accuracy),
                    avg_time_per_question: round2(bucket.avg_time()),
                    total_time_spent: round2(bucket.total_time),
                    improvement_from_last,
                })
            })
            .collect();

        let total: u32 = chapters.iter().map(|c| c.total_questions).sum();
        let correct: u32 = chapters.iter().map(|c| c.correct_answers).sum();

        // Stable descending sort: ties keep chapter order
        let mut ranked: Vec<&ChapterPerformance> = chapters.iter().collect();
        ranked.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        let strongest_chapter = ranked.first().map(|c| (*c).clone());
        let weakest_chapter = ranked.last().map(|c| (*c).clone());

        log::debug!(
            "student {}: {} chapters analysed (exam {:?})",
            student_id,
            chapters.len(),
            exam_id
        );

        ChapterAnalysis {
            exam_id,
            overall_accuracy: percentage(correct as f64, total as f64),
            chapters,
            strongest_chapter,
            weakest_chapter,
        }
    }

    /// Student vs class accuracy for every chapter the student answered
    pub fn compare_chapters(snapshot: &CourseSnapshot, student_id: u64) -> ChapterComparisonReport {
        let student = by_chapter(snapshot.student_answers(student_id));
        let class = by_chapter(&snapshot.answers);

        let comparisons: Vec<ChapterComparison> = snapshot
            .chapters_in_order()
            .into_iter()
            .filter_map(|chapter| {
                let mine = student.get(&chapter.id).filter(|b| !b.is_empty())?;
                let student_accuracy = mine.raw_accuracy();
                let class_accuracy = class
                    .get(&chapter.id)
                    .map(AggregateBucket::raw_accuracy)
                    .unwrap_or(0.0);
                let deviation = student_accuracy - class_accuracy;
                Some(ChapterComparison {
                    chapter_id: chapter.id,
                    chapter_name: chapter.name.clone(),
                    student_accuracy: round2(student_accuracy),
                    class_accuracy: round2(class_accuracy),
                    deviation: round2(deviation),
                    standing: ClassStanding::from_deviation(deviation),
                })
            })
            .collect();

        let count = |standing: ClassStanding| {
            comparisons
                .iter()
                .filter(|c| c.standing == standing)
                .count()
        };
        ChapterComparisonReport {
            chapters_above_average: count(ClassStanding::AboveAverage),
            chapters_below_average: count(ClassStanding::BelowAverage),
            comparisons,
        }
    }

    /// Per-concept understanding, optionally restricted to one chapter
    pub fn concepts(
        snapshot: &CourseSnapshot,
        student_id: u64,
        chapter_id: Option<u64>,
    ) -> ConceptAnalysis {
        let chapter_order: HashMap<u64, u32> = snapshot
            .chapters
            .iter()
            .map(|c| (c.id, c.sequence_order))
            .collect();
        let names = snapshot.chapter_names();

        let mut concepts: Vec<_> = snapshot
            .concepts
            .iter()
            .filter(|c| chapter_id.map_or(true, |id| c.chapter_id == id))
            .collect();
        concepts.sort_by_key(|c| chapter_order.get(&c.chapter_id).copied().unwrap_or(u32::MAX));

        let mut history: Vec<&AnswerRecord> = snapshot.student_answers(student_id).collect();
        history.sort_by_key(|a| a.submitted_at);
        let student_buckets = by_concept(history.iter().copied());
        let class_times = class_concept_times(snapshot);

        let performances: Vec<ConceptPerformance> = concepts
            .into_iter()
            .filter_map(|concept| {
                let bucket = student_buckets.get(&concept.id).filter(|b| !b.is_empty())?;
                let answers: Vec<&AnswerRecord> = history
                    .iter()
                    .copied()
                    .filter(|a| a.concept_ids.contains(&concept.id))
                    .collect();

                let accuracy = bucket.raw_accuracy();
                let student_times: Vec<f64> = answers
                    .iter()
                    .filter_map(|a| a.time_spent_seconds)
                    .filter(|t| *t > 0.0)
                    .collect();
                let expected = class_times
                    .get(&concept.id)
                    .copied()
                    .unwrap_or(DEFAULT_EXPECTED_TIME);
                let time_efficiency = time_efficiency(&student_times, expected);
                let consistency = rolling_consistency(&answers);
                let understanding = accuracy * 0.6 + time_efficiency * 0.2 + consistency * 0.2;

                let is_prerequisite_weak = concept.prerequisites.iter().any(|prereq| {
                    student_buckets
                        .get(prereq)
                        .filter(|b| !b.is_empty())
                        .map_or(false, |b| b.raw_accuracy() < WEAK_PREREQUISITE_ACCURACY)
                });

                Some(ConceptPerformance {
                    concept_id: concept.id,
                    concept_name: concept.name.clone(),
                    chapter_id: concept.chapter_id,
                    chapter_name: names.get(&concept.chapter_id).unwrap_or(&"").to_string(),
                    total_attempts: bucket.total,
                    correct_attempts: bucket.correct,
                    accuracy: round2(accuracy),
                    understanding_score: round2(understanding),
                    time_efficiency: round2(time_efficiency),
                    consistency: round2(consistency),
                    mastery_level: MasteryLevel::from_accuracy(understanding),
                    prerequisites: concept.prerequisites.clone(),
                    is_prerequisite_weak,
                })
            })
            .collect();

        ConceptAnalysis {
            chapter_id,
            mastered_concepts: performances
                .iter()
                .filter(|c| c.mastery_level.is_mastered())
                .count(),
            struggling_concepts: performances
                .iter()
                .filter(|c| c.mastery_level.is_struggling())
                .count(),
            concepts: performances,
        }
    }

    /// Per-level accuracy against the configured benchmarks
    pub fn difficulty(
        snapshot: &CourseSnapshot,
        student_id: u64,
        exam_id: Option<u64>,
        benchmarks: &DifficultyBreakdown<f64>,
    ) -> DifficultyAnalysis {
        let answers = scoped_answers(snapshot, student_id, exam_id);
        let buckets = by_difficulty(answers.iter().copied());

        let breakdown = buckets.map(|level, bucket| {
            if bucket.is_empty() {
                return None;
            }
            let accuracy = bucket.raw_accuracy();
            let benchmark = *benchmarks.get(level);
            Some(DifficultyPerformance {
                difficulty: level,
                total_questions: bucket.total,
                correct_answers: bucket.correct,
                accuracy: round2(accuracy),
                avg_time: round2(bucket.avg_time()),
                benchmark,
                performance_tag: PerformanceTag::classify(accuracy, benchmark),
                deviation_from_benchmark: round2(accuracy - benchmark),
            })
        });

        DifficultyAnalysis {
            exam_id,
            transition_issue: has_transition_issue(&buckets, benchmarks),
            recommended_difficulty: recommend_difficulty(&buckets, benchmarks),
            breakdown,
        }
    }
}

fn scoped_answers(
    snapshot: &CourseSnapshot,
    student_id: u64,
    exam_id: Option<u64>,
) -> Vec<&AnswerRecord> {
    snapshot
        .student_answers(student_id)
        .filter(|a| exam_id.map_or(true, |id| a.exam_id == id))
        .collect()
}

/// Mean timed seconds per concept across the whole class
fn class_concept_times(snapshot: &CourseSnapshot) -> HashMap<u64, f64> {
    let mut times: HashMap<u64, Vec<f64>> = HashMap::new();
    for answer in &snapshot.answers {
        if let Some(seconds) = answer.time_spent_seconds {
            for concept_id in &answer.concept_ids {
                times.entry(*concept_id).or_default().push(seconds);
            }
        }
    }
    times
        .into_iter()
        .filter_map(|(id, values)| {
            let mean = average(&values);
            (mean > 0.0).then_some((id, mean))
        })
        .collect()
}

/// Piecewise 0-100 score of the student's mean time against the expected time.
/// Answering far faster than expected is capped, since it suggests rushing.
pub fn time_efficiency(student_times: &[f64], expected: f64) -> f64 {
    if student_times.is_empty() || expected <= 0.0 {
        return UNTIMED_EFFICIENCY;
    }
    let ratio = average(student_times) / expected;
    if ratio < 0.5 {
        70.0
    } else if ratio <= 1.0 {
        70.0 + (1.0 - ratio) * 30.0
    } else if ratio <= 1.5 {
        50.0 + (1.5 - ratio) * 40.0
    } else {
        (100.0 / ratio).max(20.0)
    }
}

/// Consistency of the trailing-3 rolling accuracy over chronological answers
fn rolling_consistency(answers: &[&AnswerRecord]) -> f64 {
    if answers.len() < 2 {
        return 100.0;
    }
    let hits: Vec<f64> = answers
        .iter()
        .map(|a| if a.is_correct { 1.0 } else { 0.0 })
        .collect();
    let rolling: Vec<f64> = (0..hits.len())
        .map(|i| {
            let window = &hits[i.saturating_sub(2)..=i];
            window.iter().sum::<f64>() / window.len() as f64 * 100.0
        })
        .collect();
    consistency_score(&rolling)
}

/// Unrounded accuracy and benchmark of every answered level, easy first
fn present_levels<'a>(
    buckets: &'a DifficultyBreakdown<AggregateBucket>,
    benchmarks: &'a DifficultyBreakdown<f64>,
) -> impl Iterator<Item = (Difficulty, f64, f64)> + 'a {
    buckets
        .iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(move |(level, bucket)| (level, bucket.raw_accuracy(), *benchmarks.get(level)))
}

fn has_transition_issue(
    buckets: &DifficultyBreakdown<AggregateBucket>,
    benchmarks: &DifficultyBreakdown<f64>,
) -> bool {
    let accuracies: Vec<f64> = present_levels(buckets, benchmarks)
        .map(|(_, accuracy, _)| accuracy)
        .collect();
    accuracies
        .windows(2)
        .any(|pair| pair[0] - pair[1] > TRANSITION_DROP)
}

/// Highest level met in sequence from easy; absent levels are skipped and the
/// first present level below its benchmark stops the climb.
fn recommend_difficulty(
    buckets: &DifficultyBreakdown<AggregateBucket>,
    benchmarks: &DifficultyBreakdown<f64>,
) -> Difficulty {
    let mut recommended = Difficulty::Easy;
    for (level, accuracy, benchmark) in present_levels(buckets, benchmarks) {
        if accuracy >= benchmark {
            recommended = level;
        } else {
            break;
        }
    }
    recommended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_benchmarks;
    use crate::types::{ChapterMeta, ConceptMeta, PriorAccuracy, QuestionType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn answer(
        student_id: u64,
        chapter_id: u64,
        concepts: &[u64],
        correct: bool,
        difficulty: Difficulty,
        time: Option<f64>,
        minute: u32,
    ) -> AnswerRecord {
        AnswerRecord {
            attempt_id: student_id,
            student_id,
            exam_id: 1,
            question_id: minute as u64,
            is_correct: correct,
            is_skipped: false,
            time_spent_seconds: time,
            chapter_id,
            concept_ids: concepts.iter().copied().collect::<BTreeSet<u64>>(),
            difficulty,
            question_type: QuestionType::Mcq,
            selected_option_id: None,
            submitted_at: format!("2024-03-04T10:{:02}:00Z", minute).parse().unwrap(),
        }
    }

    fn chapter(id: u64, name: &str, order: u32) -> ChapterMeta {
        ChapterMeta {
            id,
            name: name.to_string(),
            sequence_order: order,
            prerequisites: Vec::new(),
        }
    }

    fn snapshot() -> CourseSnapshot {
        let mut snapshot = CourseSnapshot::new(1);
        snapshot.chapters = vec![chapter(2, "Algebra", 2), chapter(1, "Numbers", 1)];
        snapshot.concepts = vec![
            ConceptMeta {
                id: 10,
                name: "Fractions".to_string(),
                chapter_id: 1,
                prerequisites: Vec::new(),
            },
            ConceptMeta {
                id: 20,
                name: "Equations".to_string(),
                chapter_id: 2,
                prerequisites: vec![10],
            },
        ];
        snapshot.answers = vec![
            answer(1, 1, &[10], true, Difficulty::Easy, Some(30.0), 1),
            answer(1, 1, &[10], false, Difficulty::Easy, Some(30.0), 2),
            answer(1, 1, &[10], false, Difficulty::Medium, None, 3),
            answer(1, 2, &[20], true, Difficulty::Medium, Some(90.0), 4),
            answer(1, 2, &[20], true, Difficulty::Hard, Some(90.0), 5),
            answer(2, 1, &[10], true, Difficulty::Easy, Some(60.0), 6),
            answer(2, 2, &[20], false, Difficulty::Hard, Some(60.0), 7),
        ];
        snapshot
    }

    #[test]
    fn test_chapter_analysis() {
        let mut snapshot = snapshot();
        snapshot.prior_chapter_accuracy = vec![PriorAccuracy {
            student_id: 1,
            chapter_id: 2,
            accuracy: 80.0,
        }];

        let analysis = MasteryAggregator::chapters(&snapshot, 1, None);

        // sequence order, not input order
        let ids: Vec<u64> = analysis.chapters.iter().map(|c| c.chapter_id).collect();
        assert_eq!(ids, vec![1, 2]);

        let numbers = &analysis.chapters[0];
        assert_eq!(numbers.total_questions, 3);
        assert_eq!(numbers.incorrect_answers, 2);
        assert_eq!(numbers.accuracy, 33.33);
        assert_eq!(numbers.mastery_level, MasteryLevel::Novice);
        assert_eq!(numbers.avg_time_per_question, 30.0);
        assert_eq!(numbers.improvement_from_last, None);

        let algebra = &analysis.chapters[1];
        assert_eq!(algebra.improvement_from_last, Some(20.0));

        assert_eq!(analysis.overall_accuracy, 60.0);
        assert!((analysis.raw_overall_accuracy() - 60.0).abs() < 1e-9);
        assert_eq!(analysis.strongest_chapter.unwrap().chapter_id, 2);
        assert_eq!(analysis.weakest_chapter.unwrap().chapter_id, 1);
    }

    #[test]
    fn test_chapter_analysis_empty_student() {
        let analysis = MasteryAggregator::chapters(&snapshot(), 42, None);
        assert!(analysis.chapters.is_empty());
        assert_eq!(analysis.overall_accuracy, 0.0);
        assert!(analysis.strongest_chapter.is_none());
    }

    #[test]
    fn test_chapter_comparison() {
        let report = MasteryAggregator::compare_chapters(&snapshot(), 1);

        // Numbers: student 33.33 vs class 50 -> below; Algebra: 100 vs 66.67 -> above
        assert_eq!(report.comparisons[0].standing, ClassStanding::BelowAverage);
        assert_eq!(report.comparisons[1].deviation, 33.33);
        assert_eq!(report.chapters_above_average, 1);
        assert_eq!(report.chapters_below_average, 1);

        assert_eq!(ClassStanding::from_deviation(0.0), ClassStanding::Average);
        assert_eq!(ClassStanding::from_deviation(-5.0), ClassStanding::Average);
    }

    #[test]
    fn test_time_efficiency_bands() {
        assert_eq!(time_efficiency(&[], 60.0), 50.0);
        assert_eq!(time_efficiency(&[20.0], 60.0), 70.0);
        assert!((time_efficiency(&[45.0], 60.0) - 77.5).abs() < 1e-9);
        assert!((time_efficiency(&[60.0], 60.0) - 70.0).abs() < 1e-9);
        assert!((time_efficiency(&[90.0], 60.0) - 50.0).abs() < 1e-9);
        assert!((time_efficiency(&[180.0], 60.0) - 33.333333333).abs() < 1e-6);
        assert_eq!(time_efficiency(&[600.0], 60.0), 20.0);
    }

    #[test]
    fn test_concept_analysis() {
        let analysis = MasteryAggregator::concepts(&snapshot(), 1, None);
        assert_eq!(analysis.concepts.len(), 2);

        let fractions = &analysis.concepts[0];
        assert_eq!(fractions.concept_id, 10);
        assert_eq!(fractions.chapter_name, "Numbers");
        assert_eq!(fractions.accuracy, 33.33);
        // class mean for concept 10 is 40s, student 30s -> ratio 0.75
        assert_eq!(fractions.time_efficiency, 77.5);
        assert!(!fractions.is_prerequisite_weak);

        let equations = &analysis.concepts[1];
        assert!(equations.is_prerequisite_weak);
        assert_eq!(equations.consistency, 100.0);

        let scoped = MasteryAggregator::concepts(&snapshot(), 1, Some(2));
        assert_eq!(scoped.concepts.len(), 1);
        assert_eq!(scoped.chapter_id, Some(2));
    }

    #[test]
    fn test_rolling_consistency() {
        let a = answer(1, 1, &[], true, Difficulty::Easy, None, 1);
        let b = answer(1, 1, &[], true, Difficulty::Easy, None, 2);
        assert_eq!(rolling_consistency(&[&a]), 100.0);
        assert_eq!(rolling_consistency(&[&a, &b]), 100.0);

        let c = answer(1, 1, &[], false, Difficulty::Easy, None, 3);
        // rolling: 100, 100, 66.67
        let expected = consistency_score(&[100.0, 100.0, 200.0 / 3.0]);
        assert!((rolling_consistency(&[&a, &b, &c]) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_analysis() {
        let analysis = MasteryAggregator::difficulty(&snapshot(), 1, None, &default_benchmarks());

        let easy = analysis.breakdown.easy.as_ref().unwrap();
        assert_eq!(easy.accuracy, 50.0);
        assert_eq!(easy.benchmark, 85.0);
        assert_eq!(easy.deviation_from_benchmark, -35.0);
        assert_eq!(easy.performance_tag, PerformanceTag::NeedsImprovement);
        assert!(analysis.breakdown.expert.is_none());

        // easy misses its benchmark, so the climb stops immediately
        assert_eq!(analysis.recommended_difficulty, Difficulty::Easy);
        assert!(!analysis.transition_issue);
    }

    #[test]
    fn test_transition_and_recommendation() {
        let mut snapshot = CourseSnapshot::new(1);
        snapshot.answers = vec![
            answer(1, 1, &[], true, Difficulty::Easy, None, 1),
            answer(1, 1, &[], true, Difficulty::Medium, None, 2),
            answer(1, 1, &[], false, Difficulty::Expert, None, 3),
        ];
        let analysis = MasteryAggregator::difficulty(&snapshot, 1, None, &default_benchmarks());

        // hard is absent and skipped; expert drops 100 points from medium
        assert!(analysis.transition_issue);
        assert_eq!(analysis.recommended_difficulty, Difficulty::Medium);
    }
}
