//! Core input types for the Exam Insight engine
//!
//! This module defines the typed records handed to the engine by the
//! persistence layer: answer records, attempt summaries, and the chapter /
//! concept / student metadata that scopes them. A [`CourseSnapshot`] bundles
//! them into the immutable per-request view every analysis reads from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Question difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// All levels, easiest first
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// Question format as authored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
    LongAnswer,
    Coding,
}

/// Cognitive category a question format exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    /// Selection formats: the answer is recognised, not produced
    Recall,
    /// Constructed-response formats
    Application,
}

impl QuestionType {
    pub fn category(&self) -> QuestionCategory {
        match self {
            QuestionType::Mcq | QuestionType::TrueFalse => QuestionCategory::Recall,
            QuestionType::ShortAnswer | QuestionType::LongAnswer | QuestionType::Coding => {
                QuestionCategory::Application
            }
        }
    }
}

fn default_question_type() -> QuestionType {
    QuestionType::Mcq
}

/// A single evaluated answer. Immutable once evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub attempt_id: u64,
    pub student_id: u64,
    pub exam_id: u64,
    pub question_id: u64,
    pub is_correct: bool,
    /// Question left unanswered
    #[serde(default)]
    pub is_skipped: bool,
    /// Time spent on the question (seconds), when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<f64>,
    pub chapter_id: u64,
    #[serde(default)]
    pub concept_ids: BTreeSet<u64>,
    pub difficulty: Difficulty,
    #[serde(default = "default_question_type")]
    pub question_type: QuestionType,
    /// Option picked for selection formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<u64>,
    pub submitted_at: DateTime<Utc>,
}

/// One evaluated exam attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempt_id: u64,
    pub student_id: u64,
    pub exam_id: u64,
    /// Attempt score (0-100)
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMeta {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub sequence_order: u32,
    /// Chapters that must be understood before this one
    #[serde(default)]
    pub prerequisites: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMeta {
    pub id: u64,
    pub name: String,
    pub chapter_id: u64,
    #[serde(default)]
    pub prerequisites: Vec<u64>,
}

/// Actively enrolled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMeta {
    pub id: u64,
    pub name: String,
}

/// Chapter accuracy from a previously persisted analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAccuracy {
    pub student_id: u64,
    pub chapter_id: u64,
    pub accuracy: f64,
}

/// Immutable per-request view of one course.
///
/// Every record is assumed to belong to an evaluated attempt of
/// `course_id`; the persistence layer applies that filter in its bulk fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSnapshot {
    pub course_id: u64,
    #[serde(default)]
    pub chapters: Vec<ChapterMeta>,
    #[serde(default)]
    pub concepts: Vec<ConceptMeta>,
    #[serde(default)]
    pub students: Vec<StudentMeta>,
    #[serde(default)]
    pub attempts: Vec<AttemptSummary>,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub prior_chapter_accuracy: Vec<PriorAccuracy>,
}

impl CourseSnapshot {
    pub fn new(course_id: u64) -> Self {
        Self {
            course_id,
            ..Default::default()
        }
    }

    /// Answers given by one student
    pub fn student_answers(&self, student_id: u64) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().filter(move |a| a.student_id == student_id)
    }

    /// Attempts by one student, oldest first
    pub fn student_attempts(&self, student_id: u64) -> Vec<&AttemptSummary> {
        let mut attempts: Vec<&AttemptSummary> = self
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .collect();
        attempts.sort_by_key(|a| a.submitted_at);
        attempts
    }

    pub fn exam_attempts(&self, exam_id: u64) -> impl Iterator<Item = &AttemptSummary> {
        self.attempts.iter().filter(move |a| a.exam_id == exam_id)
    }

    pub fn exam_answers(&self, exam_id: u64) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().filter(move |a| a.exam_id == exam_id)
    }

    pub fn chapter_names(&self) -> HashMap<u64, &str> {
        self.chapters
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect()
    }

    /// Chapters by `sequence_order`; equal orders keep input order
    pub fn chapters_in_order(&self) -> Vec<&ChapterMeta> {
        let mut chapters: Vec<&ChapterMeta> = self.chapters.iter().collect();
        chapters.sort_by_key(|c| c.sequence_order);
        chapters
    }

    pub fn chapter(&self, chapter_id: u64) -> Option<&ChapterMeta> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }

    pub fn concept(&self, concept_id: u64) -> Option<&ConceptMeta> {
        self.concepts.iter().find(|c| c.id == concept_id)
    }

    pub fn prior_accuracy(&self, student_id: u64, chapter_id: u64) -> Option<f64> {
        self.prior_chapter_accuracy
            .iter()
            .find(|p| p.student_id == student_id && p.chapter_id == chapter_id)
            .map(|p| p.accuracy)
    }

    /// Distinct students with at least one attempt, ascending
    pub fn attempting_students(&self) -> Vec<u64> {
        let ids: BTreeSet<u64> = self.attempts.iter().map(|a| a.student_id).collect();
        ids.into_iter().collect()
    }
}

/// One value per difficulty level.
///
/// Replaces an enum-keyed map: every level has a slot, so lookups are total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBreakdown<T> {
    pub easy: T,
    pub medium: T,
    pub hard: T,
    pub expert: T,
}

impl<T> DifficultyBreakdown<T> {
    pub fn from_fn(mut f: impl FnMut(Difficulty) -> T) -> Self {
        Self {
            easy: f(Difficulty::Easy),
            medium: f(Difficulty::Medium),
            hard: f(Difficulty::Hard),
            expert: f(Difficulty::Expert),
        }
    }

    pub fn get(&self, level: Difficulty) -> &T {
        match level {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
            Difficulty::Expert => &self.expert,
        }
    }

    pub fn get_mut(&mut self, level: Difficulty) -> &mut T {
        match level {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Expert => &mut self.expert,
        }
    }

    /// Levels paired with their values, easiest first
    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, &T)> {
        Difficulty::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Difficulty, &T) -> U) -> DifficultyBreakdown<U> {
        DifficultyBreakdown::from_fn(|d| f(d, self.get(d)))
    }
}
