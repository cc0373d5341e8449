//! The parsed quiz document.
//!
//! # Design
//! A `Quiz` can only be produced by the parser, so every value that reaches
//! the builder has already passed structural validation. `Question` and
//! `Answer` stay plain data with public fields; the choice letters from the
//! source text are not kept because the remote platform assigns its own.

use std::fmt;

use serde::Serialize;

/// Committed type of a question after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    MultipleAnswer,
    TrueFalse,
    ShortAnswer,
    Essay,
    FileUpload,
    Numeric,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::MultipleAnswer => "multiple_answer",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Essay => "essay",
            QuestionType::FileUpload => "file_upload",
            QuestionType::Numeric => "numeric",
        }
    }

    /// Whether the question carries a list of selectable choices.
    pub fn has_choices(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::MultipleAnswer | QuestionType::TrueFalse
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted response for a numeric question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericAnswer {
    Exact { value: f64 },
    Margin { value: f64, margin: f64 },
    Range { low: f64, high: f64 },
}

/// Optional feedback shown after answering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub general: Option<String>,
    pub correct: Option<String>,
    pub incorrect: Option<String>,
}

impl Feedback {
    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.correct.is_none() && self.incorrect.is_none()
    }
}

/// One selectable choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// One assessable item.
///
/// `answers` is only populated for choice types, `accepted` only for
/// `ShortAnswer` and `numeric` only for `Numeric`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    /// 1-based position in the document.
    pub ordinal: usize,
    /// Source line the question starts on.
    pub line: usize,
    pub kind: QuestionType,
    /// Prompt lines joined with `\n`; may contain inline markup.
    pub prompt: String,
    pub points: f64,
    pub answers: Vec<Answer>,
    pub accepted: Vec<String>,
    pub numeric: Option<NumericAnswer>,
    pub feedback: Feedback,
}

impl Question {
    pub fn correct_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|a| a.is_correct)
    }

    /// First `max_chars` characters of the prompt on a single line, for
    /// error messages and logs.
    pub fn prompt_prefix(&self, max_chars: usize) -> String {
        let flat = self.prompt.replace('\n', " ");
        if flat.chars().count() <= max_chars {
            return flat;
        }
        let mut prefix: String = flat.chars().take(max_chars).collect();
        prefix.push_str("...");
        prefix
    }
}

/// Root document: a title plus questions in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    title: String,
    description: String,
    questions: Vec<Question>,
}

impl Quiz {
    pub(crate) fn new(title: String, description: String, questions: Vec<Question>) -> Self {
        Self {
            title,
            description,
            questions,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }
}
