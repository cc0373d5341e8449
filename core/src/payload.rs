//! JSON bodies sent to the remote quiz API.
//!
//! # Design
//! Quiz and item envelopes are typed structs; the per-interaction parts of
//! an item (`interaction_data`, `properties`, `scoring_data`) differ in shape
//! for every question type, so they are built as `serde_json::Value`s.
//! Choice ids come from an injectable generator so payloads are
//! reproducible in tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::types::{Answer, NumericAnswer, Question, QuestionType, Quiz};

/// Quiz-level settings sent on creation. Publishing is never requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub shuffle_answers: bool,
    pub shuffle_questions: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuizPayload {
    pub quiz: QuizBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuizBody {
    pub title: String,
    pub instructions: String,
    pub grading_type: String,
    pub points_possible: f64,
    pub published: bool,
    pub quiz_settings: QuizSettingsBody,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuizSettingsBody {
    pub shuffle_answers: bool,
    pub shuffle_questions: bool,
}

impl QuizPayload {
    pub fn new(quiz: &Quiz, settings: &QuizSettings) -> Self {
        Self {
            quiz: QuizBody {
                title: quiz.title().to_string(),
                instructions: quiz.description().to_string(),
                grading_type: "points".to_string(),
                points_possible: quiz.total_points(),
                published: false,
                quiz_settings: QuizSettingsBody {
                    shuffle_answers: settings.shuffle_answers,
                    shuffle_questions: settings.shuffle_questions,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemPayload {
    pub item: ItemBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemBody {
    /// 1-based position in the quiz; omitted when appending so the remote
    /// side places the item last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub points_possible: f64,
    pub entry_type: String,
    pub entry: Entry,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry {
    pub title: String,
    pub item_body: String,
    pub calculator_type: String,
    pub interaction_type_slug: String,
    pub interaction_data: Value,
    pub properties: Value,
    pub scoring_data: Value,
    pub scoring_algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<EntryFeedback>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neutral: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect: Option<String>,
}

/// Wrap each line of `text` in a paragraph.
fn paragraphs(text: &str) -> String {
    text.lines().map(|line| format!("<p>{line}</p>")).collect()
}

/// Single paragraph with line breaks, used for choice bodies.
fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", text.replace('\n', "<br>"))
}

fn number(value: f64) -> String {
    value.to_string()
}

struct Interaction {
    slug: &'static str,
    data: Value,
    properties: Value,
    scoring: Value,
    algorithm: &'static str,
    body_suffix: String,
}

impl ItemPayload {
    /// Map a question with random choice ids.
    pub fn from_question(question: &Question, shuffle_choices: bool) -> Self {
        Self::with_ids(question, shuffle_choices, || Uuid::new_v4().to_string())
    }

    pub fn with_ids(
        question: &Question,
        shuffle_choices: bool,
        mut next_id: impl FnMut() -> String,
    ) -> Self {
        let interaction = match question.kind {
            QuestionType::MultipleChoice => {
                choice_interaction(&question.answers, shuffle_choices, false, &mut next_id)
            }
            QuestionType::MultipleAnswer => {
                choice_interaction(&question.answers, shuffle_choices, true, &mut next_id)
            }
            QuestionType::TrueFalse => Interaction {
                slug: "true-false",
                data: json!({ "true_choice": "True", "false_choice": "False" }),
                properties: json!({}),
                scoring: json!({
                    "value": question.correct_answers().any(|a| a.text == "True")
                }),
                algorithm: "Equivalence",
                body_suffix: String::new(),
            },
            QuestionType::Essay => Interaction {
                slug: "essay",
                data: json!({
                    "rce": true,
                    "essay": null,
                    "word_count": true,
                    "file_upload": false,
                    "spell_check": true,
                    "word_limit_enabled": false
                }),
                properties: json!({}),
                scoring: json!({ "value": "" }),
                algorithm: "None",
                body_suffix: String::new(),
            },
            QuestionType::FileUpload => Interaction {
                slug: "file-upload",
                data: json!({ "files_count": "1", "restrict_count": true }),
                properties: json!({ "allowed_types": "", "restrict_types": false }),
                scoring: json!({ "value": "" }),
                algorithm: "None",
                body_suffix: String::new(),
            },
            QuestionType::Numeric => numeric_interaction(question.numeric, &mut next_id),
            QuestionType::ShortAnswer => blank_interaction(&question.prompt, &question.accepted, &mut next_id),
        };

        let feedback = (!question.feedback.is_empty()).then(|| EntryFeedback {
            neutral: question.feedback.general.clone(),
            correct: question.feedback.correct.clone(),
            incorrect: question.feedback.incorrect.clone(),
        });

        Self {
            item: ItemBody {
                position: Some(question.ordinal),
                points_possible: question.points,
                entry_type: "Item".to_string(),
                entry: Entry {
                    title: format!("Question {}", question.ordinal),
                    item_body: paragraphs(&question.prompt) + &interaction.body_suffix,
                    calculator_type: "none".to_string(),
                    interaction_type_slug: interaction.slug.to_string(),
                    interaction_data: interaction.data,
                    properties: interaction.properties,
                    scoring_data: interaction.scoring,
                    scoring_algorithm: interaction.algorithm.to_string(),
                    feedback,
                },
            },
        }
    }
}

fn choice_interaction(
    answers: &[Answer],
    shuffled: bool,
    multiple: bool,
    next_id: &mut impl FnMut() -> String,
) -> Interaction {
    let mut choices = Vec::with_capacity(answers.len());
    let mut correct = Vec::new();
    for (idx, answer) in answers.iter().enumerate() {
        let id = next_id();
        if answer.is_correct {
            correct.push(id.clone());
        }
        choices.push(json!({
            "id": id,
            "position": idx + 1,
            "itemBody": paragraph(&answer.text)
        }));
    }
    let shuffle_rules = json!({ "choices": { "toLock": [], "shuffled": shuffled } });

    if multiple {
        Interaction {
            slug: "multi-answer",
            data: json!({ "choices": choices }),
            properties: json!({ "shuffleRules": shuffle_rules }),
            scoring: json!({ "value": correct }),
            algorithm: "AllOrNothing",
            body_suffix: String::new(),
        }
    } else {
        Interaction {
            slug: "choice",
            data: json!({ "choices": choices }),
            properties: json!({ "shuffleRules": shuffle_rules, "varyPointsByAnswer": false }),
            scoring: json!({ "value": correct.into_iter().next() }),
            algorithm: "Equivalence",
            body_suffix: String::new(),
        }
    }
}

fn numeric_interaction(
    answer: Option<NumericAnswer>,
    next_id: &mut impl FnMut() -> String,
) -> Interaction {
    let id = next_id();
    let value = match answer {
        Some(NumericAnswer::Exact { value }) => json!({
            "id": id,
            "type": "exactResponse",
            "value": number(value)
        }),
        Some(NumericAnswer::Margin { value, margin }) => json!({
            "id": id,
            "type": "marginOfError",
            "value": number(value),
            "margin": number(margin),
            "margin_type": "absolute"
        }),
        Some(NumericAnswer::Range { low, high }) => json!({
            "id": id,
            "type": "withinARange",
            "start": number(low),
            "end": number(high)
        }),
        None => Value::Null,
    };
    let values: Vec<Value> = if value.is_null() { Vec::new() } else { vec![value] };
    Interaction {
        slug: "numeric",
        data: json!({}),
        properties: json!({}),
        scoring: json!({ "value": values }),
        algorithm: "Numeric",
        body_suffix: String::new(),
    }
}

fn blank_interaction(
    prompt: &str,
    accepted: &[String],
    next_id: &mut impl FnMut() -> String,
) -> Interaction {
    let id = next_id();
    let blank_text = accepted.first().cloned().unwrap_or_default();
    Interaction {
        slug: "rich-fill-blank",
        data: json!({
            "blanks": [{ "id": id, "answer_type": "openEntry" }],
            "reuse_word_bank_choices": false,
            "word_bank_choices": []
        }),
        properties: json!({ "shuffleRules": { "blanks": { "children": { "0": { "children": null } } } } }),
        scoring: json!({
            "value": [{
                "id": id,
                "scoring_algorithm": "TextInChoices",
                "scoring_data": { "value": accepted, "blank_text": blank_text }
            }],
            "working_item_body": format!("{}<p>`{blank_text}`</p>", paragraphs(prompt))
        }),
        algorithm: "MultipleMethods",
        body_suffix: format!("<p><span id=\"blank_{id}\"></span></p>"),
    }
}
