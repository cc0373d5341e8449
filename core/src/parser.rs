//! Line-oriented quiz text parser.
//!
//! # Design
//! One forward pass drives a three-state machine (`ExpectQuestion`,
//! `InPrompt`, `InAnswers`). Every line is first classified into a `Line`
//! token without looking at the state; the state then decides what the token
//! means. A question is only committed to a type when its block closes, so
//! a second correctness marker can still promote it to multiple answer.
//!
//! The parser is pure: it never logs or touches I/O. Non-fatal findings are
//! returned as `ValidationWarning`s next to the `Quiz`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Answer, Feedback, NumericAnswer, Question, QuestionType, Quiz};

static TITLE: LazyLock<Regex> = LazyLock::new(|| header(r"quiz title"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| header(r"quiz description"));
static DEFAULT_POINTS: LazyLock<Regex> = LazyLock::new(|| header(r"default points"));
static POINTS: LazyLock<Regex> = LazyLock::new(|| header(r"points"));
static FEEDBACK: LazyLock<Regex> =
    LazyLock::new(|| header(r"(correct feedback|incorrect feedback|feedback)"));
static QUESTION: LazyLock<Regex> = LazyLock::new(|| regex(r"^(\d+)[.)](?:\s+(.*))?$"));
static CHOICE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)^(\*?)(\s*)([a-z])[.)]\s+(.+)$"));
static BRACKET: LazyLock<Regex> = LazyLock::new(|| regex(r"^\[(.?)\]\s+(.+)$"));
static TRUE_FALSE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)^(\*?)(true|false)$"));
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| regex(r"^=\s+(.+)$"));
static SHORT_ANSWER: LazyLock<Regex> = LazyLock::new(|| regex(r"^\*\s+(.+)$"));
static ESSAY: LazyLock<Regex> = LazyLock::new(|| regex(r"^_{3,}$"));
static UPLOAD: LazyLock<Regex> = LazyLock::new(|| regex(r"^\^{3,}$"));
static GENERAL_FEEDBACK: LazyLock<Regex> = LazyLock::new(|| regex(r"^\.\.\.\s+(.+)$"));
static CORRECT_FEEDBACK: LazyLock<Regex> = LazyLock::new(|| regex(r"^\+\s+(.+)$"));
static INCORRECT_FEEDBACK: LazyLock<Regex> = LazyLock::new(|| regex(r"^-\s+(.+)$"));

// Patterns are literals; a failure here is a programming error.
fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("grammar pattern must compile")
}

fn header(keyword: &str) -> Regex {
    regex(&format!(r"(?i)^{keyword}:\s*(.*)$"))
}

/// Tunables for `parse_with`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Points for questions without a `Points:` line when the document has
    /// no `Default points:` header.
    pub default_points: f64,
    /// Title used when the document has no `Quiz title:` line.
    pub fallback_title: String,
    /// Prompts shorter than this raise a `ShortPrompt` warning.
    pub min_prompt_chars: usize,
    /// Prompts longer than this raise a `LongPrompt` warning.
    pub max_prompt_chars: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_points: 1.0,
            fallback_title: "Quiz".to_string(),
            min_prompt_chars: 5,
            max_prompt_chars: 2000,
        }
    }
}

/// Fatal structural problem, reported against a 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Category of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingTitle,
    ShortPrompt,
    LongPrompt,
    DuplicateAnswer,
    SingleChoice,
    LabelOutOfSequence,
    NumberMismatch,
    StrayMarker,
    TextOutsideQuestion,
    UnusedPoints,
}

/// Document smell that a human should review but that does not block
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub line: usize,
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Successful parse result.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuiz {
    pub quiz: Quiz,
    pub warnings: Vec<ValidationWarning>,
}

/// Parse `text` with default options.
pub fn parse(text: &str) -> Result<ParsedQuiz, ParseError> {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, options: &ParseOptions) -> Result<ParsedQuiz, ParseError> {
    Parser::new(options).run(text)
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedbackSlot {
    General,
    Correct,
    Incorrect,
}

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Blank,
    Comment,
    Heading,
    Title(&'a str),
    Description(&'a str),
    DefaultPoints(&'a str),
    Points(&'a str),
    Feedback(FeedbackSlot, &'a str),
    /// `+ text` / `- text`; only feedback once answers have started.
    ShortFeedback(FeedbackSlot, &'a str),
    Question {
        number: &'a str,
        prompt: &'a str,
    },
    Choice {
        label: char,
        correct: bool,
        stray_star: bool,
        text: &'a str,
    },
    Bracket {
        correct: bool,
        text: &'a str,
    },
    TrueFalse {
        value: bool,
        correct: bool,
    },
    Numeric(&'a str),
    ShortAnswer(&'a str),
    Essay,
    Upload,
    Text,
}

fn capture<'a>(re: &Regex, line: &'a str, group: usize) -> Option<&'a str> {
    re.captures(line)
        .map(|c| c.get(group).map_or("", |m| m.as_str().trim()))
}

fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with('%') {
        return Line::Comment;
    }
    if line.starts_with('#') {
        return Line::Heading;
    }
    if let Some(value) = capture(&TITLE, line, 1) {
        return Line::Title(value);
    }
    if let Some(value) = capture(&DESCRIPTION, line, 1) {
        return Line::Description(value);
    }
    if let Some(value) = capture(&DEFAULT_POINTS, line, 1) {
        return Line::DefaultPoints(value);
    }
    if let Some(value) = capture(&POINTS, line, 1) {
        return Line::Points(value);
    }
    if let Some(caps) = FEEDBACK.captures(line) {
        let slot = match caps[1].to_ascii_lowercase().as_str() {
            "correct feedback" => FeedbackSlot::Correct,
            "incorrect feedback" => FeedbackSlot::Incorrect,
            _ => FeedbackSlot::General,
        };
        let text = caps.get(2).map_or("", |m| m.as_str().trim());
        return Line::Feedback(slot, text);
    }
    if let Some(caps) = QUESTION.captures(line) {
        return Line::Question {
            number: caps.get(1).map_or("", |m| m.as_str()),
            prompt: caps.get(2).map_or("", |m| m.as_str().trim()),
        };
    }
    if let Some(caps) = CHOICE.captures(line) {
        let star = !caps[1].is_empty();
        let gap = !caps[2].is_empty();
        return Line::Choice {
            label: caps[3].chars().next().unwrap_or('a').to_ascii_lowercase(),
            correct: star && !gap,
            stray_star: star && gap,
            text: caps.get(4).map_or("", |m| m.as_str().trim()),
        };
    }
    if let Some(caps) = BRACKET.captures(line) {
        return Line::Bracket {
            correct: &caps[1] == "*",
            text: caps.get(2).map_or("", |m| m.as_str().trim()),
        };
    }
    if let Some(caps) = TRUE_FALSE.captures(line) {
        return Line::TrueFalse {
            value: caps[2].eq_ignore_ascii_case("true"),
            correct: !caps[1].is_empty(),
        };
    }
    if let Some(value) = capture(&NUMERIC, line, 1) {
        return Line::Numeric(value);
    }
    if let Some(value) = capture(&SHORT_ANSWER, line, 1) {
        return Line::ShortAnswer(value);
    }
    if ESSAY.is_match(line) {
        return Line::Essay;
    }
    if UPLOAD.is_match(line) {
        return Line::Upload;
    }
    if let Some(text) = capture(&GENERAL_FEEDBACK, line, 1) {
        return Line::Feedback(FeedbackSlot::General, text);
    }
    if let Some(text) = capture(&CORRECT_FEEDBACK, line, 1) {
        return Line::ShortFeedback(FeedbackSlot::Correct, text);
    }
    if let Some(text) = capture(&INCORRECT_FEEDBACK, line, 1) {
        return Line::ShortFeedback(FeedbackSlot::Incorrect, text);
    }
    Line::Text
}

fn parse_points(line: usize, value: &str) -> Result<f64, ParseError> {
    match value.parse::<f64>() {
        Ok(points) if points.is_finite() && points >= 0.0 => Ok(points),
        _ => Err(ParseError::new(line, format!("invalid point value {value:?}"))),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_numeric(text: &str) -> Option<NumericAnswer> {
    if let Some(inner) = text.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let (low, high) = inner.split_once(',')?;
        let (low, high) = (parse_number(low)?, parse_number(high)?);
        return (low <= high).then_some(NumericAnswer::Range { low, high });
    }
    if let Some((value, margin)) = text.split_once("+-") {
        let (value, margin) = (parse_number(value)?, parse_number(margin)?);
        return (margin >= 0.0).then_some(NumericAnswer::Margin { value, margin });
    }
    parse_number(text).map(|value| NumericAnswer::Exact { value })
}

// ---------------------------------------------------------------------------
// Question drafts
// ---------------------------------------------------------------------------

/// Kind of response section a question block has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Choices,
    Numeric,
    ShortAnswer,
    Essay,
    Upload,
}

impl Response {
    fn describe(&self) -> &'static str {
        match self {
            Response::Choices => "answer choices",
            Response::Numeric => "a numeric answer",
            Response::ShortAnswer => "short answers",
            Response::Essay => "an essay marker",
            Response::Upload => "a file upload marker",
        }
    }
}

#[derive(Debug)]
struct DraftChoice {
    label: Option<char>,
    text: String,
    correct: bool,
    line: usize,
}

#[derive(Debug)]
struct Draft {
    ordinal: usize,
    line: usize,
    prompt: Vec<String>,
    points: Option<f64>,
    response: Option<Response>,
    choices: Vec<DraftChoice>,
    bracketed: bool,
    shorthand: bool,
    accepted: Vec<String>,
    numeric: Option<NumericAnswer>,
    feedback: Feedback,
}

impl Draft {
    fn new(ordinal: usize, line: usize, points: Option<f64>) -> Self {
        Self {
            ordinal,
            line,
            prompt: Vec::new(),
            points,
            response: None,
            choices: Vec::new(),
            bracketed: false,
            shorthand: false,
            accepted: Vec::new(),
            numeric: None,
            feedback: Feedback::default(),
        }
    }

    fn commit(&mut self, line: usize, response: Response) -> Result<(), ParseError> {
        match self.response {
            Some(existing) if existing != response => Err(ParseError::new(
                line,
                format!(
                    "question {}: cannot mix {} with {}",
                    self.ordinal,
                    existing.describe(),
                    response.describe()
                ),
            )),
            _ => {
                self.response = Some(response);
                Ok(())
            }
        }
    }

    fn add_choice(
        &mut self,
        line: usize,
        label: Option<char>,
        correct: bool,
        text: &str,
    ) -> Result<(), ParseError> {
        self.commit(line, Response::Choices)?;
        self.choices.push(DraftChoice {
            label,
            text: text.to_string(),
            correct,
            line,
        });
        Ok(())
    }

    fn set_feedback(&mut self, slot: FeedbackSlot, text: &str) {
        let target = match slot {
            FeedbackSlot::General => &mut self.feedback.general,
            FeedbackSlot::Correct => &mut self.feedback.correct,
            FeedbackSlot::Incorrect => &mut self.feedback.incorrect,
        };
        match target {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => *target = Some(text.to_string()),
        }
    }

    /// Free text inside a block continues the last choice once choices have
    /// started, otherwise the prompt.
    fn continue_text(&mut self, raw: &str) {
        match (self.response, self.choices.last_mut()) {
            (Some(Response::Choices), Some(choice)) => {
                choice.text.push('\n');
                choice.text.push_str(raw);
            }
            _ => self.prompt.push(raw.to_string()),
        }
    }
}

fn is_true_false(choices: &[DraftChoice]) -> bool {
    if choices.len() != 2 {
        return false;
    }
    let first = choices[0].text.to_ascii_lowercase();
    let second = choices[1].text.to_ascii_lowercase();
    (first == "true" && second == "false") || (first == "false" && second == "true")
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectQuestion,
    InPrompt,
    InAnswers,
}

struct Parser<'o> {
    options: &'o ParseOptions,
    state: State,
    title: Option<String>,
    description: String,
    default_points: f64,
    /// `Points:` seen outside a block, with its line, waiting for the next
    /// question.
    pending_points: Option<(usize, f64)>,
    draft: Option<Draft>,
    questions: Vec<Question>,
    warnings: Vec<ValidationWarning>,
}

impl<'o> Parser<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            state: State::ExpectQuestion,
            title: None,
            description: String::new(),
            default_points: options.default_points,
            pending_points: None,
            draft: None,
            questions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, line: usize, kind: WarningKind, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            line,
            kind,
            message: message.into(),
        });
    }

    fn run(mut self, text: &str) -> Result<ParsedQuiz, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut last_line = 0;
        for (idx, raw) in text.lines().enumerate() {
            last_line = idx + 1;
            let trimmed = raw.trim();
            let line = classify(trimmed);
            match self.draft.take() {
                Some(draft) => self.in_block(last_line, trimmed, line, draft)?,
                None => self.expect_question(last_line, trimmed, line)?,
            }
        }
        self.finish(last_line)
    }

    fn expect_question(&mut self, n: usize, raw: &str, line: Line<'_>) -> Result<(), ParseError> {
        match line {
            Line::Blank | Line::Comment | Line::Heading => {}
            Line::Title(value) => {
                if value.is_empty() {
                    return Err(ParseError::new(n, "quiz title is empty"));
                }
                if self.title.is_some() {
                    return Err(ParseError::new(n, "quiz title given more than once"));
                }
                self.title = Some(value.to_string());
            }
            Line::Description(value) => self.description = value.to_string(),
            Line::DefaultPoints(value) => self.default_points = parse_points(n, value)?,
            Line::Points(value) => self.pending_points = Some((n, parse_points(n, value)?)),
            Line::Question { number, prompt } => self.open(n, number, prompt),
            Line::Text | Line::ShortFeedback(..) => self.warn(
                n,
                WarningKind::TextOutsideQuestion,
                format!("ignored text outside a question: {raw:?}"),
            ),
            Line::Feedback(..) => {
                return Err(ParseError::new(n, "feedback line outside of a question"));
            }
            Line::Choice { .. }
            | Line::Bracket { .. }
            | Line::TrueFalse { .. }
            | Line::Numeric(_)
            | Line::ShortAnswer(_)
            | Line::Essay
            | Line::Upload => {
                return Err(ParseError::new(n, "answer line outside of a question"));
            }
        }
        Ok(())
    }

    fn open(&mut self, n: usize, number: &str, prompt: &str) {
        let ordinal = self.questions.len() + 1;
        if let Ok(literal) = number.parse::<usize>() {
            if literal != ordinal {
                self.warn(
                    n,
                    WarningKind::NumberMismatch,
                    format!("question {ordinal} is numbered {literal} in the source"),
                );
            }
        }
        let mut draft = Draft::new(ordinal, n, self.pending_points.take().map(|(_, points)| points));
        if !prompt.is_empty() {
            draft.prompt.push(prompt.to_string());
        }
        self.draft = Some(draft);
        self.state = State::InPrompt;
    }

    fn in_block(
        &mut self,
        n: usize,
        raw: &str,
        line: Line<'_>,
        mut draft: Draft,
    ) -> Result<(), ParseError> {
        match line {
            Line::Blank => return self.close(draft),
            Line::Question { number, prompt } => {
                self.close(draft)?;
                self.open(n, number, prompt);
                return Ok(());
            }
            Line::Comment => {}
            Line::Points(value) => draft.points = Some(parse_points(n, value)?),
            Line::Feedback(slot, text) => draft.set_feedback(slot, text),
            Line::ShortFeedback(slot, text) if self.state == State::InAnswers => {
                draft.set_feedback(slot, text)
            }
            Line::Choice {
                label,
                correct,
                stray_star,
                text,
            } => {
                if stray_star {
                    self.warn(
                        n,
                        WarningKind::StrayMarker,
                        format!(
                            "question {}: `*` is separated from label `{label})` and does not mark it correct",
                            draft.ordinal
                        ),
                    );
                }
                draft.add_choice(n, Some(label), correct, text)?;
                self.state = State::InAnswers;
            }
            Line::Bracket { correct, text } => {
                draft.bracketed = true;
                draft.add_choice(n, None, correct, text)?;
                self.state = State::InAnswers;
            }
            Line::TrueFalse { value, correct } => {
                draft.shorthand = true;
                draft.add_choice(n, None, correct, if value { "True" } else { "False" })?;
                self.state = State::InAnswers;
            }
            Line::Numeric(text) => {
                draft.commit(n, Response::Numeric)?;
                if draft.numeric.is_some() {
                    return Err(ParseError::new(
                        n,
                        format!("question {}: more than one numeric answer", draft.ordinal),
                    ));
                }
                let value = parse_numeric(text).ok_or_else(|| {
                    ParseError::new(
                        n,
                        format!("question {}: invalid numeric answer {text:?}", draft.ordinal),
                    )
                })?;
                draft.numeric = Some(value);
                self.state = State::InAnswers;
            }
            Line::ShortAnswer(text) => {
                draft.commit(n, Response::ShortAnswer)?;
                draft.accepted.push(text.to_string());
                self.state = State::InAnswers;
            }
            Line::Essay => {
                draft.commit(n, Response::Essay)?;
                self.state = State::InAnswers;
            }
            Line::Upload => {
                draft.commit(n, Response::Upload)?;
                self.state = State::InAnswers;
            }
            Line::Heading
            | Line::Title(_)
            | Line::Description(_)
            | Line::DefaultPoints(_)
            | Line::ShortFeedback(..)
            | Line::Text => draft.continue_text(raw),
        }
        self.draft = Some(draft);
        Ok(())
    }

    fn close(&mut self, draft: Draft) -> Result<(), ParseError> {
        let question = self.commit_question(draft)?;
        self.questions.push(question);
        self.state = State::ExpectQuestion;
        Ok(())
    }

    fn commit_question(&mut self, draft: Draft) -> Result<Question, ParseError> {
        let prompt = draft.prompt.join("\n");
        if prompt.trim().is_empty() {
            return Err(ParseError::new(
                draft.line,
                format!("question {}: empty prompt", draft.ordinal),
            ));
        }
        let length = prompt.chars().count();
        if length < self.options.min_prompt_chars {
            self.warn(
                draft.line,
                WarningKind::ShortPrompt,
                format!("question {}: prompt is only {length} characters", draft.ordinal),
            );
        } else if length > self.options.max_prompt_chars {
            self.warn(
                draft.line,
                WarningKind::LongPrompt,
                format!("question {}: prompt is {length} characters long", draft.ordinal),
            );
        }

        let kind = match draft.response {
            None | Some(Response::Essay) => QuestionType::Essay,
            Some(Response::Upload) => QuestionType::FileUpload,
            Some(Response::Numeric) => QuestionType::Numeric,
            Some(Response::ShortAnswer) => QuestionType::ShortAnswer,
            Some(Response::Choices) => self.classify_choices(&draft)?,
        };

        let answers = draft
            .choices
            .into_iter()
            .map(|choice| {
                let text = if kind == QuestionType::TrueFalse {
                    if choice.text.eq_ignore_ascii_case("true") {
                        "True".to_string()
                    } else {
                        "False".to_string()
                    }
                } else {
                    choice.text
                };
                Answer::new(text, choice.correct)
            })
            .collect();

        Ok(Question {
            ordinal: draft.ordinal,
            line: draft.line,
            kind,
            prompt,
            points: draft.points.unwrap_or(self.default_points),
            answers,
            accepted: draft.accepted,
            numeric: draft.numeric,
            feedback: draft.feedback,
        })
    }

    fn classify_choices(&mut self, draft: &Draft) -> Result<QuestionType, ParseError> {
        let ordinal = draft.ordinal;
        let choices = &draft.choices;

        for (i, first) in choices.iter().enumerate() {
            for second in &choices[i + 1..] {
                if first.text.to_lowercase() != second.text.to_lowercase() {
                    continue;
                }
                if first.correct != second.correct {
                    return Err(ParseError::new(
                        second.line,
                        format!(
                            "question {ordinal}: answer {:?} appears twice with different correctness",
                            second.text
                        ),
                    ));
                }
                self.warn(
                    second.line,
                    WarningKind::DuplicateAnswer,
                    format!("question {ordinal}: duplicate answer {:?}", second.text),
                );
            }
        }

        let correct = choices.iter().filter(|c| c.correct).count();
        if correct == 0 {
            return Err(ParseError::new(
                draft.line,
                format!("question {ordinal}: no answer marked correct"),
            ));
        }

        let out_of_sequence = choices.iter().enumerate().find(|(idx, c)| {
            let expected = (b'a' + (*idx % 26) as u8) as char;
            c.label.is_some_and(|label| label != expected)
        });
        if let Some((_, choice)) = out_of_sequence {
            self.warn(
                choice.line,
                WarningKind::LabelOutOfSequence,
                format!("question {ordinal}: answer labels are not in a, b, c order"),
            );
        }
        if choices.len() == 1 {
            self.warn(
                draft.line,
                WarningKind::SingleChoice,
                format!("question {ordinal}: only one answer choice"),
            );
        }

        if correct >= 2 || draft.bracketed {
            Ok(QuestionType::MultipleAnswer)
        } else if is_true_false(choices) {
            Ok(QuestionType::TrueFalse)
        } else if draft.shorthand {
            Err(ParseError::new(
                draft.line,
                format!(
                    "question {ordinal}: true/false questions need exactly one True and one False answer"
                ),
            ))
        } else {
            Ok(QuestionType::MultipleChoice)
        }
    }

    fn finish(mut self, last_line: usize) -> Result<ParsedQuiz, ParseError> {
        if let Some(draft) = self.draft.take() {
            if self.state == State::InPrompt {
                return Err(ParseError::new(
                    draft.line,
                    format!(
                        "question {}: input ends before any answers or a closing blank line",
                        draft.ordinal
                    ),
                ));
            }
            self.close(draft)?;
        }
        if let Some((line, points)) = self.pending_points.take() {
            self.warn(
                line,
                WarningKind::UnusedPoints,
                format!("`Points: {points}` is not followed by a question and was ignored"),
            );
        }
        if self.questions.is_empty() {
            return Err(ParseError::new(last_line.max(1), "document contains no questions"));
        }
        let title = match self.title.take() {
            Some(title) => title,
            None if !self.options.fallback_title.trim().is_empty() => {
                let fallback = self.options.fallback_title.clone();
                self.warn(
                    1,
                    WarningKind::MissingTitle,
                    format!("no `Quiz title:` line; using {fallback:?}"),
                );
                fallback
            }
            None => return Err(ParseError::new(1, "quiz has no title")),
        };
        Ok(ParsedQuiz {
            quiz: Quiz::new(title, self.description, self.questions),
            warnings: self.warnings,
        })
    }
}
