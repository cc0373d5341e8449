//! Error types for parsing responses, talking to the remote API and
//! building quizzes.
//!
//! # Design
//! `ApiError` describes what went wrong on the wire. `RemoteError` is the
//! two-way taxonomy the builder acts on: transient failures are retried,
//! rejections are not. `BuildError` is what the caller sees and always
//! carries the remote quiz id (when one exists) and the failing question so
//! a human can clean up.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by `CanvasClient` parse methods and transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404; usually a wrong course or quiz id.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    /// No response was received (connect failure, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Timeouts, rate limiting and server-side failures may succeed on a
    /// later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::HttpError { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            ApiError::Transport(_) => true,
            _ => false,
        }
    }
}

/// Failure reported by a `RemoteAssessmentClient`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Retryable: network failure, timeout, rate limit.
    #[error("transient failure: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Deterministic rejection (validation, auth) that retrying cannot fix.
    #[error("rejected: {message}")]
    Rejected { message: String },
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        RemoteError::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RemoteError::Transient { retry_after, .. } => *retry_after,
            RemoteError::Rejected { .. } => None,
        }
    }
}

impl From<ApiError> for RemoteError {
    fn from(err: ApiError) -> Self {
        let retry_after = match &err {
            ApiError::HttpError { retry_after, .. } => *retry_after,
            _ => None,
        };
        if err.is_transient() {
            RemoteError::Transient {
                message: err.to_string(),
                retry_after,
            }
        } else {
            RemoteError::Rejected {
                message: err.to_string(),
            }
        }
    }
}

/// Step of a build that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    CreateQuiz,
    CreateItemGroup,
    CreateItem,
}

/// The question whose item could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRef {
    pub ordinal: usize,
    pub prompt_prefix: String,
}

/// Errors returned by `QuizBuilder::build`.
///
/// Transient remote failures never surface here directly: they are retried
/// and become `Fatal` once the attempt ceiling is reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{}", describe_fatal(.stage, .quiz_id, .question, .attempts, .source))]
    Fatal {
        stage: BuildStage,
        quiz_id: Option<String>,
        question: Option<QuestionRef>,
        attempts: u32,
        source: RemoteError,
    },

    /// `quiz_id` is `None` when cancellation came before any quiz existed.
    #[error("{}", describe_cancelled(.quiz_id, .items_created))]
    Cancelled {
        quiz_id: Option<String>,
        items_created: usize,
    },
}

impl BuildError {
    /// Remote id of the quiz that was created or targeted, if any.
    pub fn quiz_id(&self) -> Option<&str> {
        match self {
            BuildError::Fatal { quiz_id, .. } => quiz_id.as_deref(),
            BuildError::Cancelled { quiz_id, .. } => quiz_id.as_deref(),
        }
    }

    /// Ordinal of the question that failed, if the failure was on an item.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            BuildError::Fatal { question, .. } => question.as_ref().map(|q| q.ordinal),
            BuildError::Cancelled { .. } => None,
        }
    }
}

fn describe_fatal(
    stage: &BuildStage,
    quiz_id: &Option<String>,
    question: &Option<QuestionRef>,
    attempts: &u32,
    source: &RemoteError,
) -> String {
    let what = match (stage, question) {
        (BuildStage::CreateQuiz, _) => "creating the quiz failed".to_string(),
        (BuildStage::CreateItemGroup, _) => "creating the item group failed".to_string(),
        (BuildStage::CreateItem, Some(q)) => {
            format!("question {} ({:?}) failed", q.ordinal, q.prompt_prefix)
        }
        (BuildStage::CreateItem, None) => "creating an item failed".to_string(),
    };
    let quiz = match quiz_id.as_deref() {
        Some(id) => format!(" on quiz {id}"),
        None => String::new(),
    };
    format!("{what}{quiz} after {attempts} attempt(s): {source}")
}

fn describe_cancelled(quiz_id: &Option<String>, items_created: &usize) -> String {
    match quiz_id {
        Some(id) => format!(
            "build cancelled after {items_created} item(s); partial quiz {id} left on the remote side"
        ),
        None => "build cancelled before a quiz was created".to_string(),
    }
}
