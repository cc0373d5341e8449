//! Quiz text parser and remote quiz builder.
//!
//! # Overview
//! `parse` turns a plain-text quiz into a validated `Quiz`; `QuizBuilder`
//! walks that quiz and creates an unpublished quiz plus one item per
//! question through a `RemoteAssessmentClient`.
//!
//! # Design
//! - The parser is a pure function; warnings are returned, never logged.
//! - A `Quiz` can only come from the parser, so the builder never sees a
//!   document that failed to parse.
//! - `CanvasClient` follows the host-does-IO pattern: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`, and an
//!   `HttpTransport` supplied by the host does the round-trip.
//! - Submission is sequential so remote order always equals file order.

pub mod builder;
pub mod client;
pub mod error;
pub mod http;
pub mod parser;
pub mod payload;
pub mod remote;
mod render;
pub mod types;

pub use builder::{build, CancelToken, QuizBuilder, RemoteQuizHandle, RetryPolicy};
pub use client::{CanvasClient, RemoteItem, RemoteQuiz};
pub use error::{ApiError, BuildError, BuildStage, QuestionRef, RemoteError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use parser::{parse, parse_with, ParseError, ParseOptions, ParsedQuiz, ValidationWarning, WarningKind};
pub use payload::{ItemPayload, QuizPayload, QuizSettings};
pub use remote::{CanvasRemote, RemoteAssessmentClient};
pub use types::{Answer, Feedback, NumericAnswer, Question, QuestionType, Quiz};
