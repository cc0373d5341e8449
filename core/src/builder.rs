//! Sequential, order-preserving translation of a parsed `Quiz` into remote
//! create calls.
//!
//! # Design
//! Items are submitted one at a time in document order; the next item is
//! not sent until the previous one has been acknowledged, so remote order
//! always equals file order. Transient failures are retried with bounded
//! exponential backoff. Anything else stops the build and reports the remote
//! quiz id so a human can clean up; nothing is rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{BuildError, BuildStage, QuestionRef, RemoteError};
use crate::payload::{ItemPayload, QuizPayload, QuizSettings};
use crate::remote::RemoteAssessmentClient;
use crate::types::Quiz;

const PROMPT_PREFIX_CHARS: usize = 40;
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Bounded exponential backoff for transient remote failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_factor: u32,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 500,
            backoff_factor: 2,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Retry immediately; used by tests and fakes.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            backoff_factor: 1,
            max_backoff_ms: 0,
        }
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    /// A server-provided `Retry-After` wins but is still capped.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.max_backoff_ms);
        if let Some(hint) = retry_after {
            return hint.min(cap);
        }
        let exponent = attempt.saturating_sub(1);
        let factor = u64::from(self.backoff_factor).saturating_pow(exponent);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor)).min(cap)
    }
}

/// Cooperative cancellation flag shared between the caller and a build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Remote identifiers of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuizHandle {
    pub quiz_id: String,
    pub group_id: String,
    /// Item ids in document order.
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QuizBuilder {
    settings: QuizSettings,
    retry: RetryPolicy,
    cancel: CancelToken,
    append_to: Option<String>,
}

/// Build `quiz` with default settings and retry policy.
pub fn build<C: RemoteAssessmentClient + ?Sized>(
    quiz: &Quiz,
    client: &mut C,
) -> Result<RemoteQuizHandle, BuildError> {
    QuizBuilder::new().build(quiz, client)
}

impl QuizBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Append to an existing remote quiz instead of creating one.
    pub fn append_to(mut self, quiz_id: impl Into<String>) -> Self {
        self.append_to = Some(quiz_id.into());
        self
    }

    pub fn build<C: RemoteAssessmentClient + ?Sized>(
        &self,
        quiz: &Quiz,
        client: &mut C,
    ) -> Result<RemoteQuizHandle, BuildError> {
        let quiz_id = match &self.append_to {
            Some(id) => {
                info!(
                    "appending {} question(s) to existing quiz {id}",
                    quiz.questions().len()
                );
                id.clone()
            }
            None => {
                if self.cancel.is_cancelled() {
                    warn!("build cancelled before the quiz was created");
                    return Err(BuildError::Cancelled {
                        quiz_id: None,
                        items_created: 0,
                    });
                }
                let payload = QuizPayload::new(quiz, &self.settings);
                let id = self
                    .with_retry("create quiz", || client.create_quiz(&payload))
                    .map_err(|stop| stop.into_error(BuildStage::CreateQuiz, None, None, 0))?;
                info!(
                    "created unpublished quiz {id} {:?} worth {} point(s)",
                    quiz.title(),
                    quiz.total_points()
                );
                id
            }
        };

        let group_id = self
            .with_retry("create item group", || client.create_item_group(&quiz_id))
            .map_err(|stop| stop.into_error(BuildStage::CreateItemGroup, Some(&quiz_id), None, 0))?;

        let mut item_ids = Vec::with_capacity(quiz.questions().len());
        for question in quiz.questions() {
            if self.cancel.is_cancelled() {
                warn!(
                    "build cancelled before question {}; quiz {quiz_id} has {} item(s)",
                    question.ordinal,
                    item_ids.len()
                );
                return Err(BuildError::Cancelled {
                    quiz_id: Some(quiz_id),
                    items_created: item_ids.len(),
                });
            }

            let mut payload = ItemPayload::from_question(question, self.settings.shuffle_answers);
            if self.append_to.is_some() {
                payload.item.position = None;
            }
            let what = format!("create item for question {}", question.ordinal);
            let item_id = self
                .with_retry(&what, || client.create_item(&quiz_id, &group_id, &payload))
                .map_err(|stop| {
                    let question = QuestionRef {
                        ordinal: question.ordinal,
                        prompt_prefix: question.prompt_prefix(PROMPT_PREFIX_CHARS),
                    };
                    stop.into_error(BuildStage::CreateItem, Some(&quiz_id), Some(question), item_ids.len())
                })?;
            debug!(
                "question {} ({}) created as item {item_id}",
                question.ordinal, question.kind
            );
            item_ids.push(item_id);
        }

        info!("quiz {quiz_id}: {} item(s) created", item_ids.len());
        Ok(RemoteQuizHandle {
            quiz_id,
            group_id,
            item_ids,
        })
    }

    /// Run `call` until it succeeds, fails with a rejection, the attempt
    /// ceiling is reached, or the build is cancelled while backing off.
    fn with_retry<T>(
        &self,
        what: &str,
        mut call: impl FnMut() -> Result<T, RemoteError>,
    ) -> Result<T, Stop> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt, err.retry_after());
                    warn!("{what}: attempt {attempt}/{max_attempts} failed ({err}); retrying in {delay:?}");
                    if !self.wait(delay) {
                        warn!("{what}: cancelled while waiting to retry");
                        return Err(Stop::Cancelled);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(Stop::Failed(err, attempt)),
            }
        }
    }

    /// Sleep for `delay` in short slices. Returns `false` as soon as the
    /// build is cancelled.
    fn wait(&self, delay: Duration) -> bool {
        let mut remaining = delay;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            if remaining.is_zero() {
                return true;
            }
            let slice = remaining.min(CANCEL_POLL);
            thread::sleep(slice);
            remaining -= slice;
        }
    }
}

/// Why `with_retry` gave up.
enum Stop {
    Failed(RemoteError, u32),
    Cancelled,
}

impl Stop {
    fn into_error(
        self,
        stage: BuildStage,
        quiz_id: Option<&str>,
        question: Option<QuestionRef>,
        items_created: usize,
    ) -> BuildError {
        let quiz_id = quiz_id.map(str::to_string);
        match self {
            Stop::Failed(source, attempts) => BuildError::Fatal {
                stage,
                quiz_id,
                question,
                attempts,
                source,
            },
            Stop::Cancelled => BuildError::Cancelled {
                quiz_id,
                items_created,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::parser::parse;

    /// Records every call and fails according to a per-item script.
    #[derive(Default)]
    struct FakeRemote {
        quiz_failures: VecDeque<RemoteError>,
        item_failures: VecDeque<Option<RemoteError>>,
        quizzes_created: usize,
        items: Vec<ItemPayload>,
        item_calls: usize,
        cancel_after: Option<(usize, CancelToken)>,
        cancel_on_failure: Option<CancelToken>,
    }

    impl RemoteAssessmentClient for FakeRemote {
        fn create_quiz(&mut self, _quiz: &QuizPayload) -> Result<String, RemoteError> {
            if let Some(err) = self.quiz_failures.pop_front() {
                return Err(err);
            }
            self.quizzes_created += 1;
            Ok("quiz-1".to_string())
        }

        fn create_item_group(&mut self, quiz_id: &str) -> Result<String, RemoteError> {
            Ok(format!("{quiz_id}-group"))
        }

        fn create_item(
            &mut self,
            _quiz_id: &str,
            _group_id: &str,
            item: &ItemPayload,
        ) -> Result<String, RemoteError> {
            self.item_calls += 1;
            if let Some(Some(err)) = self.item_failures.pop_front() {
                if let Some(token) = &self.cancel_on_failure {
                    token.cancel();
                }
                return Err(err);
            }
            self.items.push(item.clone());
            if let Some((after, token)) = &self.cancel_after {
                if self.items.len() == *after {
                    token.cancel();
                }
            }
            Ok(format!("item-{}", self.items.len()))
        }
    }

    const THREE: &str = "Quiz title: Three\n\n1. First question?\n*a) x\nb) y\n\n2. Pick all primes.\n*a) 2\n*b) 3\nc) 4\n\n3. Explain.\n____\n";

    fn three() -> Quiz {
        parse(THREE).unwrap().quiz
    }

    #[test]
    fn submits_items_in_document_order() {
        let mut remote = FakeRemote::default();
        let handle = build(&three(), &mut remote).unwrap();

        assert_eq!(handle.quiz_id, "quiz-1");
        assert_eq!(handle.group_id, "quiz-1-group");
        assert_eq!(handle.item_ids, vec!["item-1", "item-2", "item-3"]);
        let slugs: Vec<&str> = remote
            .items
            .iter()
            .map(|i| i.item.entry.interaction_type_slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["choice", "multi-answer", "essay"]);
        let positions: Vec<Option<usize>> = remote.items.iter().map(|i| i.item.position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn rejection_of_second_item_stops_the_build() {
        let mut remote = FakeRemote {
            item_failures: VecDeque::from(vec![None, Some(RemoteError::rejected("HTTP 422: invalid item"))]),
            ..FakeRemote::default()
        };
        let err = build(&three(), &mut remote).unwrap_err();

        match &err {
            BuildError::Fatal {
                stage,
                quiz_id,
                question,
                attempts,
                ..
            } => {
                assert_eq!(*stage, BuildStage::CreateItem);
                assert_eq!(quiz_id.as_deref(), Some("quiz-1"));
                let question = question.as_ref().unwrap();
                assert_eq!(question.ordinal, 2);
                assert_eq!(question.prompt_prefix, "Pick all primes.");
                assert_eq!(*attempts, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(remote.item_calls, 2, "third item must not be submitted");
        assert!(err.to_string().contains("question 2"));
        assert!(err.to_string().contains("quiz quiz-1"));
    }

    #[test]
    fn transient_failures_are_retried() {
        let mut remote = FakeRemote {
            item_failures: VecDeque::from(vec![
                Some(RemoteError::transient("HTTP 503")),
                Some(RemoteError::transient("timed out")),
            ]),
            ..FakeRemote::default()
        };
        let handle = QuizBuilder::new()
            .retry(RetryPolicy::immediate(3))
            .build(&three(), &mut remote)
            .unwrap();
        assert_eq!(handle.item_ids.len(), 3);
        assert_eq!(remote.item_calls, 5);
    }

    #[test]
    fn exhausted_retries_become_fatal() {
        let mut remote = FakeRemote {
            item_failures: VecDeque::from(vec![
                Some(RemoteError::transient("HTTP 429")),
                Some(RemoteError::transient("HTTP 429")),
            ]),
            ..FakeRemote::default()
        };
        let err = QuizBuilder::new()
            .retry(RetryPolicy::immediate(2))
            .build(&three(), &mut remote)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Fatal {
                attempts: 2,
                source: RemoteError::Transient { .. },
                ..
            }
        ));
        assert_eq!(err.ordinal(), Some(1));
        assert_eq!(err.quiz_id(), Some("quiz-1"));
    }

    #[test]
    fn quiz_creation_failure_has_no_quiz_id() {
        let mut remote = FakeRemote {
            quiz_failures: VecDeque::from(vec![RemoteError::rejected("HTTP 401: unauthorized")]),
            ..FakeRemote::default()
        };
        let err = build(&three(), &mut remote).unwrap_err();
        assert_eq!(err.quiz_id(), None);
        assert!(matches!(err, BuildError::Fatal { stage: BuildStage::CreateQuiz, .. }));
        assert_eq!(remote.item_calls, 0);
    }

    #[test]
    fn cancellation_stops_between_items() {
        let token = CancelToken::new();
        let mut remote = FakeRemote {
            cancel_after: Some((1, token.clone())),
            ..FakeRemote::default()
        };
        let err = QuizBuilder::new()
            .cancel_token(token)
            .build(&three(), &mut remote)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Cancelled {
                quiz_id: Some("quiz-1".into()),
                items_created: 1
            }
        );
        assert_eq!(remote.item_calls, 1);
    }

    #[test]
    fn cancelled_token_creates_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut remote = FakeRemote::default();
        let err = QuizBuilder::new()
            .cancel_token(token)
            .build(&three(), &mut remote)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Cancelled {
                quiz_id: None,
                items_created: 0
            }
        );
        assert_eq!(remote.quizzes_created, 0);
        assert_eq!(remote.item_calls, 0);
    }

    #[test]
    fn cancellation_interrupts_retry_backoff() {
        let token = CancelToken::new();
        let mut remote = FakeRemote {
            item_failures: VecDeque::from(vec![Some(RemoteError::transient("HTTP 503"))]),
            cancel_on_failure: Some(token.clone()),
            ..FakeRemote::default()
        };
        let slow = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 60_000,
            backoff_factor: 2,
            max_backoff_ms: 60_000,
        };
        let err = QuizBuilder::new()
            .retry(slow)
            .cancel_token(token)
            .build(&three(), &mut remote)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Cancelled {
                quiz_id: Some("quiz-1".into()),
                items_created: 0
            }
        );
        assert_eq!(remote.item_calls, 1, "no retry after cancellation");
    }

    #[test]
    fn append_skips_quiz_creation_and_positions() {
        let mut remote = FakeRemote::default();
        let handle = QuizBuilder::new()
            .append_to("existing-9")
            .build(&three(), &mut remote)
            .unwrap();
        assert_eq!(handle.quiz_id, "existing-9");
        assert_eq!(remote.quizzes_created, 0);
        assert!(remote.items.iter().all(|i| i.item.position.is_none()));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3, None), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(10, None), Duration::from_millis(8_000));
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_millis(8_000)
        );
        assert_eq!(RetryPolicy::immediate(3).delay_for(2, None), Duration::ZERO);
    }
}
