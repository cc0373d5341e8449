//! The remote assessment capability the builder depends on, and its
//! implementation over `CanvasClient` plus an `HttpTransport`.

use log::debug;

use crate::client::{CanvasClient, RemoteItem};
use crate::error::{ApiError, RemoteError};
use crate::http::HttpTransport;
use crate::payload::{ItemPayload, QuizPayload};

/// Operations needed to materialize a quiz on a remote platform.
///
/// Every method returns the remote identifier of the created object.
/// Errors must be classified as transient or rejected; the builder retries
/// only the former.
pub trait RemoteAssessmentClient {
    fn create_quiz(&mut self, quiz: &QuizPayload) -> Result<String, RemoteError>;

    fn create_item_group(&mut self, quiz_id: &str) -> Result<String, RemoteError>;

    fn create_item(
        &mut self,
        quiz_id: &str,
        group_id: &str,
        item: &ItemPayload,
    ) -> Result<String, RemoteError>;
}

/// `RemoteAssessmentClient` backed by the New Quizzes HTTP API.
#[derive(Debug)]
pub struct CanvasRemote<T> {
    client: CanvasClient,
    transport: T,
}

impl<T: HttpTransport> CanvasRemote<T> {
    pub fn new(client: CanvasClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &CanvasClient {
        &self.client
    }

    /// Current items of a quiz in remote order.
    pub fn list_items(&mut self, quiz_id: &str) -> Result<Vec<RemoteItem>, ApiError> {
        let response = self.transport.execute(self.client.build_list_items(quiz_id))?;
        self.client.parse_list_items(response)
    }
}

impl<T: HttpTransport> RemoteAssessmentClient for CanvasRemote<T> {
    fn create_quiz(&mut self, quiz: &QuizPayload) -> Result<String, RemoteError> {
        let request = self.client.build_create_quiz(quiz)?;
        let response = self.transport.execute(request)?;
        Ok(self.client.parse_create_quiz(response)?.id)
    }

    /// New Quizzes positions items directly inside the quiz, so the quiz
    /// itself is the one ordered group.
    fn create_item_group(&mut self, quiz_id: &str) -> Result<String, RemoteError> {
        debug!("quiz {quiz_id} holds its items directly; using it as the item group");
        Ok(quiz_id.to_string())
    }

    fn create_item(
        &mut self,
        quiz_id: &str,
        _group_id: &str,
        item: &ItemPayload,
    ) -> Result<String, RemoteError> {
        let request = self.client.build_create_item(quiz_id, item)?;
        let response = self.transport.execute(request)?;
        Ok(self.client.parse_create_item(response)?.id)
    }
}
