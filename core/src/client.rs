//! Stateless HTTP request builder and response parser for the remote quiz
//! API (Canvas New Quizzes).
//!
//! # Design
//! `CanvasClient` holds the base URL, course id and bearer token and carries
//! no mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller executes the round-trip.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::payload::{ItemPayload, QuizPayload};

/// Quiz object returned by the create call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteQuiz {
    #[serde(deserialize_with = "remote_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Item object returned by the create and list calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteItem {
    #[serde(deserialize_with = "remote_id")]
    pub id: String,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub entry: Option<RemoteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub interaction_type_slug: String,
}

/// The API reports ids as strings or as bare numbers depending on the
/// endpoint; both are kept as strings.
fn remote_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Synchronous, stateless client for the remote quiz API.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    base_url: String,
    course_id: u64,
    token: String,
}

impl CanvasClient {
    pub fn new(base_url: &str, course_id: u64, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            course_id,
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn course_id(&self) -> u64 {
        self.course_id
    }

    /// Browser URL of the quiz's assignment page.
    pub fn assignment_url(&self, quiz_id: &str) -> String {
        format!("{}/courses/{}/assignments/{quiz_id}", self.base_url, self.course_id)
    }

    fn quizzes_path(&self) -> String {
        format!("{}/api/quiz/v1/courses/{}/quizzes", self.base_url, self.course_id)
    }

    fn items_path(&self, quiz_id: &str) -> String {
        format!("{}/{quiz_id}/items", self.quizzes_path())
    }

    fn headers(&self, json: bool) -> Vec<(String, String)> {
        let mut headers = vec![("authorization".to_string(), format!("Bearer {}", self.token))];
        if json {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers
    }

    pub fn build_create_quiz(&self, input: &QuizPayload) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.quizzes_path(),
            headers: self.headers(true),
            body: Some(body),
        })
    }

    pub fn build_create_item(&self, quiz_id: &str, input: &ItemPayload) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.items_path(quiz_id),
            headers: self.headers(true),
            body: Some(body),
        })
    }

    pub fn build_list_items(&self, quiz_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.items_path(quiz_id),
            headers: self.headers(false),
            body: None,
        }
    }

    pub fn parse_create_quiz(&self, response: HttpResponse) -> Result<RemoteQuiz, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<RemoteItem, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Items sorted by their remote position.
    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<RemoteItem>, ApiError> {
        check_status(&response)?;
        let mut items: Vec<RemoteItem> =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        items.sort_by_key(|item| item.position.unwrap_or(usize::MAX));
        Ok(items)
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    let retry_after = response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
        retry_after,
    })
}
