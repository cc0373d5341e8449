//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `CanvasClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; an `HttpTransport`
//! supplied by the host performs the round-trip. Keeping the wire exchange
//! as data lets the builder be driven by a real HTTP agent, the mock server
//! or a scripted fake without changing the core.

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Executes one HTTP round-trip on behalf of the core.
///
/// Implementations return non-2xx responses as `Ok`; only failures to get a
/// response at all (connect errors, timeouts) are `ApiError::Transport`.
pub trait HttpTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}
