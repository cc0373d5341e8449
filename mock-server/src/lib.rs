//! In-memory fake of the New Quizzes API used by integration tests.
//!
//! Supports quiz creation, item creation with positional insert, listing
//! items, and scripted failures for item submissions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: u64,
    pub title: String,
    pub instructions: String,
    pub points_possible: f64,
    pub published: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub position: usize,
    pub points_possible: f64,
    pub entry_type: String,
    pub entry: Value,
}

#[derive(Deserialize)]
pub struct CreateQuiz {
    pub quiz: QuizInput,
}

#[derive(Deserialize)]
pub struct QuizInput {
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub points_possible: f64,
    #[serde(default)]
    pub published: bool,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub item: ItemInput,
}

#[derive(Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub position: Option<usize>,
    pub points_possible: f64,
    pub entry_type: String,
    pub entry: Value,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    quizzes: HashMap<String, Quiz>,
    items: HashMap<String, Vec<Item>>,
    faults: VecDeque<Option<u16>>,
}

impl Store {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn quiz(&self, course_id: u64, quiz_id: &str) -> Option<&Quiz> {
        self.quizzes.get(quiz_id).filter(|q| q.course_id == course_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_faults(Vec::new())
}

/// Each entry of `faults` is consumed by one item submission: `Some(status)`
/// answers with that status instead of creating the item, `None` lets the
/// submission through.
pub fn app_with_faults(faults: Vec<Option<u16>>) -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        faults: faults.into(),
        ..Store::default()
    }));
    Router::new()
        .route("/api/quiz/v1/courses/{course_id}/quizzes", post(create_quiz))
        .route("/api/quiz/v1/courses/{course_id}/quizzes/{quiz_id}", get(get_quiz))
        .route(
            "/api/quiz/v1/courses/{course_id}/quizzes/{quiz_id}/items",
            get(list_items).post(create_item),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_faults(listener: TcpListener, faults: Vec<Option<u16>>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_faults(faults)).await
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty())
}

/// Reason the entry cannot be stored, if any.
fn invalid_entry(entry: &Value) -> Option<&'static str> {
    if entry.get("interaction_type_slug").and_then(Value::as_str).is_none() {
        return Some("entry.interaction_type_slug is required");
    }
    if entry.get("item_body").and_then(Value::as_str).is_none() {
        return Some("entry.item_body is required");
    }
    if !entry.get("scoring_data").is_some_and(Value::is_object) {
        return Some("entry.scoring_data must be an object");
    }
    None
}

async fn create_quiz(
    State(db): State<Db>,
    Path(course_id): Path<u64>,
    headers: HeaderMap,
    Json(input): Json<CreateQuiz>,
) -> Result<Json<Quiz>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if input.quiz.title.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut store = db.write().await;
    let quiz = Quiz {
        id: store.next_id(),
        course_id,
        title: input.quiz.title,
        instructions: input.quiz.instructions,
        points_possible: input.quiz.points_possible,
        published: input.quiz.published,
    };
    store.items.insert(quiz.id.clone(), Vec::new());
    store.quizzes.insert(quiz.id.clone(), quiz.clone());
    Ok(Json(quiz))
}

async fn get_quiz(
    State(db): State<Db>,
    Path((course_id, quiz_id)): Path<(u64, String)>,
    headers: HeaderMap,
) -> Result<Json<Quiz>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let store = db.read().await;
    store.quiz(course_id, &quiz_id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_items(
    State(db): State<Db>,
    Path((course_id, quiz_id)): Path<(u64, String)>,
    headers: HeaderMap,
) -> Result<Json<Vec<Item>>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let store = db.read().await;
    store.quiz(course_id, &quiz_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(store.items.get(&quiz_id).cloned().unwrap_or_default()))
}

async fn create_item(
    State(db): State<Db>,
    Path((course_id, quiz_id)): Path<(u64, String)>,
    headers: HeaderMap,
    Json(input): Json<CreateItem>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = db.write().await;
    if let Some(Some(status)) = store.faults.pop_front() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, [(header::RETRY_AFTER, "0")], "injected fault").into_response();
    }
    if store.quiz(course_id, &quiz_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Some(reason) = invalid_entry(&input.item.entry) {
        return (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response();
    }

    let id = store.next_id();
    let items = store.items.entry(quiz_id).or_default();
    let index = input
        .item
        .position
        .map_or(items.len(), |p| p.saturating_sub(1).min(items.len()));
    items.insert(
        index,
        Item {
            id,
            position: 0,
            points_possible: input.item.points_possible,
            entry_type: input.item.entry_type,
            entry: input.item.entry,
        },
    );
    for (idx, item) in items.iter_mut().enumerate() {
        item.position = idx + 1;
    }
    Json(items[index].clone()).into_response()
}
