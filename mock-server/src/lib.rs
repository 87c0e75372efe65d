//! In-memory stand-in for a slice of the LaunchDarkly REST API.
//!
//! Serves projects and feature flags under `/api/v2`, answers errors with
//! LaunchDarkly's `{"code", "message"}` shape, and rejects requests whose
//! `Authorization` header does not match the configured access token.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flag {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub temporary: bool,
}

#[derive(Deserialize)]
pub struct CreateFlag {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub temporary: bool,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Default)]
pub struct Store {
    pub projects: BTreeMap<String, Project>,
    pub flags: HashMap<String, BTreeMap<String, Flag>>,
}

#[derive(Clone)]
pub struct AppState {
    pub token: Arc<str>,
    pub store: Arc<RwLock<Store>>,
}

/// Router accepting only requests authorized with `token`.
pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/api/v2/caller-identity", get(caller_identity))
        .route("/api/v2/projects", get(list_projects).post(create_project))
        .route(
            "/api/v2/projects/{project_key}",
            get(get_project).delete(delete_project),
        )
        .route("/api/v2/flags/{project_key}", get(list_flags).post(create_flag))
        .route(
            "/api/v2/flags/{project_key}/{flag_key}",
            get(get_flag).delete(delete_flag),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message }))).into_response()
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == &*state.token);
    if !authorized {
        tracing::debug!(uri = %request.uri(), "rejecting unauthorized request");
        return error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid access token");
    }
    next.run(request).await
}

async fn caller_identity() -> Json<serde_json::Value> {
    Json(json!({ "authKind": "token", "tokenKind": "personal", "tokenName": "mock" }))
}

fn page<T>(items: impl Iterator<Item = T>, query: &ListQuery) -> Vec<T> {
    items
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect()
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    let items = page(store.projects.values().cloned(), &query);
    Json(json!({ "items": items, "totalCount": store.projects.len() }))
}

async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> Response {
    let mut store = state.store.write().await;
    if store.projects.contains_key(&input.key) {
        return error(StatusCode::CONFLICT, "conflict", "A project with that key already exists");
    }
    let project = Project {
        id: Uuid::new_v4(),
        key: input.key,
        name: input.name,
        tags: input.tags,
    };
    store.projects.insert(project.key.clone(), project.clone());
    store.flags.insert(project.key.clone(), BTreeMap::new());
    (StatusCode::CREATED, Json(project)).into_response()
}

async fn get_project(State(state): State<AppState>, Path(project_key): Path<String>) -> Response {
    let store = state.store.read().await;
    match store.projects.get(&project_key) {
        Some(project) => Json(project.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "not_found", "Unknown project key"),
    }
}

async fn delete_project(
    State(state): State<AppState>,
    Path(project_key): Path<String>,
) -> Response {
    let mut store = state.store.write().await;
    match store.projects.remove(&project_key) {
        Some(_) => {
            store.flags.remove(&project_key);
            StatusCode::NO_CONTENT.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "not_found", "Unknown project key"),
    }
}

async fn list_flags(
    State(state): State<AppState>,
    Path(project_key): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let store = state.store.read().await;
    match store.flags.get(&project_key) {
        Some(flags) => {
            let items = page(flags.values().cloned(), &query);
            Json(json!({ "items": items, "totalCount": flags.len() })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "not_found", "Unknown project key"),
    }
}

async fn create_flag(
    State(state): State<AppState>,
    Path(project_key): Path<String>,
    Json(input): Json<CreateFlag>,
) -> Response {
    let mut store = state.store.write().await;
    let Some(flags) = store.flags.get_mut(&project_key) else {
        return error(StatusCode::NOT_FOUND, "not_found", "Unknown project key");
    };
    if flags.contains_key(&input.key) {
        return error(StatusCode::CONFLICT, "conflict", "A flag with that key already exists");
    }
    let flag = Flag {
        key: input.key,
        name: input.name,
        description: input.description,
        temporary: input.temporary,
    };
    flags.insert(flag.key.clone(), flag.clone());
    (StatusCode::CREATED, Json(flag)).into_response()
}

async fn get_flag(
    State(state): State<AppState>,
    Path((project_key, flag_key)): Path<(String, String)>,
) -> Response {
    let store = state.store.read().await;
    match store.flags.get(&project_key).and_then(|f| f.get(&flag_key)) {
        Some(flag) => Json(flag.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "not_found", "Unknown flag key"),
    }
}

async fn delete_flag(
    State(state): State<AppState>,
    Path((project_key, flag_key)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.write().await;
    match store.flags.get_mut(&project_key).and_then(|f| f.remove(&flag_key)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "not_found", "Unknown flag key"),
    }
}
