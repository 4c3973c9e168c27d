//! CRUD handlers for `/todos`.
//!
//! Handlers read the normalized data the validation middleware attached,
//! make one store call, and map the outcome onto the response envelope.
//! Store failures are logged here and turned into a generic 500.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use todo_core::{CreateTodo, FieldError, StoreError, Todo, UpdateTodo};
use tracing::error;

use crate::middleware::{ValidatedBody, ValidatedParams};
use crate::response::{ApiError, Envelope};
use crate::AppState;

type ApiResult<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

#[derive(Debug, Default)]
pub struct ListQuery {
    completed: Option<String>,
}

impl ListQuery {
    /// First `completed` pair wins; repeated keys are not an error.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let completed = pairs
            .into_iter()
            .find(|(key, _)| key == "completed")
            .map(|(_, value)| value);
        Self { completed }
    }

    /// `true` / `false` filter by state; anything else lists everything.
    fn completed_filter(&self) -> Option<bool> {
        match self.completed.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

fn internal(err: StoreError, message: &'static str) -> ApiError {
    error!(error = %err, "{message}");
    ApiError::Internal(message)
}

fn todo_id(params: &ValidatedParams) -> Result<i64, ApiError> {
    params
        .id()
        .ok_or_else(|| ApiError::Validation(vec![FieldError::new("id", "ID is required")]))
}

/// Prefer the validated body; fall back to parsing the raw one when no
/// validation ran.
fn payload<T: DeserializeOwned>(
    validated: Option<Extension<ValidatedBody>>,
    raw: &[u8],
) -> Result<T, ApiError> {
    let value = match validated {
        Some(Extension(ValidatedBody(data))) => data,
        None => serde_json::from_slice::<Value>(raw).map_err(|_| ApiError::InvalidJson)?,
    };
    serde_json::from_value(value).map_err(|_| ApiError::InvalidJson)
}

pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Vec<Todo>> {
    // An unreadable query string lists everything rather than failing.
    let filter = query
        .map(|Query(pairs)| ListQuery::from_pairs(pairs))
        .unwrap_or_default()
        .completed_filter();
    let todos = state
        .with_store(move |store| store.list_all(filter))
        .await
        .map_err(|err| internal(err, "Failed to fetch todos"))?;
    let count = todos.len();
    Ok((StatusCode::OK, Json(Envelope::ok(todos).with_count(count))))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Extension(params): Extension<ValidatedParams>,
) -> ApiResult<Todo> {
    let id = todo_id(&params)?;
    let todo = state
        .with_store(move |store| store.get_by_id(id))
        .await
        .map_err(|err| internal(err, "Failed to fetch todo"))?
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::OK, Json(Envelope::ok(todo))))
}

pub async fn create_todo(
    State(state): State<AppState>,
    validated: Option<Extension<ValidatedBody>>,
    body: Bytes,
) -> ApiResult<Todo> {
    let input: CreateTodo = payload(validated, &body)?;
    let todo = state
        .with_store(move |store| store.create(&input))
        .await
        .map_err(|err| internal(err, "Failed to create todo"))?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(todo).with_message("Todo created successfully")),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Extension(params): Extension<ValidatedParams>,
    validated: Option<Extension<ValidatedBody>>,
    body: Bytes,
) -> ApiResult<Todo> {
    let id = todo_id(&params)?;
    let updates: UpdateTodo = payload(validated, &body)?;
    match state
        .with_store(move |store| store.update(id, &updates))
        .await
    {
        Ok(Some(todo)) => Ok((
            StatusCode::OK,
            Json(Envelope::ok(todo).with_message("Todo updated successfully")),
        )),
        Ok(None) => Err(ApiError::NotFound),
        Err(StoreError::InvalidInput(message)) => Err(ApiError::BadRequest(message.to_string())),
        Err(err) => Err(internal(err, "Failed to update todo")),
    }
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(params): Extension<ValidatedParams>,
) -> ApiResult<()> {
    let id = todo_id(&params)?;
    let deleted = state
        .with_store(move |store| store.delete_by_id(id))
        .await
        .map_err(|err| internal(err, "Failed to delete todo"))?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    Ok((StatusCode::OK, Json(Envelope::message("Todo deleted successfully"))))
}

pub async fn not_found() -> ApiError {
    ApiError::NoRoute
}
