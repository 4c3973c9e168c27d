//! HTTP front end of the todo service.
//!
//! # Overview
//! `app` builds the axum router over any `TodoStore`; `run` serves it on a
//! listener. Routes live under `/api`, with `/health` at the root.
//!
//! # Design
//! - Validation is route middleware, so each handler only ever sees data that
//!   passed its schema. `PATCH /api/todos/{id}` runs the id check first, then
//!   the body check.
//! - The store is injected through `AppState`; nothing is global. Store
//!   calls are synchronous SQLite work and run on the blocking pool through
//!   `AppState::with_store`, so they never stall the async workers.
//! - Layers from outermost in: request tracing, CORS, panic recovery.

use std::any::Any;
use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use todo_core::{Schema, StoreError, TodoStore};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::warn;

pub mod config;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod response;

use middleware::{Source, Validation};
use response::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

impl AppState {
    /// Run `call` against the store on tokio's blocking pool.
    ///
    /// A panic inside `call` is resumed on the calling task so the panic
    /// layer still turns it into a 500.
    pub async fn with_store<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TodoStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || call(store.as_ref())).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(StoreError::Aborted),
        }
    }
}

fn todo_routes() -> Router<AppState> {
    let id = from_fn_with_state(
        Validation::new(Schema::Id, Source::Params),
        middleware::validate_request,
    );
    let create = from_fn_with_state(
        Validation::new(Schema::Create, Source::Body),
        middleware::validate_request,
    );
    let update = from_fn_with_state(
        Validation::new(Schema::Update, Source::Body),
        middleware::validate_request,
    );

    Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo.layer(create)),
        )
        .route(
            "/todos/{id}",
            get(handlers::get_todo)
                .patch(handlers::update_todo.layer(update))
                .delete(handlers::delete_todo)
                .route_layer(id),
        )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    warn!(detail, "request handler panicked");
    ApiError::Internal("Internal server error").into_response()
}

pub fn app(store: Arc<dyn TodoStore>) -> Router {
    Router::new()
        .nest("/api", todo_routes())
        .route("/health", get(health::health))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(middleware::cors))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

pub async fn run(listener: TcpListener, store: Arc<dyn TodoStore>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}
