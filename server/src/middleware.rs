//! Request interceptors: schema validation and CORS.
//!
//! # Design
//! `validate_request` runs before a handler. It reads the payload selected by
//! `Source`, checks it with `todo_core::validate`, and on success stores the
//! normalized value in the request extensions for the handler to pick up. On
//! failure it answers with 400 itself and the handler never runs. The raw
//! body bytes are put back untouched.
//!
//! `cors` wraps the whole router: preflight requests are answered before any
//! route is looked at, and every other response gets the CORS headers it does
//! not already carry.

use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    extract::{Query, RawPathParams, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    RequestExt,
};
use serde_json::{Map, Value};
use todo_core::{validate, Schema};

use crate::response::ApiError;

const MAX_BODY_BYTES: usize = 1024 * 1024;

static CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        "GET, POST, PATCH, DELETE, OPTIONS",
    ),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "Content-Type, Authorization",
    ),
    (header::ACCESS_CONTROL_MAX_AGE, "86400"),
];

/// Which part of the request a schema applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The body, parsed as JSON.
    Body,
    /// Path parameters, e.g. `{id}`.
    Params,
    /// Query string parameters.
    Query,
}

/// A schema bound to a request source; the state of `validate_request`.
#[derive(Debug, Clone, Copy)]
pub struct Validation {
    pub schema: Schema,
    pub source: Source,
}

impl Validation {
    pub const fn new(schema: Schema, source: Source) -> Self {
        Self { schema, source }
    }
}

/// Normalized body left behind by a `Source::Body` validation.
#[derive(Debug, Clone)]
pub struct ValidatedBody(pub Value);

/// Normalized path or query parameters.
#[derive(Debug, Clone)]
pub struct ValidatedParams(pub Value);

impl ValidatedParams {
    /// The `id` parameter, if it was validated as an integer.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn validate_request(
    State(validation): State<Validation>,
    request: Request,
    next: Next,
) -> Response {
    match check(validation, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

async fn check(validation: Validation, request: Request) -> Result<Request, ApiError> {
    match validation.source {
        Source::Body => {
            let (parts, body) = request.into_parts();
            let bytes = to_bytes(body, MAX_BODY_BYTES)
                .await
                .map_err(|_| ApiError::InvalidJson)?;
            let payload: Value =
                serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidJson)?;
            let data = validate(validation.schema, &payload).map_err(ApiError::Validation)?;

            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(ValidatedBody(data));
            Ok(request)
        }
        Source::Params | Source::Query => {
            let mut request = request;
            let payload = if validation.source == Source::Params {
                path_params(&mut request).await
            } else {
                query_params(&request)
            };
            let data = validate(validation.schema, &payload).map_err(ApiError::Validation)?;
            request.extensions_mut().insert(ValidatedParams(data));
            Ok(request)
        }
    }
}

async fn path_params(request: &mut Request) -> Value {
    let mut params = Map::new();
    if let Ok(raw) = request.extract_parts::<RawPathParams>().await {
        for (key, value) in &raw {
            params.insert(key.to_string(), Value::from(value));
        }
    }
    Value::Object(params)
}

fn query_params(request: &Request) -> Value {
    let params = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();
    Value::Object(
        params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

/// Answer preflight requests and add CORS headers to every response.
pub async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in &CORS_HEADERS {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }
}
