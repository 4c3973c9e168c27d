//! `GET /health`: store reachability and table presence.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::warn;

use crate::AppState;

pub const SERVICE_NAME: &str = "todo-api";

#[derive(Debug, Serialize)]
pub struct Check {
    pub status: &'static str,
    pub message: String,
}

impl Check {
    fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: "healthy",
            message: message.into(),
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            message: message.into(),
        }
    }

    fn passed(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
pub struct Checks {
    pub d1_database: Check,
    pub todos_table: Check,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub checks: Checks,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let d1_database = match state.with_store(|store| store.ping()).await {
        Ok(()) => Check::healthy("Database connection successful"),
        Err(err) => {
            warn!(error = %err, "database probe failed");
            Check::unhealthy("Database connection failed")
        }
    };
    let todos_table = match state.with_store(|store| store.has_todos_table()).await {
        Ok(true) => Check::healthy("Todos table exists"),
        Ok(false) => Check::unhealthy("Todos table not found"),
        Err(err) => {
            warn!(error = %err, "table probe failed");
            Check::unhealthy("Todos table check failed")
        }
    };

    let ok = d1_database.passed() && todos_table.passed();
    let report = HealthReport {
        status: if ok { "healthy" } else { "unhealthy" },
        timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        service: SERVICE_NAME,
        checks: Checks {
            d1_database,
            todos_table,
        },
    };
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
