//! Domain core of the todo service.
//!
//! # Overview
//! Holds everything that does not depend on HTTP: the `Todo` types, the
//! schema validator used by the request middleware, and the SQLite-backed
//! persistence layer.
//!
//! # Design
//! - `validation` is pure: JSON in, normalized JSON or field errors out.
//! - `queries` runs single parameterized statements against a connection
//!   passed in by the caller; `store` puts the `TodoStore` trait in front of
//!   it so the server can be tested against other implementations.
//! - Absence is a value (`Option` / `bool`), not an error.

pub mod error;
pub mod queries;
pub mod store;
pub mod types;
pub mod validation;

pub use error::StoreError;
pub use store::{SqliteStore, TodoStore};
pub use types::{CreateTodo, Todo, UpdateTodo};
pub use validation::{validate, FieldError, Schema};
