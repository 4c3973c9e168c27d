//! Storage seam for the todo service.
//!
//! # Design
//! Handlers depend on `TodoStore`, never on SQLite directly, so tests can hand
//! the router a store that fails on demand. `SqliteStore` owns one connection
//! behind a mutex and forwards each call to the matching `queries` function.
//! Every operation is a single statement, so no transaction spans calls.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::StoreError;
use crate::queries;
use crate::types::{CreateTodo, Todo, UpdateTodo};

/// Persistence operations for todos.
pub trait TodoStore: Send + Sync {
    /// All todos ordered newest first; `Some(flag)` keeps only matching ones.
    fn list_all(&self, completed: Option<bool>) -> Result<Vec<Todo>, StoreError>;

    /// `Ok(None)` when no todo has this id.
    fn get_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError>;

    fn create(&self, input: &CreateTodo) -> Result<Todo, StoreError>;

    /// `Ok(None)` when no todo has this id.
    fn update(&self, id: i64, updates: &UpdateTodo) -> Result<Option<Todo>, StoreError>;

    /// Whether a todo was removed.
    fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;

    /// Check that the database answers at all.
    fn ping(&self) -> Result<(), StoreError>;

    fn has_todos_table(&self) -> Result<bool, StoreError>;
}

/// `TodoStore` backed by a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an existing connection as is. The schema is not touched.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) a database file and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        queries::init_schema(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        queries::init_schema(&conn)?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TodoStore for SqliteStore {
    fn list_all(&self, completed: Option<bool>) -> Result<Vec<Todo>, StoreError> {
        queries::list_all(&*self.conn()?, completed)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        queries::get_by_id(&*self.conn()?, id)
    }

    fn create(&self, input: &CreateTodo) -> Result<Todo, StoreError> {
        queries::create(&*self.conn()?, input)
    }

    fn update(&self, id: i64, updates: &UpdateTodo) -> Result<Option<Todo>, StoreError> {
        queries::update(&*self.conn()?, id, updates)
    }

    fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        queries::delete_by_id(&*self.conn()?, id)
    }

    fn ping(&self) -> Result<(), StoreError> {
        queries::ping(&*self.conn()?)
    }

    fn has_todos_table(&self) -> Result<bool, StoreError> {
        queries::has_todos_table(&*self.conn()?)
    }
}
