//! Parameterized SQL for the `todos` table.
//!
//! Every function takes the connection explicitly and runs exactly one
//! statement. Rows always go through `todo_from_row`, which is the only place
//! the stored `0`/`1` becomes a `bool`.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::StoreError;
use crate::types::{CreateTodo, Todo, UpdateTodo};

/// DDL for the `todos` table and its indexes.
pub const SCHEMA: &str = include_str!("../schema.sql");

/// Fields an update is allowed to write, in `SET` order.
pub const UPDATABLE_FIELDS: [&str; 3] = ["title", "description", "completed"];

const NO_VALID_FIELDS: &str = "No valid fields to update";

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let completed: i64 = row.get("completed")?;
    Ok(Todo {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: completed != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Create the table and indexes if they are missing.
pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// All todos, newest first, optionally restricted to one `completed` state.
pub fn list_all(conn: &Connection, completed: Option<bool>) -> Result<Vec<Todo>, StoreError> {
    let todos = match completed {
        Some(flag) => {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at, updated_at \
                 FROM todos WHERE completed = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![i64::from(flag)], todo_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at, updated_at \
                 FROM todos ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([], todo_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    debug!(count = todos.len(), ?completed, "listed todos");
    Ok(todos)
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Todo>, StoreError> {
    let todo = conn
        .query_row(
            "SELECT id, title, description, completed, created_at, updated_at \
             FROM todos WHERE id = ?1",
            params![id],
            todo_from_row,
        )
        .optional()?;
    Ok(todo)
}

/// Insert a new, not yet completed todo and return the stored row.
pub fn create(conn: &Connection, input: &CreateTodo) -> Result<Todo, StoreError> {
    let todo = conn.query_row(
        "INSERT INTO todos (title, description, completed) VALUES (?1, ?2, 0) \
         RETURNING id, title, description, completed, created_at, updated_at",
        params![input.title, input.description],
        todo_from_row,
    )?;
    debug!(id = todo.id, "created todo");
    Ok(todo)
}

fn assignment(updates: &UpdateTodo, field: &str) -> Option<SqlValue> {
    match field {
        "title" => updates.title.clone().map(SqlValue::Text),
        "description" => updates.description.clone().map(SqlValue::Text),
        "completed" => updates
            .completed
            .map(|completed| SqlValue::Integer(i64::from(completed))),
        _ => None,
    }
}

/// Apply the present allow-listed fields and refresh `updated_at`.
///
/// Returns `Ok(None)` when no row has this id and
/// `StoreError::InvalidInput` when `updates` carries no field to write.
pub fn update(
    conn: &Connection,
    id: i64,
    updates: &UpdateTodo,
) -> Result<Option<Todo>, StoreError> {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for field in UPDATABLE_FIELDS {
        if let Some(value) = assignment(updates, field) {
            values.push(value);
            assignments.push(format!("{field} = ?{}", values.len()));
        }
    }
    if assignments.is_empty() {
        return Err(StoreError::InvalidInput(NO_VALID_FIELDS));
    }
    assignments.push("updated_at = CURRENT_TIMESTAMP".to_string());
    values.push(SqlValue::Integer(id));

    let sql = format!(
        "UPDATE todos SET {} WHERE id = ?{} \
         RETURNING id, title, description, completed, created_at, updated_at",
        assignments.join(", "),
        values.len()
    );
    let todo = conn
        .query_row(&sql, params_from_iter(values), todo_from_row)
        .optional()?;
    debug!(id, found = todo.is_some(), "updated todo");
    Ok(todo)
}

/// Remove a todo. Returns whether a row was deleted.
pub fn delete_by_id(conn: &Connection, id: i64) -> Result<bool, StoreError> {
    let affected = conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
    debug!(id, affected, "deleted todo");
    Ok(affected == 1)
}

/// Round trip to the database without touching any table.
pub fn ping(conn: &Connection) -> Result<(), StoreError> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

pub fn has_todos_table(conn: &Connection) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'todos'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn init_schema_is_idempotent() {
        let conn = conn();
        init_schema(&conn).unwrap();
        assert!(has_todos_table(&conn).unwrap());
    }

    #[test]
    fn completed_is_read_back_as_bool() {
        let conn = conn();
        conn.execute(
            "INSERT INTO todos (title, completed) VALUES ('done', 1)",
            [],
        )
        .unwrap();
        let todos = list_all(&conn, None).unwrap();
        assert!(todos[0].completed);
    }

    #[test]
    fn update_writes_only_present_fields() {
        let conn = conn();
        let created = create(
            &conn,
            &CreateTodo {
                title: "Keep".to_string(),
                description: "original".to_string(),
            },
        )
        .unwrap();
        let updates = UpdateTodo {
            completed: Some(true),
            ..UpdateTodo::default()
        };
        let updated = update(&conn, created.id, &updates).unwrap().unwrap();
        assert_eq!(updated.title, "Keep");
        assert_eq!(updated.description, "original");
        assert!(updated.completed);
    }

    #[test]
    fn update_stores_completed_as_integer() {
        let conn = conn();
        let created = create(&conn, &CreateTodo::new("T")).unwrap();
        let updates = UpdateTodo {
            completed: Some(true),
            ..UpdateTodo::default()
        };
        update(&conn, created.id, &updates).unwrap();
        let raw: i64 = conn
            .query_row(
                "SELECT completed FROM todos WHERE id = ?1",
                params![created.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw, 1);
    }

    #[test]
    fn empty_update_is_invalid_input() {
        let conn = conn();
        let err = update(&conn, 1, &UpdateTodo::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput("No valid fields to update")));
    }

    #[test]
    fn ping_succeeds_without_schema() {
        let conn = Connection::open_in_memory().unwrap();
        ping(&conn).unwrap();
        assert!(!has_todos_table(&conn).unwrap());
    }
}
