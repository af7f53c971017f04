pub mod sqlite;

pub use sqlite::SqliteTodoStore;

use async_trait::async_trait;
use crate::core::{Todo, TodoChanges, TodoError};

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All todos in insertion order.
    async fn list_all(&self) -> Result<Vec<Todo>, TodoError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Todo>, TodoError>;
    /// Inserts a todo with `done = false` and no priority.
    async fn insert(&self, title: &str) -> Result<Todo, TodoError>;
    async fn update_fields(&self, id: i64, changes: &TodoChanges) -> Result<(), TodoError>;
    async fn set_done(&self, id: i64, done: bool) -> Result<(), TodoError>;
    async fn delete(&self, id: i64) -> Result<(), TodoError>;
}

/// Resolves an id taken from a URL path. Anything that is not a
/// positive integer cannot name a stored todo.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
