use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};

use crate::core::{Todo, TodoChanges, TodoError};
use crate::storage::TodoStore;

#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: SqlitePool,
}

impl SqliteTodoStore {
    /// Opens (creating if needed) the database at `url` and migrates it.
    pub async fn connect(url: &str) -> Result<Self, TodoError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            tracing::info!(url = %url, "Creating database");
            Sqlite::create_database(url).await?;
        }
        let pool = SqlitePool::connect(url).await?;
        Self::from_pool(pool).await
    }

    /// A private database that lives as long as the store.
    pub async fn in_memory() -> Result<Self, TodoError> {
        // every pooled connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, TodoError> {
        migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), TodoError> {
    // AUTOINCREMENT keeps deleted ids from being handed out again
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            priority TEXT,
            done BOOLEAN NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn list_all(&self) -> Result<Vec<Todo>, TodoError> {
        let todos = sqlx::query_as::<_, Todo>("SELECT id, title, priority, done FROM todos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(todos)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Todo>, TodoError> {
        let todo = sqlx::query_as::<_, Todo>("SELECT id, title, priority, done FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn insert(&self, title: &str) -> Result<Todo, TodoError> {
        let result = sqlx::query("INSERT INTO todos (title, done) VALUES (?, 0)")
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(Todo {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            priority: None,
            done: false,
        })
    }

    async fn update_fields(&self, id: i64, changes: &TodoChanges) -> Result<(), TodoError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE todos SET ");
        let mut columns = query.separated(", ");
        if let Some(title) = &changes.title {
            columns.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(priority) = &changes.priority {
            columns.push("priority = ").push_bind_unseparated(priority.clone());
        }
        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn set_done(&self, id: i64, done: bool) -> Result<(), TodoError> {
        sqlx::query("UPDATE todos SET done = ? WHERE id = ?")
            .bind(done)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), TodoError> {
        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
