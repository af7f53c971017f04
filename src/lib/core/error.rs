use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
