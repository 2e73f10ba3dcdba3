use validator::Validate;

use crate::models::todo::{NewTodo, TodoChanges, TodoItem};
use crate::models::user::{NewUser, User};

pub mod database;
pub mod memory;
pub mod schema;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with an existing one: {0}")]
    Conflict(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("migration failed: {0}")]
    Migration(String),
}

/// Checks a row against the column widths before it is written.
pub(crate) fn check_widths(row: &impl Validate) -> Result<(), RepositoryError> {
    row.validate()
        .map_err(|e| RepositoryError::Constraint(format!("value too long: {e}")))
}

/// Todo persistence. Every lookup is scoped to the owning user.
pub trait TodoRepository: Send + Sync {
    /// The owner's todos ordered by id.
    fn list_todos(&self, owner: &str) -> Result<Vec<TodoItem>, RepositoryError>;

    fn find_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError>;

    fn insert_todo(&self, todo: NewTodo) -> Result<TodoItem, RepositoryError>;

    fn update_todo(
        &self,
        owner: &str,
        id: i32,
        changes: TodoChanges,
    ) -> Result<Option<TodoItem>, RepositoryError>;

    /// Flips `is_completed` in one step and returns the new state.
    fn toggle_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError>;

    /// Returns whether a row was removed.
    fn delete_todo(&self, owner: &str, id: i32) -> Result<bool, RepositoryError>;
}

pub trait UserRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    fn find_user_by_email(&self, normalized_email: &str) -> Result<Option<User>, RepositoryError>;

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;
}

pub trait Store: TodoRepository + UserRepository {}

impl<T: TodoRepository + UserRepository> Store for T {}
