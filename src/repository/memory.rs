use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::models::schedule;
use crate::models::todo::{NewTodo, TodoChanges, TodoItem};
use crate::models::user::{NewUser, User};
use crate::repository::{check_widths, RepositoryError, TodoRepository, UserRepository};

#[derive(Default)]
struct MemoryState {
    todos: BTreeMap<i32, TodoItem>,
    last_todo_id: i32,
    users: HashMap<String, User>,
}

/// Process-local store for running without Postgres. Mirrors the table
/// constraints of the relational schema.
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Pool("memory store lock poisoned".to_string()))
    }
}

fn check_schedule(
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<(), RepositoryError> {
    schedule::validate(start, end)
        .map_err(|e| RepositoryError::Constraint(format!("ck_todos_schedule: {e}")))
}

impl MemoryState {
    fn owned_mut(&mut self, owner: &str, id: i32) -> Option<&mut TodoItem> {
        self.todos.get_mut(&id).filter(|todo| todo.user_id == owner)
    }
}

impl TodoRepository for MemoryDatabase {
    fn list_todos(&self, owner: &str) -> Result<Vec<TodoItem>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .todos
            .values()
            .filter(|todo| todo.user_id == owner)
            .cloned()
            .collect())
    }

    fn find_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .todos
            .get(&id)
            .filter(|todo| todo.user_id == owner)
            .cloned())
    }

    fn insert_todo(&self, todo: NewTodo) -> Result<TodoItem, RepositoryError> {
        check_widths(&todo)?;
        check_schedule(todo.start_at_utc, todo.end_at_utc)?;
        let mut state = self.state()?;
        state.last_todo_id += 1;
        let item = TodoItem {
            id: state.last_todo_id,
            title: todo.title,
            description: todo.description,
            is_completed: todo.is_completed,
            priority: todo.priority,
            start_at_utc: todo.start_at_utc,
            end_at_utc: todo.end_at_utc,
            user_id: todo.user_id,
        };
        state.todos.insert(item.id, item.clone());
        Ok(item)
    }

    fn update_todo(
        &self,
        owner: &str,
        id: i32,
        changes: TodoChanges,
    ) -> Result<Option<TodoItem>, RepositoryError> {
        check_widths(&changes)?;
        check_schedule(changes.start_at_utc, changes.end_at_utc)?;
        let mut state = self.state()?;
        Ok(state.owned_mut(owner, id).map(|todo| {
            changes.apply_to(todo);
            todo.clone()
        }))
    }

    fn toggle_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError> {
        let mut state = self.state()?;
        Ok(state.owned_mut(owner, id).map(|todo| {
            todo.is_completed = !todo.is_completed;
            todo.clone()
        }))
    }

    fn delete_todo(&self, owner: &str, id: i32) -> Result<bool, RepositoryError> {
        let mut state = self.state()?;
        if state.owned_mut(owner, id).is_none() {
            return Ok(false);
        }
        Ok(state.todos.remove(&id).is_some())
    }
}

impl UserRepository for MemoryDatabase {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        check_widths(&user)?;
        let mut state = self.state()?;
        if state
            .users
            .values()
            .any(|existing| existing.normalized_email == user.normalized_email)
        {
            return Err(RepositoryError::Conflict(format!(
                "users_normalized_email_key: {}",
                user.normalized_email
            )));
        }
        if state.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!("users_pkey: {}", user.id)));
        }
        let user = User::from(user);
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn find_user_by_email(&self, normalized_email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .users
            .values()
            .find(|user| user.normalized_email == normalized_email)
            .cloned())
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state()?;
        Ok(state.users.get(id).cloned())
    }
}
