use std::sync::Arc;

use validator::Validate;

use crate::cache::{OutputCache, TODOS_TAG};
use crate::error::AppError;
use crate::models::schedule::Schedule;
use crate::models::todo::{CreateTodo, NewTodo, TodoChanges, TodoItem, UpdateTodo};
use crate::repository::Store;
use crate::service::blocking;

/// The todo operations behind both the REST and the GraphQL surface.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn Store>,
    cache: OutputCache,
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required.".to_string()));
    }
    Ok(title.to_string())
}

impl TodoService {
    pub fn new(store: Arc<dyn Store>, cache: OutputCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<TodoItem>, AppError> {
        let owner = owner.to_string();
        blocking(&self.store, move |store| store.list_todos(&owner)).await
    }

    pub async fn get(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, AppError> {
        let owner = owner.to_string();
        blocking(&self.store, move |store| store.find_todo(&owner, id)).await
    }

    pub async fn create(&self, owner: &str, input: CreateTodo) -> Result<TodoItem, AppError> {
        input.validate()?;
        let schedule = Schedule::parse(input.start_at_utc, input.end_at_utc)?;
        let new_todo = NewTodo {
            title: validate_title(&input.title)?,
            description: input.description.unwrap_or_default(),
            is_completed: false,
            priority: input.priority,
            start_at_utc: schedule.start_at_utc,
            end_at_utc: schedule.end_at_utc,
            user_id: owner.to_string(),
        };
        let todo = blocking(&self.store, move |store| store.insert_todo(new_todo)).await?;
        self.cache.evict_by_tag(TODOS_TAG);
        tracing::info!(todo_id = todo.id, user_id = owner, "created todo");
        Ok(todo)
    }

    pub async fn update(
        &self,
        owner: &str,
        id: i32,
        input: UpdateTodo,
    ) -> Result<TodoItem, AppError> {
        if self.get(owner, id).await?.is_none() {
            return Err(AppError::TodoNotFound);
        }
        input.validate()?;
        let schedule = Schedule::parse(input.start_at_utc, input.end_at_utc)?;
        let changes = TodoChanges {
            title: validate_title(&input.title)?,
            description: input.description.unwrap_or_default(),
            is_completed: input.is_completed,
            priority: input.priority,
            start_at_utc: schedule.start_at_utc,
            end_at_utc: schedule.end_at_utc,
        };
        let owner_id = owner.to_string();
        let todo = blocking(&self.store, move |store| store.update_todo(&owner_id, id, changes))
            .await?
            .ok_or(AppError::TodoNotFound)?;
        self.cache.evict_by_tag(TODOS_TAG);
        tracing::info!(todo_id = id, user_id = owner, "updated todo");
        Ok(todo)
    }

    pub async fn toggle(&self, owner: &str, id: i32) -> Result<TodoItem, AppError> {
        let owner_id = owner.to_string();
        let todo = blocking(&self.store, move |store| store.toggle_todo(&owner_id, id))
            .await?
            .ok_or(AppError::TodoNotFound)?;
        self.cache.evict_by_tag(TODOS_TAG);
        tracing::info!(todo_id = id, user_id = owner, completed = todo.is_completed, "toggled todo");
        Ok(todo)
    }

    pub async fn delete(&self, owner: &str, id: i32) -> Result<(), AppError> {
        let owner_id = owner.to_string();
        let deleted = blocking(&self.store, move |store| store.delete_todo(&owner_id, id)).await?;
        if !deleted {
            return Err(AppError::TodoNotFound);
        }
        self.cache.evict_by_tag(TODOS_TAG);
        tracing::info!(todo_id = id, user_id = owner, "deleted todo");
        Ok(())
    }
}
