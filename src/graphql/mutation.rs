use async_graphql::{Context, InputObject, Object, Result};
use chrono::{DateTime, Utc};

use crate::graphql::error::{current_user, filter_error};
use crate::models::schedule::ScheduleTime;
use crate::models::todo::{CreateTodo, Priority, TodoItem, UpdateTodo};
use crate::service::TodoService;

#[derive(InputObject, Debug, Clone)]
pub struct CreateTodoInput {
    pub title: String,
    pub description: Option<String>,
    #[graphql(default)]
    pub priority: Priority,
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
}

impl From<CreateTodoInput> for CreateTodo {
    fn from(input: CreateTodoInput) -> Self {
        CreateTodo {
            title: input.title,
            description: input.description,
            priority: input.priority,
            start_at_utc: input.start_at_utc.map(ScheduleTime::from),
            end_at_utc: input.end_at_utc.map(ScheduleTime::from),
        }
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct UpdateTodoInput {
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub description: Option<String>,
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
}

impl From<UpdateTodoInput> for UpdateTodo {
    fn from(input: UpdateTodoInput) -> Self {
        UpdateTodo {
            title: input.title,
            is_completed: input.is_completed,
            priority: input.priority,
            description: input.description,
            start_at_utc: input.start_at_utc.map(ScheduleTime::from),
            end_at_utc: input.end_at_utc.map(ScheduleTime::from),
        }
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_todo(&self, ctx: &Context<'_>, input: CreateTodoInput) -> Result<TodoItem> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        todos
            .create(&user.user_id, input.into())
            .await
            .map_err(|err| filter_error(ctx, err))
    }

    async fn update_todo(
        &self,
        ctx: &Context<'_>,
        id: i32,
        input: UpdateTodoInput,
    ) -> Result<TodoItem> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        todos
            .update(&user.user_id, id, input.into())
            .await
            .map_err(|err| filter_error(ctx, err))
    }

    async fn toggle_todo(&self, ctx: &Context<'_>, id: i32) -> Result<TodoItem> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        todos
            .toggle(&user.user_id, id)
            .await
            .map_err(|err| filter_error(ctx, err))
    }

    /// `true` once the todo is gone.
    async fn delete_todo(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        todos
            .delete(&user.user_id, id)
            .await
            .map(|()| true)
            .map_err(|err| filter_error(ctx, err))
    }
}
