use async_graphql::{Context, Object, Result};

use crate::graphql::error::{current_user, filter_error};
use crate::graphql::filter::{sort_todos, TodoFilter, TodoSort};
use crate::models::todo::TodoItem;
use crate::service::TodoService;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The caller's todos, optionally filtered and ordered.
    async fn todos(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "where")] filter: Option<TodoFilter>,
        order: Option<Vec<TodoSort>>,
    ) -> Result<Vec<TodoItem>> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        let mut items = todos
            .list(&user.user_id)
            .await
            .map_err(|err| filter_error(ctx, err))?;
        if let Some(filter) = filter {
            items.retain(|todo| filter.matches(todo));
        }
        sort_todos(&mut items, order.as_deref().unwrap_or_default());
        Ok(items)
    }

    async fn todo_by_id(&self, ctx: &Context<'_>, id: i32) -> Result<Option<TodoItem>> {
        let user = current_user(ctx)?;
        let todos = ctx.data::<TodoService>()?;
        todos
            .get(&user.user_id, id)
            .await
            .map_err(|err| filter_error(ctx, err))
    }
}
