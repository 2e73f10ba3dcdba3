use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Integer;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::schedule::ScheduleTime;
use crate::repository::schema::todos;

/// Stored as an integer so that ordering by priority is meaningful.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    ToSchema,
    async_graphql::Enum,
)]
#[diesel(sql_type = Integer)]
#[graphql(name = "TodoPriority")]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl TryFrom<i32> for Priority {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(format!("unrecognized priority {other}")),
        }
    }
}

impl ToSql<Integer, Pg> for Priority {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let value: &'static i32 = match self {
            Priority::Low => &1,
            Priority::Medium => &2,
            Priority::High => &3,
        };
        <i32 as ToSql<Integer, Pg>>::to_sql(value, out)
    }
}

impl FromSql<Integer, Pg> for Priority {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <i32 as FromSql<Integer, Pg>>::from_sql(bytes)?;
        Ok(Priority::try_from(value)?)
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Queryable,
    Selectable,
    Identifiable,
    Serialize,
    Deserialize,
    ToSchema,
    async_graphql::SimpleObject,
)]
#[diesel(table_name = todos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
    #[serde(skip)]
    #[graphql(skip)]
    pub user_id: String,
}

#[derive(Debug, Clone, Insertable, Validate)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
    pub user_id: String,
}

#[derive(Debug, Clone, AsChangeset, Validate)]
#[diesel(table_name = todos, treat_none_as_null = true)]
pub struct TodoChanges {
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub start_at_utc: Option<DateTime<Utc>>,
    pub end_at_utc: Option<DateTime<Utc>>,
}

impl TodoChanges {
    pub fn apply_to(&self, todo: &mut TodoItem) {
        todo.title.clone_from(&self.title);
        todo.description.clone_from(&self.description);
        todo.is_completed = self.is_completed;
        todo.priority = self.priority;
        todo.start_at_utc = self.start_at_utc;
        todo.end_at_utc = self.end_at_utc;
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
    #[validate(length(max = 1000, message = "Description must be 1000 characters or fewer."))]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_at_utc: Option<ScheduleTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_at_utc: Option<ScheduleTime>,
}

impl CreateTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[serde(default)]
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
    #[validate(length(max = 1000, message = "Description must be 1000 characters or fewer."))]
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_at_utc: Option<ScheduleTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_at_utc: Option<ScheduleTime>,
}
