use std::thread;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::models::todo::{NewTodo, TodoChanges, TodoItem};
use crate::models::user::{NewUser, User};
use crate::repository::schema::{todos, users};
use crate::repository::{check_widths, RepositoryError, TodoRepository, UserRepository};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MIGRATION_ATTEMPTS: u32 = 5;
const MIGRATION_RETRY_DELAY: Duration = Duration::from_secs(2);

type DBPool = r2d2::Pool<ConnectionManager<PgConnection>>;
type DBConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DBPool,
}

impl Database {
    /// Builds the pool and brings the schema up to date.
    ///
    /// Blocks; the database may still be starting, so migration is retried.
    pub fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .connection_timeout(Duration::from_secs(5))
            .build_unchecked(manager);
        let database = Database { pool };
        database.migrate()?;
        Ok(database)
    }

    fn migrate(&self) -> Result<(), RepositoryError> {
        let mut attempt = 1;
        loop {
            match self.run_pending_migrations() {
                Ok(applied) => {
                    tracing::info!(applied, "database schema is up to date");
                    return Ok(());
                }
                Err(err) if attempt < MIGRATION_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "database not ready, retrying migrations");
                    thread::sleep(MIGRATION_RETRY_DELAY);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn run_pending_migrations(&self) -> Result<usize, RepositoryError> {
        let mut conn = self.connection()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|applied| applied.len())
            .map_err(|e| RepositoryError::Migration(e.to_string()))
    }

    fn connection(&self) -> Result<DBConnection, RepositoryError> {
        self.pool
            .get()
            .map_err(|e| RepositoryError::Pool(e.to_string()))
    }
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepositoryError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation,
                info,
            ) => RepositoryError::Constraint(info.message().to_string()),
            other => RepositoryError::Query(other.to_string()),
        }
    }
}

impl TodoRepository for Database {
    fn list_todos(&self, owner: &str) -> Result<Vec<TodoItem>, RepositoryError> {
        let mut conn = self.connection()?;
        let items = todos::table
            .filter(todos::user_id.eq(owner))
            .order(todos::id.asc())
            .select(TodoItem::as_select())
            .load(&mut conn)?;
        Ok(items)
    }

    fn find_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError> {
        let mut conn = self.connection()?;
        let item = todos::table
            .find(id)
            .filter(todos::user_id.eq(owner))
            .select(TodoItem::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(item)
    }

    fn insert_todo(&self, todo: NewTodo) -> Result<TodoItem, RepositoryError> {
        check_widths(&todo)?;
        let mut conn = self.connection()?;
        let item = diesel::insert_into(todos::table)
            .values(&todo)
            .returning(TodoItem::as_returning())
            .get_result(&mut conn)?;
        Ok(item)
    }

    fn update_todo(
        &self,
        owner: &str,
        id: i32,
        changes: TodoChanges,
    ) -> Result<Option<TodoItem>, RepositoryError> {
        check_widths(&changes)?;
        let mut conn = self.connection()?;
        let item = diesel::update(todos::table.find(id).filter(todos::user_id.eq(owner)))
            .set(&changes)
            .returning(TodoItem::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(item)
    }

    fn toggle_todo(&self, owner: &str, id: i32) -> Result<Option<TodoItem>, RepositoryError> {
        let mut conn = self.connection()?;
        let item = diesel::update(todos::table.find(id).filter(todos::user_id.eq(owner)))
            .set(todos::is_completed.eq(diesel::dsl::not(todos::is_completed)))
            .returning(TodoItem::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(item)
    }

    fn delete_todo(&self, owner: &str, id: i32) -> Result<bool, RepositoryError> {
        let mut conn = self.connection()?;
        let count = diesel::delete(todos::table.find(id).filter(todos::user_id.eq(owner)))
            .execute(&mut conn)?;
        Ok(count > 0)
    }
}

impl UserRepository for Database {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        check_widths(&user)?;
        let mut conn = self.connection()?;
        let user = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;
        Ok(user)
    }

    fn find_user_by_email(&self, normalized_email: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;
        let user = users::table
            .filter(users::normalized_email.eq(normalized_email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection()?;
        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }
}
