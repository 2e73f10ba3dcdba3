use std::sync::Arc;

use actix_web::web;

use crate::error::AppError;
use crate::repository::{RepositoryError, Store};

pub mod accounts;
pub mod todos;

pub use accounts::AccountService;
pub use todos::TodoService;

/// Runs a store call on actix's blocking pool.
async fn blocking<T, F>(store: &Arc<dyn Store>, call: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Store) -> Result<T, RepositoryError> + Send + 'static,
{
    let store = Arc::clone(store);
    Ok(web::block(move || call(store.as_ref())).await??)
}
