use async_graphql::{Context, ErrorExtensions};

use crate::auth::Identity;
use crate::error::AppError;

/// Decides how much of an internal failure a GraphQL client gets to see.
#[derive(Debug, Clone, Copy)]
pub struct ErrorFilter {
    pub expose_internal: bool,
}

impl ErrorFilter {
    pub fn filter(&self, err: AppError) -> async_graphql::Error {
        let code = match &err {
            AppError::Validation(_) | AppError::Rejected(_) => "BAD_USER_INPUT",
            AppError::TodoNotFound => "NOT_FOUND",
            AppError::Unauthorized | AppError::InvalidCredentials => "UNAUTHENTICATED",
            err if err.is_internal() => "INTERNAL_SERVER_ERROR",
            _ => "BAD_REQUEST",
        };
        let message = if err.is_internal() {
            tracing::error!(error = %err, "graphql resolver failed");
            if self.expose_internal {
                err.to_string()
            } else {
                err.client_message()
            }
        } else {
            err.client_message()
        };
        async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", code))
    }
}

pub(crate) fn filter_error(ctx: &Context<'_>, err: AppError) -> async_graphql::Error {
    let filter = ctx
        .data_opt::<ErrorFilter>()
        .copied()
        .unwrap_or(ErrorFilter {
            expose_internal: false,
        });
    filter.filter(err)
}

pub(crate) fn current_user<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Identity> {
    ctx.data_opt::<Identity>()
        .ok_or_else(|| filter_error(ctx, AppError::Unauthorized))
}
