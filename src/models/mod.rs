pub mod schedule;
pub mod todo;
pub mod user;
