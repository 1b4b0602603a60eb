pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, is_in_memory, DbPool};
pub use repositories::{RepositoryError, SqlInvocationLog};
