pub mod assignments;
pub mod auth;
pub mod classrooms;
pub mod materials;
pub mod notifications;
pub mod reports;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;

/// Shared state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
}
