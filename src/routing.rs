use axum::Router;

use crate::controllers::{self, AppState};

pub use axum::routing::{delete, get, patch, post, put};

/// Assemble the API surface under `/api`.
pub fn build_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", controllers::auth::routes())
        .nest("/api/classrooms", controllers::classrooms::routes())
        .nest("/api/assignments", controllers::assignments::routes())
        .nest("/api/materials", controllers::materials::routes())
        .nest("/api/notifications", controllers::notifications::routes())
        .nest("/api/reports", controllers::reports::routes())
}
