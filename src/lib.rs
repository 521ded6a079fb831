pub mod app;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod openapi;
pub mod reports;
pub mod response;
pub mod routing;
pub mod testing;
pub mod uploads;

pub use app::App;
pub use config::Config;
pub use error::AppError;
pub use response::ApiResponse;
pub use testing::{TestApp, TestClient, TestResponse};
