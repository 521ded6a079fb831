mod auth_user;
mod json;

pub use auth_user::AuthUser;
pub use json::Json;
