pub mod jwt;
pub mod password;

pub use jwt::{create_token, validate_token, Claims};
pub use password::{hash_password, verify_password};
