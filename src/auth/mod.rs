pub mod jwt;
pub mod password;

pub use jwt::{bearer_token, JwtKeys};
