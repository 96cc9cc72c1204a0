mod auth_service;
pub mod password;

pub use auth_service::{AccountDirectory, AuthService};
