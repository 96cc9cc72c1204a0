mod session;
mod user;

pub use session::{session_expiry, Session};
pub use user::User;
