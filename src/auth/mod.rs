pub mod auth;
pub mod authentication;
pub mod session;
pub mod user;

pub use auth::*;
pub use authentication::*;
pub use session::*;
pub use user::*;
