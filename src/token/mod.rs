//! Access token lifecycle: authorize, validate, extend.

pub mod manager;
pub mod session;

pub use manager::{AuthorizationOutcome, TokenManager};
pub use session::SessionInfo;
