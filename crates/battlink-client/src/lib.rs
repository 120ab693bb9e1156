//! Controller-side request/response session.
//!
//! Drives the "send command, await matching validated frame, retry until
//! matched" loop over any [`battlink_transport::Transport`]. Responses are
//! correlated by message id alone, so the session allows at most one
//! outstanding request — enforced structurally by the exclusive borrow each
//! exchange takes.

pub mod error;
pub mod retry;
pub mod session;

pub use error::{ClientError, Result};
pub use retry::RetryPolicy;
pub use session::Session;
