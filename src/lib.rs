//! Hoaxify
//!
//! Account backend for the Hoaxify social app: registration with
//! email-gated activation, opaque session tokens, self-service password
//! reset, and attachment uploads with garbage collection of orphans.

pub mod account;
pub mod api;
pub mod attachment;
pub mod config;
pub mod context;
pub mod credential;
pub mod db;
pub mod error;
pub mod file_store;
pub mod jobs;
pub mod mailer;
pub mod server;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::AppContext;
pub use error::{HoaxError, HoaxResult};
