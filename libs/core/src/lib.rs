//! Constellation Core - Shared primitives for every constellation crate
//!
//! Holds the framework-wide [`Error`] type and the per-call [`CallContext`]
//! that carries cancellation, deadline and metadata through handlers.

pub mod context;
pub mod error;

pub use context::CallContext;
pub use error::{Error, Result};
