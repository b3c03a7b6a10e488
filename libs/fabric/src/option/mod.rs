//! Configuration aggregates owned by client and server transports
//!
//! Both aggregates compose one [`Pipeline`](crate::pipeline::Pipeline) and
//! forward the insertion API to it. They are filled in once while the
//! transport starts and only read while it serves.

pub mod client;
pub mod server;

pub use self::client::{ClientOption, ClientOptionBuilder};
pub use self::server::{InitCallContext, ServerOption, ServerOptionBuilder, ServerTimeouts};
