//! Constellation Fabric - Transport core shared by clients and servers
//!
//! Provides the bound-handler pipeline that attaches cross-cutting
//! behavior to every inbound and outbound message, the option aggregates
//! transports are configured with, and a dispatcher that answers calls for
//! services the server has no compiled definition for.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use constellation_core::{CallContext, Result};
//! use constellation_fabric::dispatch::Dispatcher;
//! use constellation_fabric::option::ServerOption;
//! use constellation_fabric::service::ServiceRegistry;
//! use constellation_fabric::unknown::UnknownServiceHandler;
//!
//! struct Proxy;
//!
//! #[async_trait::async_trait]
//! impl UnknownServiceHandler for Proxy {
//!     async fn handle(
//!         &self,
//!         _ctx: &CallContext,
//!         _service: &str,
//!         _method: &str,
//!         request: Bytes,
//!     ) -> Result<Bytes> {
//!         Ok(request)
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let option = ServerOption::builder()
//!     .service_searcher(Arc::new(ServiceRegistry::new()))
//!     .unknown_service_handler(Arc::new(Proxy))
//!     .build()?;
//!
//! let dispatcher = Dispatcher::from_server_option(&option)?;
//! let ctx = CallContext::new("Inventory", "list");
//! let _response = dispatcher.invoke_raw(&ctx, Bytes::from_static(b"ping")).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod observe;
pub mod option;
pub mod pipeline;
pub mod service;
pub mod transport;
pub mod unknown;

// Re-exports for convenience
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use message::{Message, MessageKind};
pub use option::{ClientOption, ServerOption};
pub use pipeline::{BoundHandler, Direction, Pipeline};
