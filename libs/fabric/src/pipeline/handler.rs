use std::fmt;
use std::sync::Arc;

use constellation_core::CallContext;

use crate::error::Result;
use crate::message::Message;

/// Processes messages arriving at this endpoint
///
/// Runs in pipeline order before the call reaches dispatch.
#[async_trait::async_trait]
pub trait InboundHandler: Send + Sync {
    /// Label used in logs and diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// A connection became active
    async fn on_active(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }

    /// A connection went away
    async fn on_inactive(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }

    /// Handle a received message
    async fn on_message(&self, ctx: &mut CallContext, message: &mut Message) -> Result<()>;
}

/// Processes messages departing this endpoint
#[async_trait::async_trait]
pub trait OutboundHandler: Send + Sync {
    /// Label used in logs and diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handle a message about to be sent
    async fn write(&self, ctx: &mut CallContext, message: &mut Message) -> Result<()>;
}

/// Handler taking part in both directions
///
/// Implemented for every type that is both inbound and outbound.
pub trait DuplexHandler: InboundHandler + OutboundHandler {}

impl<T> DuplexHandler for T where T: InboundHandler + OutboundHandler {}

/// Registration face of a handler
///
/// Types implementing both [`InboundHandler`] and [`OutboundHandler`] get
/// this trait for free and always register as duplex. Single-direction
/// handlers implement it by hand and return `Some(self)` from the matching
/// accessor. Returning `None` from both is a wiring bug and makes insertion
/// panic.
pub trait BoundHandler: Send + Sync + 'static {
    fn into_inbound(self: Arc<Self>) -> Option<Arc<dyn InboundHandler>> {
        None
    }

    fn into_outbound(self: Arc<Self>) -> Option<Arc<dyn OutboundHandler>> {
        None
    }

    /// Label used in diagnostics
    fn handler_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T> BoundHandler for T
where
    T: InboundHandler + OutboundHandler + 'static,
{
    fn into_inbound(self: Arc<Self>) -> Option<Arc<dyn InboundHandler>> {
        Some(self)
    }

    fn into_outbound(self: Arc<Self>) -> Option<Arc<dyn OutboundHandler>> {
        Some(self)
    }
}

/// Which pipeline sequences a handler joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
    Duplex,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Duplex => "duplex",
        };
        f.write_str(name)
    }
}

/// A handler split into the views each sequence stores
pub enum Classified {
    Inbound(Arc<dyn InboundHandler>),
    Outbound(Arc<dyn OutboundHandler>),
    Duplex(Arc<dyn InboundHandler>, Arc<dyn OutboundHandler>),
}

impl Classified {
    /// Split `handler` by capability
    ///
    /// # Panics
    ///
    /// Panics if the handler is neither inbound nor outbound.
    pub fn of(handler: Arc<dyn BoundHandler>) -> Self {
        let inbound = Arc::clone(&handler).into_inbound();
        let outbound = Arc::clone(&handler).into_outbound();
        match (inbound, outbound) {
            (Some(inbound), Some(outbound)) => Self::Duplex(inbound, outbound),
            (Some(inbound), None) => Self::Inbound(inbound),
            (None, Some(outbound)) => Self::Outbound(outbound),
            (None, None) => {
                let name = handler.handler_name();
                tracing::error!(handler = name, "bound handler has no capability");
                panic!(
                    "invalid BoundHandler `{name}`: must implement InboundHandler or OutboundHandler"
                );
            }
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Inbound(_) => Direction::Inbound,
            Self::Outbound(_) => Direction::Outbound,
            Self::Duplex(..) => Direction::Duplex,
        }
    }
}

/// Classify a handler without registering it
///
/// # Panics
///
/// Panics if the handler is neither inbound nor outbound.
pub fn classify(handler: &Arc<dyn BoundHandler>) -> Direction {
    Classified::of(Arc::clone(handler)).direction()
}
