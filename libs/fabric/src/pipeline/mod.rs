//! Ordered, direction-aware handler chain shared by client and server
//!
//! Handlers are inserted once while the transport is configured and only
//! read afterwards, so the sequences need no locking while serving.

use std::sync::Arc;

use constellation_core::CallContext;

use crate::error::Result;
use crate::message::Message;

pub mod handler;
pub mod stream;

pub use self::handler::{
    classify, BoundHandler, Classified, Direction, DuplexHandler, InboundHandler, OutboundHandler,
};
pub use self::stream::StreamingMetaHandler;

/// Inbound and outbound handler sequences plus streaming metadata handlers
#[derive(Default, Clone)]
pub struct Pipeline {
    inbound: Vec<Arc<dyn InboundHandler>>,
    outbound: Vec<Arc<dyn OutboundHandler>>,
    streaming_meta: Vec<Arc<dyn StreamingMetaHandler>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a handler ahead of every handler already in its direction(s)
    ///
    /// # Panics
    ///
    /// Panics if the handler is neither inbound nor outbound.
    pub fn insert_first(&mut self, handler: Arc<dyn BoundHandler>) {
        let classified = Classified::of(handler);
        tracing::trace!(direction = %classified.direction(), "prepending bound handler");
        match classified {
            Classified::Inbound(inbound) => self.inbound.insert(0, inbound),
            Classified::Outbound(outbound) => self.outbound.insert(0, outbound),
            Classified::Duplex(inbound, outbound) => {
                self.inbound.insert(0, inbound);
                self.outbound.insert(0, outbound);
            }
        }
    }

    /// Put a handler behind every handler already in its direction(s)
    ///
    /// # Panics
    ///
    /// Panics if the handler is neither inbound nor outbound.
    pub fn insert_last(&mut self, handler: Arc<dyn BoundHandler>) {
        let classified = Classified::of(handler);
        tracing::trace!(direction = %classified.direction(), "appending bound handler");
        match classified {
            Classified::Inbound(inbound) => self.inbound.push(inbound),
            Classified::Outbound(outbound) => self.outbound.push(outbound),
            Classified::Duplex(inbound, outbound) => {
                self.inbound.push(inbound);
                self.outbound.push(outbound);
            }
        }
    }

    pub fn add_streaming_meta_handler(&mut self, handler: Arc<dyn StreamingMetaHandler>) {
        self.streaming_meta.push(handler);
    }

    pub fn inbounds(&self) -> &[Arc<dyn InboundHandler>] {
        &self.inbound
    }

    pub fn outbounds(&self) -> &[Arc<dyn OutboundHandler>] {
        &self.outbound
    }

    pub fn streaming_meta_handlers(&self) -> &[Arc<dyn StreamingMetaHandler>] {
        &self.streaming_meta
    }

    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty() && self.streaming_meta.is_empty()
    }

    /// Notify inbound handlers that a connection became active
    pub async fn run_active(&self, ctx: &mut CallContext) -> Result<()> {
        for handler in &self.inbound {
            handler.on_active(ctx).await?;
        }
        Ok(())
    }

    /// Notify inbound handlers that a connection went away
    pub async fn run_inactive(&self, ctx: &mut CallContext) -> Result<()> {
        for handler in &self.inbound {
            handler.on_inactive(ctx).await?;
        }
        Ok(())
    }

    /// Run a received message through the inbound sequence
    ///
    /// Stops at the first failing handler and returns its error.
    pub async fn run_inbound(&self, ctx: &mut CallContext, message: &mut Message) -> Result<()> {
        for handler in &self.inbound {
            if let Err(e) = handler.on_message(ctx, message).await {
                tracing::debug!(handler = handler.name(), error = %e, "inbound handler failed");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run a departing message through the outbound sequence
    ///
    /// Stops at the first failing handler and returns its error.
    pub async fn run_outbound(&self, ctx: &mut CallContext, message: &mut Message) -> Result<()> {
        for handler in &self.outbound {
            if let Err(e) = handler.write(ctx, message).await {
                tracing::debug!(handler = handler.name(), error = %e, "outbound handler failed");
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn run_connect_stream(&self, ctx: &mut CallContext) -> Result<()> {
        for handler in &self.streaming_meta {
            handler.on_connect_stream(ctx)?;
        }
        Ok(())
    }

    pub fn run_read_stream(&self, ctx: &mut CallContext) -> Result<()> {
        for handler in &self.streaming_meta {
            handler.on_read_stream(ctx)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "inbound",
                &self.inbound.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field(
                "outbound",
                &self.outbound.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("streaming_meta", &self.streaming_meta.len())
            .finish()
    }
}
