use std::sync::Arc;

use constellation_core::CallContext;

use crate::error::Result;
use crate::message::Message;
use crate::option::{ClientOption, ServerOption};
use crate::transport::Transport;

/// Reads and writes whole messages on one connection
#[async_trait::async_trait]
pub trait TransHandler: Send + Sync {
    async fn read(&self, ctx: &mut CallContext, conn: &mut dyn Transport) -> Result<Message>;

    async fn write(
        &self,
        ctx: &mut CallContext,
        conn: &mut dyn Transport,
        message: &Message,
    ) -> Result<()>;
}

pub trait ClientTransHandlerFactory: Send + Sync {
    fn new_handler(&self, option: &ClientOption) -> Result<Arc<dyn TransHandler>>;
}

pub trait ServerTransHandlerFactory: Send + Sync {
    fn new_handler(&self, option: &ServerOption) -> Result<Arc<dyn TransHandler>>;
}

/// A running server accept loop
#[async_trait::async_trait]
pub trait TransServer: Send + Sync {
    async fn serve(&self) -> Result<()>;

    async fn shutdown(&self) -> Result<()>;
}

pub trait TransServerFactory: Send + Sync {
    fn new_server(
        &self,
        option: &ServerOption,
        handler: Arc<dyn TransHandler>,
    ) -> Result<Box<dyn TransServer>>;
}
