use constellation_core::CallContext;

use crate::error::Result;

/// Exchanges metadata when a stream is opened or read
///
/// Kept apart from the inbound/outbound sequences; runs in registration order.
pub trait StreamingMetaHandler: Send + Sync {
    /// Called on the client before a stream is established
    fn on_connect_stream(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }

    /// Called on the server when a stream's headers are read
    fn on_read_stream(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }
}
