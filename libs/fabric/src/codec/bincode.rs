use bytes::Bytes;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::message::Message;

/// Bincode envelope codec for whole messages
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &str {
        "bincode"
    }

    fn encode(&self, message: &Message) -> Result<Bytes> {
        bincode::serialize(message)
            .map(Bytes::from)
            .map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Message> {
        bincode::deserialize(bytes).map_err(|e| Error::Codec(e.to_string()))
    }
}
