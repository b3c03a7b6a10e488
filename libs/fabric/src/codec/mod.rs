use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

pub mod bincode;

pub use self::bincode::BincodeCodec;

/// Payload serialization family a service speaks
///
/// Threaded through service descriptors so the transport can pick framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadCodecKind {
    Thrift,
    Protobuf,
    Hessian2,
}

impl PayloadCodecKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Thrift => "thrift",
            Self::Protobuf => "protobuf",
            Self::Hessian2 => "hessian2",
        }
    }
}

impl fmt::Display for PayloadCodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Codec trait for framing whole messages on the wire
pub trait Codec: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Encode a message into bytes
    fn encode(&self, message: &Message) -> Result<Bytes>;

    /// Decode bytes into a message
    fn decode(&self, bytes: &[u8]) -> Result<Message>;
}

/// Codec for the payload carried inside a message
///
/// Opaque to this crate apart from its kind.
pub trait PayloadCodec: Send + Sync {
    fn kind(&self) -> PayloadCodecKind;
}
