use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// What role a message plays in an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Call,
    Reply,
    Exception,
    Oneway,
}

/// A message travelling through the bound-handler pipeline
///
/// The payload is opaque here; only codecs look inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub service: String,
    pub method: String,
    pub kind: MessageKind,
    pub payload: Bytes,
    pub tags: HashMap<String, String>,
}

impl Message {
    pub fn new(
        service: impl Into<String>,
        method: impl Into<String>,
        kind: MessageKind,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            kind,
            payload: payload.into(),
            tags: HashMap::new(),
        }
    }

    /// Build a call message
    pub fn call(
        service: impl Into<String>,
        method: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self::new(service, method, MessageKind::Call, payload)
    }

    /// Build the reply for this message, echoing service and method
    pub fn reply(&self, payload: impl Into<Bytes>) -> Self {
        Self::new(
            self.service.clone(),
            self.method.clone(),
            MessageKind::Reply,
            payload,
        )
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }
}
