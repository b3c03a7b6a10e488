//! Service descriptors and the call convention shared by every method
//!
//! Statically known and synthesized methods are invoked the same way: the
//! transport asks a [`MethodEntry`] for fresh argument/result containers,
//! fills the arguments, and awaits [`MethodEntry::call`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use constellation_core::CallContext;

use crate::codec::PayloadCodecKind;
use crate::error::Result;
use crate::unknown::{GenericArgs, GenericResult, UnknownServiceHandler};

pub mod registry;

pub use self::registry::{RegisteredService, ServiceRegistry, ServiceSearcher};

/// Argument container handed to a call adapter
pub enum CallArgs {
    Generic(GenericArgs),
    Typed(Box<dyn Any + Send>),
}

impl CallArgs {
    pub fn as_generic(&self) -> Option<&GenericArgs> {
        match self {
            Self::Generic(args) => Some(args),
            Self::Typed(_) => None,
        }
    }

    pub fn as_generic_mut(&mut self) -> Option<&mut GenericArgs> {
        match self {
            Self::Generic(args) => Some(args),
            Self::Typed(_) => None,
        }
    }

    /// Borrow a typed container as `T`
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        match self {
            Self::Typed(args) => args.downcast_mut(),
            Self::Generic(_) => None,
        }
    }
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic(args) => f.debug_tuple("Generic").field(args).finish(),
            Self::Typed(_) => f.write_str("Typed(..)"),
        }
    }
}

/// Result container filled by a call adapter
pub enum CallResult {
    Generic(GenericResult),
    Typed(Box<dyn Any + Send>),
}

impl CallResult {
    pub fn as_generic(&self) -> Option<&GenericResult> {
        match self {
            Self::Generic(result) => Some(result),
            Self::Typed(_) => None,
        }
    }

    pub fn as_generic_mut(&mut self) -> Option<&mut GenericResult> {
        match self {
            Self::Generic(result) => Some(result),
            Self::Typed(_) => None,
        }
    }

    pub fn into_generic(self) -> Option<GenericResult> {
        match self {
            Self::Generic(result) => Some(result),
            Self::Typed(_) => None,
        }
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        match self {
            Self::Typed(result) => result.downcast_mut(),
            Self::Generic(_) => None,
        }
    }
}

impl fmt::Debug for CallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic(result) => f.debug_tuple("Generic").field(result).finish(),
            Self::Typed(_) => f.write_str("Typed(..)"),
        }
    }
}

/// User implementation a method entry forwards to
#[derive(Clone)]
pub enum ServiceHandler {
    /// Catch-all for services and methods nobody registered
    Unknown(Arc<dyn UnknownServiceHandler>),
    /// Generated service implementation, recovered by downcast in its adapter
    Typed(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for ServiceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(_) => f.write_str("Unknown(..)"),
            Self::Typed(_) => f.write_str("Typed(..)"),
        }
    }
}

/// Invokes one method on a service handler
#[async_trait::async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(
        &self,
        ctx: &CallContext,
        handler: &ServiceHandler,
        args: &mut CallArgs,
        result: &mut CallResult,
    ) -> Result<()>;
}

/// Everything needed to invoke one method
#[derive(Clone)]
pub struct MethodEntry {
    handler: Arc<dyn MethodHandler>,
    new_args: fn() -> CallArgs,
    new_result: fn() -> CallResult,
    streaming: bool,
}

impl MethodEntry {
    pub fn new(
        handler: Arc<dyn MethodHandler>,
        new_args: fn() -> CallArgs,
        new_result: fn() -> CallResult,
        streaming: bool,
    ) -> Self {
        Self {
            handler,
            new_args,
            new_result,
            streaming,
        }
    }

    /// A fresh, empty argument container
    pub fn new_args(&self) -> CallArgs {
        (self.new_args)()
    }

    /// A fresh, empty result container
    pub fn new_result(&self) -> CallResult {
        (self.new_result)()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub async fn call(
        &self,
        ctx: &CallContext,
        handler: &ServiceHandler,
        args: &mut CallArgs,
        result: &mut CallResult,
    ) -> Result<()> {
        self.handler.call(ctx, handler, args, result).await
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

/// Metadata and method table of one service
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    service_name: String,
    payload_codec: PayloadCodecKind,
    methods: HashMap<String, MethodEntry>,
    extra: HashMap<String, String>,
}

impl ServiceDescriptor {
    pub fn new(service_name: impl Into<String>, payload_codec: PayloadCodecKind) -> Self {
        Self {
            service_name: service_name.into(),
            payload_codec,
            methods: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Add or replace a method entry
    pub fn with_method(mut self, name: impl Into<String>, entry: MethodEntry) -> Self {
        self.methods.insert(name.into(), entry);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn payload_codec(&self) -> PayloadCodecKind {
        self.payload_codec
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> &HashMap<String, MethodEntry> {
        &self.methods
    }

    pub fn extra(&self) -> &HashMap<String, String> {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.extra
    }
}
