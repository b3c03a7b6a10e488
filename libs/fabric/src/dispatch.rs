//! Routes calls to registered methods or to the unknown-service fallback

use std::sync::Arc;

use bytes::Bytes;
use constellation_core::CallContext;

use crate::codec::PayloadCodecKind;
use crate::error::{Error, Result};
use crate::option::ServerOption;
use crate::service::{
    CallArgs, CallResult, MethodEntry, RegisteredService, ServiceDescriptor, ServiceHandler,
    ServiceSearcher,
};
use crate::unknown::{fallback_descriptor, GenericArgs, UnknownServiceHandler, UNKNOWN_METHOD};

/// Resolves `(service, method)` pairs and invokes the matching entry
///
/// Holds only read-only state, so one dispatcher serves any number of
/// concurrent calls.
#[derive(Clone)]
pub struct Dispatcher {
    searcher: Arc<dyn ServiceSearcher>,
    fallback: Option<RegisteredService>,
}

impl Dispatcher {
    /// Dispatcher without a fallback; misses surface as not-found errors
    pub fn new(searcher: Arc<dyn ServiceSearcher>) -> Self {
        Self {
            searcher,
            fallback: None,
        }
    }

    /// Route misses to `handler` through a synthesized fallback descriptor
    pub fn with_unknown_service(
        self,
        handler: Arc<dyn UnknownServiceHandler>,
        codec: PayloadCodecKind,
    ) -> Self {
        self.with_fallback(Arc::new(fallback_descriptor(codec)), handler)
    }

    fn with_fallback(
        mut self,
        descriptor: Arc<ServiceDescriptor>,
        handler: Arc<dyn UnknownServiceHandler>,
    ) -> Self {
        self.fallback = Some(RegisteredService {
            descriptor,
            handler: ServiceHandler::Unknown(handler),
        });
        self
    }

    /// Build the dispatcher a server described by `option` should use
    pub fn from_server_option(option: &ServerOption) -> Result<Self> {
        let searcher = option
            .service_searcher()
            .cloned()
            .ok_or_else(|| Error::config("server option has no service searcher"))?;
        let dispatcher = Self::new(searcher);
        match (option.unknown_service(), option.unknown_service_handler()) {
            (Some(descriptor), Some(handler)) => {
                Ok(dispatcher.with_fallback(Arc::clone(descriptor), Arc::clone(handler)))
            }
            _ => Ok(dispatcher),
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Find the entry that serves `service.method`
    pub fn resolve(&self, service: &str, method: &str) -> Result<Resolution> {
        let found = self.searcher.lookup(service, method);
        if let Some(registered) = &found {
            if let Some(entry) = registered.descriptor.method(method) {
                return Ok(Resolution {
                    descriptor: Arc::clone(&registered.descriptor),
                    entry: entry.clone(),
                    handler: registered.handler.clone(),
                    service: service.to_string(),
                    method: method.to_string(),
                    fallback: false,
                });
            }
        }

        if let Some(fallback) = &self.fallback {
            let entry = fallback.descriptor.method(UNKNOWN_METHOD).ok_or_else(|| {
                Error::internal("fallback descriptor has no unknown-method entry")
            })?;
            tracing::debug!(service, method, "routing call to unknown service handler");
            return Ok(Resolution {
                descriptor: Arc::clone(&fallback.descriptor),
                entry: entry.clone(),
                handler: fallback.handler.clone(),
                service: service.to_string(),
                method: method.to_string(),
                fallback: true,
            });
        }

        match found {
            Some(_) => Err(Error::MethodNotFound {
                service: service.to_string(),
                method: method.to_string(),
            }),
            None => Err(Error::ServiceNotFound {
                service: service.to_string(),
            }),
        }
    }

    /// Invoke `ctx.service().ctx.method()` with raw request bytes
    ///
    /// The target must accept generic containers, which the fallback always
    /// does. The context is handed to the handler untouched; no timeout is
    /// enforced here.
    pub async fn invoke_raw(&self, ctx: &CallContext, request: Bytes) -> Result<Bytes> {
        let resolution = self.resolve(ctx.service(), ctx.method())?;
        let mut args = resolution.new_args();
        let generic = args.as_generic_mut().ok_or_else(|| {
            Error::internal(format!(
                "{}.{} does not accept raw payloads",
                ctx.service(),
                ctx.method()
            ))
        })?;
        *generic = GenericArgs::new(ctx.service(), ctx.method(), request);

        let result = resolution.call(ctx, &mut args).await?;
        result
            .into_generic()
            .map(|result| result.payload)
            .ok_or_else(|| Error::internal("generic call produced a typed result"))
    }
}

/// The entry chosen for one call
#[derive(Debug, Clone)]
pub struct Resolution {
    descriptor: Arc<ServiceDescriptor>,
    entry: MethodEntry,
    handler: ServiceHandler,
    service: String,
    method: String,
    fallback: bool,
}

impl Resolution {
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn entry(&self) -> &MethodEntry {
        &self.entry
    }

    /// Whether the call goes to the unknown-service handler
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn new_args(&self) -> CallArgs {
        self.entry.new_args()
    }

    pub fn new_result(&self) -> CallResult {
        self.entry.new_result()
    }

    /// Invoke the entry with `args`, returning the filled result container
    ///
    /// Errors from the handler are returned as-is.
    pub async fn call(&self, ctx: &CallContext, args: &mut CallArgs) -> Result<CallResult> {
        let mut result = self.new_result();
        tracing::trace!(
            service = %self.service,
            method = %self.method,
            fallback = self.fallback,
            "invoking method"
        );
        self.entry
            .call(ctx, &self.handler, args, &mut result)
            .await?;
        Ok(result)
    }
}
