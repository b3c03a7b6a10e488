//! Fallback for calls to services and methods nobody registered
//!
//! [`synthesize`] builds a one-method [`ServiceDescriptor`] whose adapter
//! hands the raw request bytes to an [`UnknownServiceHandler`] and boxes the
//! returned bytes as the result. The adapter adds no policy: handler errors
//! come back exactly as returned.

use std::sync::Arc;

use bytes::Bytes;
use constellation_core::CallContext;

use crate::codec::PayloadCodecKind;
use crate::error::{Error, Result};
use crate::service::{
    CallArgs, CallResult, MethodEntry, MethodHandler, ServiceDescriptor, ServiceHandler,
};

/// Service name under which the fallback descriptor is registered
pub const UNKNOWN_SERVICE: &str = "$UnknownService";

/// Method name under which the fallback descriptor is registered
pub const UNKNOWN_METHOD: &str = "$UnknownMethod";

/// Catch-all invoked with raw bytes for any unknown service or method
///
/// Called concurrently from many calls; implementations synchronize their
/// own state.
#[async_trait::async_trait]
pub trait UnknownServiceHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &CallContext,
        service: &str,
        method: &str,
        request: Bytes,
    ) -> Result<Bytes>;
}

/// Arguments of one unknown-service call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericArgs {
    pub request: Bytes,
    pub method: String,
    pub service_name: String,
}

impl GenericArgs {
    pub fn new(
        service_name: impl Into<String>,
        method: impl Into<String>,
        request: impl Into<Bytes>,
    ) -> Self {
        Self {
            request: request.into(),
            method: method.into(),
            service_name: service_name.into(),
        }
    }
}

/// Result of one unknown-service call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericResult {
    pub payload: Bytes,
    pub method: String,
    pub service_name: String,
}

/// Build a descriptor with a single non-streaming entry keyed by `method`
pub fn synthesize(
    codec: PayloadCodecKind,
    service: impl Into<String>,
    method: impl Into<String>,
) -> ServiceDescriptor {
    let entry = MethodEntry::new(
        Arc::new(GenericCallAdapter),
        new_generic_args,
        new_generic_result,
        false,
    );
    ServiceDescriptor::new(service, codec).with_method(method, entry)
}

/// The descriptor registered for every unknown call
///
/// Keyed by the sentinel names; the real names travel in [`GenericArgs`].
pub fn fallback_descriptor(codec: PayloadCodecKind) -> ServiceDescriptor {
    synthesize(codec, UNKNOWN_SERVICE, UNKNOWN_METHOD)
}

fn new_generic_args() -> CallArgs {
    CallArgs::Generic(GenericArgs::default())
}

fn new_generic_result() -> CallResult {
    CallResult::Generic(GenericResult::default())
}

struct GenericCallAdapter;

#[async_trait::async_trait]
impl MethodHandler for GenericCallAdapter {
    async fn call(
        &self,
        ctx: &CallContext,
        handler: &ServiceHandler,
        args: &mut CallArgs,
        result: &mut CallResult,
    ) -> Result<()> {
        let args = args.as_generic_mut().ok_or_else(|| {
            Error::internal("unknown service adapter received typed arguments")
        })?;
        let result = result.as_generic_mut().ok_or_else(|| {
            Error::internal("unknown service adapter received a typed result container")
        })?;
        let ServiceHandler::Unknown(handler) = handler else {
            return Err(Error::internal(
                "unknown service adapter requires an unknown service handler",
            ));
        };

        result.method = args.method.clone();
        result.service_name = args.service_name.clone();
        let request = std::mem::take(&mut args.request);
        result.payload = handler
            .handle(ctx, &args.service_name, &args.method, request)
            .await?;
        Ok(())
    }
}
