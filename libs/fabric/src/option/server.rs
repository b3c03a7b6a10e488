use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use constellation_core::CallContext;
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, PayloadCodec, PayloadCodecKind};
use crate::error::{Error, Result};
use crate::observe::{MessageTagging, Profiler, TransInfoTagging, Tracer};
use crate::pipeline::{BoundHandler, Pipeline, StreamingMetaHandler};
use crate::service::{ServiceDescriptor, ServiceSearcher};
use crate::transport::{Address, Listener, ServerTransHandlerFactory, TransServerFactory};
use crate::unknown::{fallback_descriptor, UnknownServiceHandler};

/// Server timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerTimeouts {
    /// How long shutdown waits for open connections to close
    pub exit_wait_time: Duration,
    /// Pause after a failed accept before accepting again
    pub accept_failed_delay_time: Duration,
    /// Idle connections are closed after this long
    pub max_connection_idle_time: Duration,
    pub read_write_timeout: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            exit_wait_time: Duration::from_secs(5),
            accept_failed_delay_time: Duration::from_millis(10),
            max_connection_idle_time: Duration::from_secs(600),
            read_write_timeout: Duration::from_secs(5),
        }
    }
}

/// Builds the context for a new connection, or resets a reused one
///
/// Receives the previous context when one is being recycled and the peer
/// address of the connection.
pub type InitCallContext =
    Arc<dyn Fn(Option<CallContext>, &Address) -> CallContext + Send + Sync>;

/// Everything a server transport needs to start
#[derive(Default)]
pub struct ServerOption {
    target_service: Option<Arc<ServiceDescriptor>>,
    service_searcher: Option<Arc<dyn ServiceSearcher>>,
    trans_server_factory: Option<Arc<dyn TransServerFactory>>,
    handler_factory: Option<Arc<dyn ServerTransHandlerFactory>>,
    codec: Option<Arc<dyn Codec>>,
    payload_codec: Option<Arc<dyn PayloadCodec>>,
    // takes priority over `address`
    listener: Option<Listener>,
    address: Option<Address>,
    reuse_port: bool,
    timeouts: ServerTimeouts,
    tracer: Option<Arc<dyn Tracer>>,
    profiler: Option<Arc<dyn Profiler>>,
    trans_info_tagging: Option<TransInfoTagging>,
    message_tagging: Option<MessageTagging>,
    init_call_context: Option<InitCallContext>,
    unknown_service_handler: Option<Arc<dyn UnknownServiceHandler>>,
    unknown_service: Option<Arc<ServiceDescriptor>>,
    compatible_middleware_for_unary: bool,
    pipeline: Pipeline,
}

impl ServerOption {
    /// Create a builder for configuring the server
    pub fn builder() -> ServerOptionBuilder {
        ServerOptionBuilder::new()
    }

    pub fn target_service(&self) -> Option<&Arc<ServiceDescriptor>> {
        self.target_service.as_ref()
    }

    pub fn service_searcher(&self) -> Option<&Arc<dyn ServiceSearcher>> {
        self.service_searcher.as_ref()
    }

    pub fn trans_server_factory(&self) -> Option<&Arc<dyn TransServerFactory>> {
        self.trans_server_factory.as_ref()
    }

    pub fn handler_factory(&self) -> Option<&Arc<dyn ServerTransHandlerFactory>> {
        self.handler_factory.as_ref()
    }

    pub fn codec(&self) -> Option<&Arc<dyn Codec>> {
        self.codec.as_ref()
    }

    pub fn payload_codec(&self) -> Option<&Arc<dyn PayloadCodec>> {
        self.payload_codec.as_ref()
    }

    /// Hand the pre-bound listener to the transport
    pub fn take_listener(&mut self) -> Option<Listener> {
        self.listener.take()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn reuse_port(&self) -> bool {
        self.reuse_port
    }

    pub fn timeouts(&self) -> &ServerTimeouts {
        &self.timeouts
    }

    pub fn tracer(&self) -> Option<&Arc<dyn Tracer>> {
        self.tracer.as_ref()
    }

    pub fn profiler(&self) -> Option<&Arc<dyn Profiler>> {
        self.profiler.as_ref()
    }

    pub fn trans_info_tagging(&self) -> Option<&TransInfoTagging> {
        self.trans_info_tagging.as_ref()
    }

    pub fn message_tagging(&self) -> Option<&MessageTagging> {
        self.message_tagging.as_ref()
    }

    pub fn init_call_context(&self) -> Option<&InitCallContext> {
        self.init_call_context.as_ref()
    }

    /// Context for a connection from `peer`
    ///
    /// Goes through the configured hook; without one a recycled context is
    /// kept and a new connection gets an empty context.
    pub fn call_context_for(
        &self,
        previous: Option<CallContext>,
        peer: &Address,
    ) -> CallContext {
        match &self.init_call_context {
            Some(init) => init(previous, peer),
            None => previous.unwrap_or_else(|| CallContext::new("", "")),
        }
    }

    pub fn unknown_service_handler(&self) -> Option<&Arc<dyn UnknownServiceHandler>> {
        self.unknown_service_handler.as_ref()
    }

    /// The fallback descriptor, present only when a catch-all is registered
    pub fn unknown_service(&self) -> Option<&Arc<ServiceDescriptor>> {
        self.unknown_service.as_ref()
    }

    pub fn compatible_middleware_for_unary(&self) -> bool {
        self.compatible_middleware_for_unary
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// See [`Pipeline::insert_first`]
    pub fn insert_first(&mut self, handler: Arc<dyn BoundHandler>) {
        self.pipeline.insert_first(handler);
    }

    /// See [`Pipeline::insert_last`]
    pub fn insert_last(&mut self, handler: Arc<dyn BoundHandler>) {
        self.pipeline.insert_last(handler);
    }

    pub fn add_streaming_meta_handler(&mut self, handler: Arc<dyn StreamingMetaHandler>) {
        self.pipeline.add_streaming_meta_handler(handler);
    }

    fn fallback_codec(&self) -> PayloadCodecKind {
        self.payload_codec
            .as_ref()
            .map(|codec| codec.kind())
            .or_else(|| self.target_service.as_ref().map(|s| s.payload_codec()))
            .unwrap_or(PayloadCodecKind::Thrift)
    }
}

impl fmt::Debug for ServerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOption")
            .field(
                "target_service",
                &self.target_service.as_ref().map(|s| s.service_name()),
            )
            .field("codec", &self.codec.as_ref().map(|c| c.name()))
            .field("listener", &self.listener)
            .field("address", &self.address)
            .field("reuse_port", &self.reuse_port)
            .field("timeouts", &self.timeouts)
            .field("has_init_call_context", &self.init_call_context.is_some())
            .field("has_unknown_service", &self.unknown_service.is_some())
            .field(
                "compatible_middleware_for_unary",
                &self.compatible_middleware_for_unary,
            )
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ServerOption`]
#[derive(Default)]
pub struct ServerOptionBuilder {
    option: ServerOption,
}

impl ServerOptionBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_service(mut self, descriptor: Arc<ServiceDescriptor>) -> Self {
        self.option.target_service = Some(descriptor);
        self
    }

    pub fn service_searcher(mut self, searcher: Arc<dyn ServiceSearcher>) -> Self {
        self.option.service_searcher = Some(searcher);
        self
    }

    pub fn trans_server_factory(mut self, factory: Arc<dyn TransServerFactory>) -> Self {
        self.option.trans_server_factory = Some(factory);
        self
    }

    pub fn handler_factory(mut self, factory: Arc<dyn ServerTransHandlerFactory>) -> Self {
        self.option.handler_factory = Some(factory);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.option.codec = Some(codec);
        self
    }

    pub fn payload_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.option.payload_codec = Some(codec);
        self
    }

    /// Serve on an already bound listener instead of binding `address`
    pub fn listener(mut self, listener: impl Into<Listener>) -> Self {
        self.option.listener = Some(listener.into());
        self
    }

    pub fn address(mut self, address: impl Into<Address>) -> Self {
        self.option.address = Some(address.into());
        self
    }

    pub fn reuse_port(mut self, reuse: bool) -> Self {
        self.option.reuse_port = reuse;
        self
    }

    pub fn timeouts(mut self, timeouts: ServerTimeouts) -> Self {
        self.option.timeouts = timeouts;
        self
    }

    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.option.tracer = Some(tracer);
        self
    }

    pub fn profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.option.profiler = Some(profiler);
        self
    }

    pub fn trans_info_tagging(mut self, tagging: TransInfoTagging) -> Self {
        self.option.trans_info_tagging = Some(tagging);
        self
    }

    pub fn message_tagging(mut self, tagging: MessageTagging) -> Self {
        self.option.message_tagging = Some(tagging);
        self
    }

    pub fn init_call_context(mut self, init: InitCallContext) -> Self {
        self.option.init_call_context = Some(init);
        self
    }

    /// Answer calls for unregistered services and methods with `handler`
    pub fn unknown_service_handler(mut self, handler: Arc<dyn UnknownServiceHandler>) -> Self {
        self.option.unknown_service_handler = Some(handler);
        self
    }

    pub fn compatible_middleware_for_unary(mut self, enabled: bool) -> Self {
        self.option.compatible_middleware_for_unary = enabled;
        self
    }

    /// Prepend a bound handler, see [`Pipeline::insert_first`]
    pub fn insert_first(mut self, handler: Arc<dyn BoundHandler>) -> Self {
        self.option.insert_first(handler);
        self
    }

    /// Append a bound handler, see [`Pipeline::insert_last`]
    pub fn insert_last(mut self, handler: Arc<dyn BoundHandler>) -> Self {
        self.option.insert_last(handler);
        self
    }

    pub fn streaming_meta_handler(mut self, handler: Arc<dyn StreamingMetaHandler>) -> Self {
        self.option.add_streaming_meta_handler(handler);
        self
    }

    /// Finish configuration
    ///
    /// Synthesizes the fallback descriptor when a catch-all handler is
    /// registered, using the payload codec kind of the server (thrift when
    /// none is configured).
    pub fn build(mut self) -> Result<ServerOption> {
        if self.option.service_searcher.is_none() {
            return Err(Error::config("server requires a service searcher"));
        }
        if self.option.unknown_service_handler.is_some() {
            let codec = self.option.fallback_codec();
            tracing::debug!(%codec, "installing unknown service fallback");
            self.option.unknown_service = Some(Arc::new(fallback_descriptor(codec)));
        }
        Ok(self.option)
    }
}
