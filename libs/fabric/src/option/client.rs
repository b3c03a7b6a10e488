use std::fmt;
use std::sync::Arc;

use crate::codec::{Codec, PayloadCodec};
use crate::error::{Error, Result};
use crate::pipeline::{BoundHandler, Pipeline, StreamingMetaHandler};
use crate::service::ServiceDescriptor;
use crate::transport::{ClientTransHandlerFactory, ConnPool, Dialer};

/// Everything a client transport needs to start
#[derive(Clone, Default)]
pub struct ClientOption {
    target_service: Option<Arc<ServiceDescriptor>>,
    handler_factory: Option<Arc<dyn ClientTransHandlerFactory>>,
    codec: Option<Arc<dyn Codec>>,
    payload_codec: Option<Arc<dyn PayloadCodec>>,
    conn_pool: Option<Arc<dyn ConnPool>>,
    dialer: Option<Arc<dyn Dialer>>,
    enable_conn_pool_reporter: bool,
    pipeline: Pipeline,
}

impl ClientOption {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientOptionBuilder {
        ClientOptionBuilder::new()
    }

    pub fn target_service(&self) -> Option<&Arc<ServiceDescriptor>> {
        self.target_service.as_ref()
    }

    pub fn handler_factory(&self) -> Option<&Arc<dyn ClientTransHandlerFactory>> {
        self.handler_factory.as_ref()
    }

    pub fn codec(&self) -> Option<&Arc<dyn Codec>> {
        self.codec.as_ref()
    }

    pub fn payload_codec(&self) -> Option<&Arc<dyn PayloadCodec>> {
        self.payload_codec.as_ref()
    }

    pub fn conn_pool(&self) -> Option<&Arc<dyn ConnPool>> {
        self.conn_pool.as_ref()
    }

    pub fn dialer(&self) -> Option<&Arc<dyn Dialer>> {
        self.dialer.as_ref()
    }

    pub fn conn_pool_reporter_enabled(&self) -> bool {
        self.enable_conn_pool_reporter
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
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOption")
            .field(
                "target_service",
                &self.target_service.as_ref().map(|s| s.service_name()),
            )
            .field("codec", &self.codec.as_ref().map(|c| c.name()))
            .field("conn_pool", &self.conn_pool.as_ref().map(|p| p.name()))
            .field("has_dialer", &self.dialer.is_some())
            .field("enable_conn_pool_reporter", &self.enable_conn_pool_reporter)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Builder for [`ClientOption`]
#[derive(Default)]
pub struct ClientOptionBuilder {
    option: ClientOption,
}

impl ClientOptionBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_service(mut self, descriptor: Arc<ServiceDescriptor>) -> Self {
        self.option.target_service = Some(descriptor);
        self
    }

    pub fn handler_factory(mut self, factory: Arc<dyn ClientTransHandlerFactory>) -> Self {
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

    pub fn conn_pool(mut self, pool: Arc<dyn ConnPool>) -> Self {
        self.option.conn_pool = Some(pool);
        self
    }

    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.option.dialer = Some(dialer);
        self
    }

    pub fn enable_conn_pool_reporter(mut self, enabled: bool) -> Self {
        self.option.enable_conn_pool_reporter = enabled;
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
    /// A connection pool dials through the configured dialer, so a pool
    /// without a dialer is rejected.
    pub fn build(self) -> Result<ClientOption> {
        if self.option.conn_pool.is_some() && self.option.dialer.is_none() {
            return Err(Error::config("connection pool configured without a dialer"));
        }
        Ok(self.option)
    }
}
