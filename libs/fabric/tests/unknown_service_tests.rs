use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use constellation_core::CallContext;
use constellation_fabric::{
    codec::PayloadCodecKind,
    dispatch::Dispatcher,
    error::{Error, Result},
    option::ServerOption,
    service::{
        CallArgs, CallResult, MethodEntry, MethodHandler, ServiceDescriptor, ServiceHandler,
        ServiceRegistry,
    },
    unknown::{synthesize, GenericArgs, UnknownServiceHandler, UNKNOWN_SERVICE},
};
use tokio_util::sync::CancellationToken;

struct Echo;

#[async_trait::async_trait]
impl UnknownServiceHandler for Echo {
    async fn handle(
        &self,
        _ctx: &CallContext,
        _service: &str,
        _method: &str,
        request: Bytes,
    ) -> Result<Bytes> {
        Ok(request)
    }
}

/// Answers with "service.method" so tests can see which names arrived
struct NameEcho;

#[async_trait::async_trait]
impl UnknownServiceHandler for NameEcho {
    async fn handle(
        &self,
        _ctx: &CallContext,
        service: &str,
        method: &str,
        _request: Bytes,
    ) -> Result<Bytes> {
        Ok(Bytes::from(format!("{service}.{method}")))
    }
}

struct Refuse;

#[async_trait::async_trait]
impl UnknownServiceHandler for Refuse {
    async fn handle(
        &self,
        _ctx: &CallContext,
        service: &str,
        method: &str,
        _request: Bytes,
    ) -> Result<Bytes> {
        Err(Error::MethodNotFound {
            service: format!("upstream-{service}"),
            method: method.to_string(),
        })
    }
}

/// Waits until the call is cancelled and reports it
struct WaitForCancel;

#[async_trait::async_trait]
impl UnknownServiceHandler for WaitForCancel {
    async fn handle(
        &self,
        ctx: &CallContext,
        _service: &str,
        _method: &str,
        _request: Bytes,
    ) -> Result<Bytes> {
        tokio::select! {
            _ = ctx.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(Bytes::new()),
        }
    }
}

struct Counter {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl UnknownServiceHandler for Counter {
    async fn handle(
        &self,
        _ctx: &CallContext,
        _service: &str,
        _method: &str,
        request: Bytes,
    ) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(request)
    }
}

/// Typed adapter for a statically known `Calculator.double`
struct DoubleAdapter;

struct Calculator;

impl Calculator {
    fn double(&self, value: u64) -> u64 {
        value * 2
    }
}

#[async_trait::async_trait]
impl MethodHandler for DoubleAdapter {
    async fn call(
        &self,
        _ctx: &CallContext,
        handler: &ServiceHandler,
        args: &mut CallArgs,
        result: &mut CallResult,
    ) -> Result<()> {
        let ServiceHandler::Typed(handler) = handler else {
            return Err(Error::internal("expected typed handler"));
        };
        let calculator = handler
            .downcast_ref::<Calculator>()
            .ok_or_else(|| Error::internal("expected calculator"))?;
        let value = *args
            .downcast_mut::<u64>()
            .ok_or_else(|| Error::internal("expected u64 args"))?;
        *result
            .downcast_mut::<u64>()
            .ok_or_else(|| Error::internal("expected u64 result"))? = calculator.double(value);
        Ok(())
    }
}

fn calculator_registry() -> ServiceRegistry {
    let entry = MethodEntry::new(
        Arc::new(DoubleAdapter),
        || CallArgs::Typed(Box::new(0u64)),
        || CallResult::Typed(Box::new(0u64)),
        false,
    );
    let descriptor =
        ServiceDescriptor::new("Calculator", PayloadCodecKind::Thrift).with_method("double", entry);
    let mut registry = ServiceRegistry::new();
    registry.register(descriptor, ServiceHandler::Typed(Arc::new(Calculator)));
    registry
}

fn fallback_dispatcher(handler: Arc<dyn UnknownServiceHandler>) -> Dispatcher {
    Dispatcher::new(Arc::new(calculator_registry()))
        .with_unknown_service(handler, PayloadCodecKind::Thrift)
}

#[tokio::test]
async fn synthesized_entry_echoes_payload_and_names() {
    let descriptor = synthesize(PayloadCodecKind::Protobuf, "S", "M");
    let entry = descriptor.method("M").unwrap();
    let handler = ServiceHandler::Unknown(Arc::new(Echo));
    let ctx = CallContext::new("S", "M");

    let mut args = entry.new_args();
    *args.as_generic_mut().unwrap() = GenericArgs::new("S", "M", &b"payload"[..]);
    let mut result = entry.new_result();
    entry
        .call(&ctx, &handler, &mut args, &mut result)
        .await
        .unwrap();

    let result = result.into_generic().unwrap();
    assert_eq!(result.payload, Bytes::from_static(b"payload"));
    assert_eq!(result.method, "M");
    assert_eq!(result.service_name, "S");
}

#[tokio::test]
async fn handler_error_passes_through_unchanged() {
    let dispatcher = fallback_dispatcher(Arc::new(Refuse));
    let ctx = CallContext::new("Ghost", "haunt");

    let err = dispatcher
        .invoke_raw(&ctx, Bytes::from_static(b"boo"))
        .await
        .unwrap_err();

    match err {
        Error::MethodNotFound { service, method } => {
            assert_eq!(service, "upstream-Ghost");
            assert_eq!(method, "haunt");
        }
        e => panic!("Expected handler's own error, got {:?}", e),
    }
}

#[tokio::test]
async fn unknown_service_reaches_fallback_with_real_names() {
    let dispatcher = fallback_dispatcher(Arc::new(NameEcho));
    let ctx = CallContext::new("Inventory", "list");

    let resolution = dispatcher.resolve("Inventory", "list").unwrap();
    assert!(resolution.is_fallback());
    assert_eq!(resolution.descriptor().service_name(), UNKNOWN_SERVICE);

    let response = dispatcher.invoke_raw(&ctx, Bytes::new()).await.unwrap();
    assert_eq!(response, Bytes::from_static(b"Inventory.list"));
}

#[tokio::test]
async fn unknown_method_on_known_service_reaches_fallback() {
    let dispatcher = fallback_dispatcher(Arc::new(NameEcho));
    let ctx = CallContext::new("Calculator", "triple");

    let response = dispatcher.invoke_raw(&ctx, Bytes::new()).await.unwrap();
    assert_eq!(response, Bytes::from_static(b"Calculator.triple"));
}

#[tokio::test]
async fn known_method_is_dispatched_statically() {
    let dispatcher = fallback_dispatcher(Arc::new(Echo));
    let ctx = CallContext::new("Calculator", "double");

    let resolution = dispatcher.resolve("Calculator", "double").unwrap();
    assert!(!resolution.is_fallback());

    let mut args = resolution.new_args();
    *args.downcast_mut::<u64>().unwrap() = 21;
    let mut result = resolution.call(&ctx, &mut args).await.unwrap();
    assert_eq!(*result.downcast_mut::<u64>().unwrap(), 42);
}

#[tokio::test]
async fn raw_invoke_of_typed_method_is_internal_error() {
    let dispatcher = fallback_dispatcher(Arc::new(Echo));
    let ctx = CallContext::new("Calculator", "double");

    let err = dispatcher.invoke_raw(&ctx, Bytes::new()).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[test]
fn miss_without_fallback_is_not_found() {
    let dispatcher = Dispatcher::new(Arc::new(calculator_registry()));
    assert!(!dispatcher.has_fallback());

    match dispatcher.resolve("Inventory", "list").unwrap_err() {
        Error::ServiceNotFound { service } => assert_eq!(service, "Inventory"),
        e => panic!("Expected ServiceNotFound, got {:?}", e),
    }
    match dispatcher.resolve("Calculator", "triple").unwrap_err() {
        Error::MethodNotFound { service, method } => {
            assert_eq!(service, "Calculator");
            assert_eq!(method, "triple");
        }
        e => panic!("Expected MethodNotFound, got {:?}", e),
    }
}

#[tokio::test]
async fn cancellation_reaches_the_handler() {
    let dispatcher = fallback_dispatcher(Arc::new(WaitForCancel));
    let token = CancellationToken::new();
    let ctx = CallContext::new("Slow", "wait").with_cancellation(token.clone());

    let call = tokio::spawn(async move { dispatcher.invoke_raw(&ctx, Bytes::new()).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), call)
        .await
        .expect("handler ignored cancellation")
        .unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn deadline_is_visible_to_the_handler() {
    struct Remaining;

    #[async_trait::async_trait]
    impl UnknownServiceHandler for Remaining {
        async fn handle(
            &self,
            ctx: &CallContext,
            _service: &str,
            _method: &str,
            _request: Bytes,
        ) -> Result<Bytes> {
            let remaining = ctx.remaining().ok_or_else(|| Error::custom("no deadline"))?;
            Ok(Bytes::from(remaining.as_secs().to_string()))
        }
    }

    let dispatcher = fallback_dispatcher(Arc::new(Remaining));
    let ctx = CallContext::new("Any", "thing").with_timeout(Duration::from_secs(30));
    let response = dispatcher.invoke_raw(&ctx, Bytes::new()).await.unwrap();
    let secs: u64 = std::str::from_utf8(&response).unwrap().parse().unwrap();
    assert!(secs > 0 && secs <= 30);
}

#[tokio::test]
async fn concurrent_calls_do_not_share_containers() {
    let counter = Arc::new(Counter {
        calls: AtomicUsize::new(0),
    });
    let dispatcher = Arc::new(fallback_dispatcher(counter.clone()));

    let mut handles = Vec::new();
    for i in 0..32 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            let ctx = CallContext::new(format!("svc{i}"), "call");
            let payload = Bytes::from(format!("payload-{i}"));
            let response = dispatcher.invoke_raw(&ctx, payload.clone()).await.unwrap();
            assert_eq!(response, payload);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(counter.calls.load(Ordering::SeqCst), 32);
}

#[tokio::test]
async fn server_option_wires_fallback_into_dispatcher() {
    let option = ServerOption::builder()
        .service_searcher(Arc::new(calculator_registry()))
        .unknown_service_handler(Arc::new(Echo))
        .build()
        .unwrap();
    assert!(option.unknown_service().is_some());

    let dispatcher = Dispatcher::from_server_option(&option).unwrap();
    assert!(dispatcher.has_fallback());

    let ctx = CallContext::new("Mirror", "reflect");
    let response = dispatcher
        .invoke_raw(&ctx, Bytes::from_static(b"glass"))
        .await
        .unwrap();
    assert_eq!(response, Bytes::from_static(b"glass"));
}

#[test]
fn server_option_without_catch_all_has_no_fallback() {
    let option = ServerOption::builder()
        .service_searcher(Arc::new(calculator_registry()))
        .build()
        .unwrap();
    assert!(option.unknown_service().is_none());

    let dispatcher = Dispatcher::from_server_option(&option).unwrap();
    assert!(!dispatcher.has_fallback());
    assert!(matches!(
        dispatcher.resolve("Mirror", "reflect"),
        Err(Error::ServiceNotFound { .. })
    ));
}
