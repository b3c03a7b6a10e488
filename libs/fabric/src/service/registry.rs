use std::collections::HashMap;
use std::sync::Arc;

use crate::service::{ServiceDescriptor, ServiceHandler};

/// A known service together with the implementation behind it
#[derive(Debug, Clone)]
pub struct RegisteredService {
    pub descriptor: Arc<ServiceDescriptor>,
    pub handler: ServiceHandler,
}

/// Finds the service registered for a call
///
/// `None` means the service is unknown. A returned service may still lack
/// the requested method; the caller checks the method table.
pub trait ServiceSearcher: Send + Sync {
    fn lookup(&self, service: &str, method: &str) -> Option<RegisteredService>;
}

/// In-memory searcher keyed by service name
#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    services: HashMap<String, RegisteredService>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any previous one with the same name
    pub fn register(&mut self, descriptor: ServiceDescriptor, handler: ServiceHandler) {
        let name = descriptor.service_name().to_string();
        self.services.insert(
            name,
            RegisteredService {
                descriptor: Arc::new(descriptor),
                handler,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceSearcher for ServiceRegistry {
    fn lookup(&self, service: &str, _method: &str) -> Option<RegisteredService> {
        self.services.get(service).cloned()
    }
}
