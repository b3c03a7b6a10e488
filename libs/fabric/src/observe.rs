//! Hooks for tracing and profiling backends
//!
//! Backends live outside this crate; the option aggregates only hold them.

use std::sync::Arc;

use constellation_core::CallContext;

use crate::message::Message;

/// Per-call tracer
pub trait Tracer: Send + Sync {
    fn start(&self, ctx: &mut CallContext);

    fn finish(&self, ctx: &CallContext);
}

/// Sampling profiler that groups samples by tags
pub trait Profiler: Send + Sync {
    fn tag(&self, tags: &[String]);

    fn untag(&self);
}

/// Derive profiler tags from transport-level information
pub type TransInfoTagging = Arc<dyn Fn(&CallContext, &Message) -> Vec<String> + Send + Sync>;

/// Copy message-derived tags into the call context
pub type MessageTagging = Arc<dyn Fn(&mut CallContext, &Message) + Send + Sync>;
