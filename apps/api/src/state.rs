use std::sync::Arc;

use crate::audit::AuditStore;
use crate::proxy::cache::ResponseCache;
use crate::proxy::upstream::Upstream;

/// Shared application state injected into all route handlers via Axum
/// extractors. The cache is the only shared mutable piece; it lives for the
/// process lifetime and is never persisted across restarts.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    pub cache: Arc<ResponseCache>,
    pub audit: Arc<dyn AuditStore>,
}
