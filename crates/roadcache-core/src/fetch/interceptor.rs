use tracing::{debug, warn};

use crate::cache::{CacheTiers, PartitionRole, ResponseSnapshot};
use crate::models::{builtin_offline_quiz, StatesResponse};

use super::{FetchBackend, FetchError, RequestDescriptor};

/// Path prefix routed through the API strategy.
pub(super) const API_PREFIX: &str = "/api/";

/// Endpoint families whose successful responses are kept for offline use.
const OFFLINE_CACHEABLE_ENDPOINTS: [&str; 2] = ["/api/quizzes/theory", "/api/states"];

fn is_offline_cacheable(path: &str) -> bool {
    OFFLINE_CACHEABLE_ENDPOINTS
        .iter()
        .any(|endpoint| path.contains(endpoint))
}

/// Routes every outgoing request to a fetch strategy.
///
/// API paths go network-first with cached or synthesized offline
/// fallbacks. Static paths split on the declared accept type: HTML
/// navigations go network-first so updates are picked up, everything else
/// is served cache-first. Only GET requests are intercepted.
pub struct RequestInterceptor;

impl RequestInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Handle one request. GET requests always produce a snapshot, online
    /// or not; other methods pass through and surface transport errors
    /// unchanged.
    pub async fn handle(
        &self,
        request: &RequestDescriptor,
        tiers: &CacheTiers,
        backend: &impl FetchBackend,
    ) -> Result<ResponseSnapshot, FetchError> {
        if !request.method.is_get() {
            return backend.fetch(request.clone()).await;
        }

        if request.is_api() {
            Ok(self.handle_api(request, tiers, backend).await)
        } else {
            Ok(self.handle_static(request, tiers, backend).await)
        }
    }

    /// Network-first with offline fallbacks: cached copy for the exact
    /// key, then a synthesized payload for the known endpoint families,
    /// then a 503 offline marker.
    async fn handle_api(
        &self,
        request: &RequestDescriptor,
        tiers: &CacheTiers,
        backend: &impl FetchBackend,
    ) -> ResponseSnapshot {
        match backend.fetch(request.clone()).await {
            Ok(response) => {
                if response.is_ok() && is_offline_cacheable(&request.path) {
                    if let Err(e) = tiers.put(PartitionRole::QuizData, &request.path, &response) {
                        warn!(path = %request.path, error = %e, "Failed to cache API response");
                    }
                }
                response
            }
            Err(e) => {
                debug!(path = %request.path, error = %e, "Network failed for API request");
                if let Some(cached) = tiers.get(&request.path) {
                    debug!(path = %request.path, "Serving API request from cache");
                    return cached;
                }
                synthesize_api_fallback(&request.path)
            }
        }
    }

    /// HTML navigations: network, cache, offline document, bare 503.
    /// Other assets: cache, network, bare 503. Successful responses are
    /// not written back; only install populates the shell partition.
    async fn handle_static(
        &self,
        request: &RequestDescriptor,
        tiers: &CacheTiers,
        backend: &impl FetchBackend,
    ) -> ResponseSnapshot {
        if request.wants_html() {
            match backend.fetch(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(path = %request.path, error = %e, "Network failed for document request");
                    if let Some(cached) = tiers.get(&request.path) {
                        return cached;
                    }
                    tiers
                        .offline_document()
                        .unwrap_or_else(|| ResponseSnapshot::text(503, "Offline"))
                }
            }
        } else {
            if let Some(cached) = tiers.get(&request.path) {
                return cached;
            }
            match backend.fetch(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(path = %request.path, error = %e, "Network failed for static request");
                    ResponseSnapshot::text(503, "Offline")
                }
            }
        }
    }
}

impl Default for RequestInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

fn synthesize_api_fallback(path: &str) -> ResponseSnapshot {
    if path.contains("/api/states") {
        return ResponseSnapshot::json(200, &StatesResponse::offline());
    }
    if path.contains("/api/quizzes") {
        return ResponseSnapshot::json(200, &vec![builtin_offline_quiz()]);
    }
    ResponseSnapshot::json(
        503,
        &serde_json::json!({
            "error": "offline",
            "message": "This feature requires an internet connection"
        }),
    )
}

// ============================================================================
// Tests
// ============================================================================
