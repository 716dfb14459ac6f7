//! Source reachability probing.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use calhub_sources::CalendarSource;

/// Probes every configured source for reachability.
///
/// Probes go straight to the remote; the document cache is never consulted
/// or touched, so a health check observes the backend and not a stale copy.
/// One unreachable source marks only its own entry false.
pub struct HealthChecker {
    sources: Vec<Arc<dyn CalendarSource>>,
}

impl HealthChecker {
    /// Creates a checker over the given sources.
    pub fn new(sources: Vec<Arc<dyn CalendarSource>>) -> Self {
        Self { sources }
    }

    /// Probes every source concurrently; returns reachability keyed by
    /// source identity.
    pub async fn check(&self) -> BTreeMap<String, bool> {
        let probes = self.sources.iter().map(|source| async move {
            let reachable = match source.probe().await {
                Ok(()) => true,
                Err(error) => {
                    warn!(source = %source.id(), error = %error, "Health probe failed");
                    false
                }
            };
            (source.id().to_string(), reachable)
        });

        join_all(probes).await.into_iter().collect()
    }
}
