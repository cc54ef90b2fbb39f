use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextPrepareRequest, NextRequest,
};
use async_graphql::{Request, Response, ServerResult};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::debug;

/// Bucket for requests that carry no `operationName`.
pub const ANONYMOUS_OPERATION: &str = "anonymous";
/// Bucket for names seen after `MAX_TRACKED_OPERATIONS` distinct ones.
pub const OVERFLOW_OPERATION: &str = "other";
/// Operation names are client-chosen; cap how many get their own counters.
pub const MAX_TRACKED_OPERATIONS: usize = 256;

#[derive(Default)]
struct OperationStats {
    count: AtomicU64,
    errors: AtomicU64,
    total_micros: AtomicU64,
    max_micros: AtomicU64,
}

/// Point-in-time view of one operation's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSnapshot {
    pub operation: String,
    pub count: u64,
    pub errors: u64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

/// Query and mutation counters keyed by operation name. Cheap to clone;
/// clones share the same counters.
#[derive(Clone, Default)]
pub struct OperationMetrics {
    operations: Arc<RwLock<HashMap<String, Arc<OperationStats>>>>,
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &str, elapsed: Duration, failed: bool) {
        let stats = self.stats_for(operation);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        stats.count.fetch_add(1, Ordering::Relaxed);
        if failed {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
        stats.total_micros.fetch_add(micros, Ordering::Relaxed);
        stats.max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    /// All operations, sorted by name.
    pub fn snapshot(&self) -> Vec<OperationSnapshot> {
        let operations = self.operations.read();
        let mut snapshot: Vec<OperationSnapshot> = operations
            .iter()
            .map(|(name, stats)| {
                let count = stats.count.load(Ordering::Relaxed);
                let total_ms = stats.total_micros.load(Ordering::Relaxed) as f64 / 1000.0;
                OperationSnapshot {
                    operation: name.clone(),
                    count,
                    errors: stats.errors.load(Ordering::Relaxed),
                    avg_ms: if count == 0 { 0.0 } else { total_ms / count as f64 },
                    max_ms: stats.max_micros.load(Ordering::Relaxed) as f64 / 1000.0,
                }
            })
            .collect();
        snapshot.sort_by(|a, b| a.operation.cmp(&b.operation));
        snapshot
    }

    fn stats_for(&self, operation: &str) -> Arc<OperationStats> {
        if let Some(stats) = self.operations.read().get(operation) {
            return stats.clone();
        }

        let mut operations = self.operations.write();
        let key = if operations.len() >= MAX_TRACKED_OPERATIONS && !operations.contains_key(operation) {
            OVERFLOW_OPERATION
        } else {
            operation
        };
        operations.entry(key.to_string()).or_default().clone()
    }
}

/// Schema extension feeding [`OperationMetrics`].
pub struct Metrics(pub OperationMetrics);

impl ExtensionFactory for Metrics {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(MetricsExtension {
            metrics: self.0.clone(),
            operation: Mutex::new(None),
        })
    }
}

struct MetricsExtension {
    metrics: OperationMetrics,
    operation: Mutex<Option<String>>,
}

#[async_trait]
impl Extension for MetricsExtension {
    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        *self.operation.lock() = request.operation_name.clone();
        next.run(ctx, request).await
    }

    // Wraps parsing and validation too, so malformed requests are counted
    async fn request(&self, ctx: &ExtensionContext<'_>, next: NextRequest<'_>) -> Response {
        let started = Instant::now();
        let response = next.run(ctx).await;
        let elapsed = started.elapsed();

        let operation = self
            .operation
            .lock()
            .take()
            .unwrap_or_else(|| ANONYMOUS_OPERATION.to_string());
        self.metrics.record(&operation, elapsed, response.is_err());

        debug!(
            operation = %operation,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            errors = response.errors.len(),
            "GraphQL operation finished"
        );

        response
    }
}
