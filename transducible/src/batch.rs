//! Ordered batch execution.
//!
//! Batches fan out over a `FuturesUnordered` with a bounded number of items
//! in flight. Items complete in any order; results are re-sorted by input
//! index before returning, so output position always matches input
//! position. The first failing item fails the whole batch and drops the
//! items still in flight.

use crate::error::{TransductionError, TransductionResult};
use crate::handler::BoxFuture;
use atype::Record;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Future produced for one batch item.
pub type ItemFuture = BoxFuture<Record>;

/// Per-item function: receives the item's index and the item.
pub type ItemFn = Arc<dyn Fn(usize, Record) -> ItemFuture + Send + Sync>;

/// Batch execution metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMetrics {
    /// Items in the batch
    pub total_items: usize,
    /// Items that completed successfully
    pub completed: usize,
    /// Highest number of items in flight at once
    pub peak_in_flight: usize,
    /// Wall time spent on the batch
    pub duration: Duration,
}

/// Run `per_item` over `items` with at most `concurrency` in flight,
/// returning results in input order.
pub async fn execute_ordered(
    items: Vec<Record>,
    concurrency: usize,
    per_item: ItemFn,
) -> TransductionResult<Vec<Record>> {
    let (results, metrics) = execute_ordered_with_metrics(items, concurrency, per_item).await?;
    debug!(
        total_items = metrics.total_items,
        peak_in_flight = metrics.peak_in_flight,
        duration_ms = metrics.duration.as_millis() as u64,
        "Batch execution completed"
    );
    Ok(results)
}

/// [`execute_ordered`], also returning the batch metrics.
pub async fn execute_ordered_with_metrics(
    items: Vec<Record>,
    concurrency: usize,
    per_item: ItemFn,
) -> TransductionResult<(Vec<Record>, BatchMetrics)> {
    let start = Instant::now();
    let total_items = items.len();
    let limit = concurrency.max(1);

    let start_item = |(index, item): (usize, Record)| {
        let fut = per_item(index, item);
        async move { (index, fut.await) }
    };

    let mut pending = items.into_iter().enumerate();
    let mut in_flight = FuturesUnordered::new();
    for next in pending.by_ref().take(limit) {
        in_flight.push(start_item(next));
    }

    let mut metrics = BatchMetrics {
        total_items,
        peak_in_flight: in_flight.len(),
        ..BatchMetrics::default()
    };
    let mut results: Vec<(usize, Record)> = Vec::with_capacity(total_items);

    while let Some((index, result)) = in_flight.next().await {
        match result {
            Ok(record) => {
                debug!(index, "Batch item succeeded");
                results.push((index, record));
                metrics.completed += 1;
            }
            Err(mut e) => {
                warn!(
                    index,
                    error_code = %e.code,
                    error_message = %e.message,
                    "Batch item failed"
                );
                if e.details.is_none() {
                    e = e.with_details(serde_json::json!({ "batch_index": index }));
                }
                return Err(e);
            }
        }

        if let Some(next) = pending.next() {
            in_flight.push(start_item(next));
            metrics.peak_in_flight = metrics.peak_in_flight.max(in_flight.len());
        }
    }

    // Preserve original order by sorting by input index
    results.sort_by_key(|(index, _)| *index);

    if results.len() != total_items {
        return Err(TransductionError::internal(format!(
            "Batch produced {} results for {} items",
            results.len(),
            total_items
        )));
    }

    metrics.duration = start.elapsed();
    Ok((results.into_iter().map(|(_, record)| record).collect(), metrics))
}
