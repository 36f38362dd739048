//! Batching for ECS describe calls, which cap how many ARNs one request may
//! carry.

use anyhow::Result;
use futures::stream::{Stream, TryChunksError, TryStreamExt};

/// `DescribeServices` accepts at most this many services per call
pub const SERVICES_BATCH_SIZE: usize = 10;

/// `DescribeTasks` accepts at most this many tasks per call
pub const TASKS_BATCH_SIZE: usize = 100;

/// Group a fallible stream into batches of `size` items.
///
/// Every batch holds exactly `size` items except possibly the last, which holds
/// the remainder; an empty input yields no batches. Order is preserved. An error
/// from the input is forwarded as-is, and items buffered for the incomplete batch
/// at that point are dropped.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn batched<S, T>(stream: S, size: usize) -> impl Stream<Item = Result<Vec<T>>>
where
    S: Stream<Item = Result<T>>,
{
    assert!(size > 0, "batch size must be positive");
    stream
        .try_chunks(size)
        .map_err(|TryChunksError(_, err)| err)
}
