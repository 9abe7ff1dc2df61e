//! Storage timeout helpers
//!
//! Bounds every store operation so a stuck disk can't wedge a table actor.

use std::{future::Future, time::Duration};
use tokio::time::timeout;

use super::errors::{StoreError, StoreResult};

/// Default timeout for a single load or save (5 seconds)
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute a store operation with a timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
///
/// # Returns
///
/// * `StoreResult<T>` - Result or [`StoreError::Timeout`]
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
