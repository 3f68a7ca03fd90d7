//! Store call timeout helpers
//!
//! Every store call made by the service goes through [`with_timeout`] so no
//! request can block on persistence indefinitely.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{StoreError, StoreResult};

/// Default timeout for store queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a store operation, failing with [`StoreError::Timeout`] once `duration`
/// elapses. The abandoned future is dropped; single-statement writes either
/// commit whole or not at all.
///
/// # Example
///
/// ```no_run
/// use royale::db::{UserRepository, timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT}};
/// # async fn example(repo: &dyn UserRepository) -> Result<(), Box<dyn std::error::Error>> {
/// let users = with_timeout(DEFAULT_QUERY_TIMEOUT, repo.list_users()).await?;
/// # let _ = users;
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
