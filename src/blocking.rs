//! Deadlines for blocking gateway calls
//!
//! Native calls cannot be interrupted. A caller that needs a deadline runs the
//! call on tokio's blocking pool and stops waiting for it; the call itself
//! keeps running until the native layer returns.

use std::time::Duration;

use crate::{Error, Result};

/// Run `f` on the blocking pool, giving up on it after `timeout`.
pub async fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::Join(e.to_string())),
        Err(_) => {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Abandoning in-flight call");
            Err(Error::Abandoned { after: timeout })
        }
    }
}
