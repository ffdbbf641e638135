//! Suite-wide and per-test time limits.

use std::{future::Future, time::Duration};

use tracing::error;

use crate::error::{HarnessError, Result};

/// Default limit for the whole suite.
pub const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(180);

/// Grace period added to the global limit for teardown.
pub const TIMEOUT_BUFFER: Duration = Duration::from_secs(10);

/// Default limit for a single test.
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs `fut` with `limit` plus [`TIMEOUT_BUFFER`].
pub async fn with_global_timeout<F: Future>(limit: Duration, fut: F) -> Result<F::Output> {
    with_deadline(limit + TIMEOUT_BUFFER, fut).await
}

/// Runs `fut` for at most `deadline`.
pub async fn with_deadline<F: Future>(deadline: Duration, fut: F) -> Result<F::Output> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(output) => Ok(output),
        Err(_) => {
            error!(?deadline, "Global timeout exceeded, stopping suite");
            Err(HarnessError::GlobalTimeout(deadline))
        }
    }
}
