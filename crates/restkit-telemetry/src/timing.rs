//! Execution-time logging for awaited operations.

use std::future::Future;
use std::time::Instant;

/// Await `fut`, logging `tag|enter` before and `tag|exit` with the elapsed
/// milliseconds after, at debug level. The output is returned unchanged.
pub async fn log_execution_time<Fut, T>(tag: &str, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    tracing::debug!("{tag}|enter");
    let started = Instant::now();
    let output = fut.await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::debug!(elapsed_ms, "{tag}|exit");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use restkit_test_support::CapturedLogs;

    #[tokio::test]
    async fn logs_enter_and_exit_around_the_future() {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        let value = log_execution_time("upload", async { 7 }).await;
        assert_eq!(value, 7);
        assert!(logs.contains("upload|enter"));
        let exit = logs.lines_containing("upload|exit");
        assert_eq!(exit.len(), 1);
        assert!(exit[0].contains("elapsed_ms="));
        assert!(exit[0].contains("DEBUG"));
    }
}
