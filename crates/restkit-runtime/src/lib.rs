#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Lightweight background execution for request-adjacent work.
//!
//! # Design
//! - Detached work runs on a [`TaskTracker`] so shutdown can wait for it.
//! - Outcomes are only logged: no retry, no backpressure, no completion
//!   signal. Callers that need the result run synchronously.
//! - Panics inside detached work are caught at the task boundary and logged
//!   like errors, with the panic location and stack.
//! - The submitting request's context follows the work, so its outcome lines
//!   can be traced back to the request.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::future::Future;

use anyhow::Result;
use restkit_telemetry::{RequestContext, install_panic_capture, take_task_panic_report};
use tokio::task::JoinError;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Runs units of work inline or on tracked background tasks.
#[derive(Debug, Clone, Default)]
pub struct BackgroundExecutor {
    tracker: TaskTracker,
}

impl BackgroundExecutor {
    /// Executor with an empty task set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` labelled `label`.
    ///
    /// With `should_async = false` the work is awaited inline and its result
    /// returned as `Some`. Otherwise it is spawned, `Ok(None)` is returned
    /// right away, and the outcome is logged as `begin|async|label`, then
    /// `end|async|label` or `error|async|label`.
    ///
    /// # Errors
    ///
    /// Only in synchronous mode, when `work` itself fails.
    pub async fn run<Fut, T>(&self, label: &str, should_async: bool, work: Fut) -> Result<Option<T>>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        if !should_async {
            return work.await.map(Some);
        }

        install_panic_capture();
        let label = label.to_string();
        let context = RequestContext::current();
        let request_id = context
            .as_ref()
            .map(|ctx| ctx.request_id().to_string())
            .unwrap_or_default();
        let work = async move {
            match context {
                Some(context) => context.scope(work).await,
                None => work.await,
            }
        };
        self.tracker.spawn(async move {
            info!(request_id = %request_id, "begin|async|{label}");
            match tokio::spawn(work).await {
                Ok(Ok(_)) => info!(request_id = %request_id, "end|async|{label}"),
                Ok(Err(err)) => log_failure(&label, &request_id, &err),
                Err(join) => log_panic(&label, &request_id, &join),
            }
        });
        tokio::task::yield_now().await;
        Ok(None)
    }

    /// Number of detached units still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting new work and wait for everything already spawned.
    pub async fn shutdown(&self) {
        info!(pending = self.pending(), "waiting for background work");
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn log_failure(label: &str, request_id: &str, err: &anyhow::Error) {
    if err.backtrace().status() == BacktraceStatus::Captured {
        error!(request_id = %request_id, backtrace = ?err.backtrace(), error = ?err, "error|async|{label}");
    } else {
        let stack = Backtrace::force_capture();
        error!(request_id = %request_id, backtrace = ?stack, error = ?err, "error|async|{label}");
    }
}

fn log_panic(label: &str, request_id: &str, join: &JoinError) {
    match take_task_panic_report(join.id()) {
        Some(report) => error!(
            request_id = %request_id,
            location = %report.location(),
            backtrace = ?report.backtrace(),
            error = %join,
            "error|async|{label}"
        ),
        None => error!(request_id = %request_id, error = %join, "error|async|{label}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use restkit_test_support::CapturedLogs;
    use tokio::sync::Notify;

    fn explode() -> Result<()> {
        panic!("worker panicked")
    }

    #[tokio::test]
    async fn synchronous_mode_returns_the_result() -> Result<()> {
        let executor = BackgroundExecutor::new();
        let value = executor.run("sum", false, async { Ok(2 + 2) }).await?;
        assert_eq!(value, Some(4));
        assert_eq!(executor.pending(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn synchronous_mode_propagates_errors() {
        let executor = BackgroundExecutor::new();
        let outcome = executor
            .run("fail", false, async { Err::<(), _>(anyhow::anyhow!("boom")) })
            .await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn asynchronous_mode_returns_immediately_and_finishes_before_shutdown() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        let executor = BackgroundExecutor::new();
        let gate = Arc::new(Notify::new());
        let ran = Arc::new(AtomicBool::new(false));

        let work_gate = Arc::clone(&gate);
        let work_ran = Arc::clone(&ran);
        let result = executor
            .run("notify.send", true, async move {
                work_gate.notified().await;
                work_ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await?;
        assert_eq!(result, None);
        assert!(!ran.load(Ordering::SeqCst));

        gate.notify_one();
        executor.shutdown().await;
        assert!(ran.load(Ordering::SeqCst));
        assert!(logs.contains("begin|async|notify.send"));
        assert!(logs.contains("end|async|notify.send"));
        Ok(())
    }

    #[tokio::test]
    async fn detached_work_keeps_the_submitting_request_context() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        let executor = BackgroundExecutor::new();
        let seen = Arc::new(std::sync::Mutex::new(None));

        let work_seen = Arc::clone(&seen);
        restkit_telemetry::with_request_context("req-9", "media_upload", async {
            executor
                .run("save_picture_url", true, async move {
                    let id = restkit_telemetry::current_request_id();
                    if let Ok(mut slot) = work_seen.lock() {
                        *slot = id;
                    }
                    Ok(())
                })
                .await
        })
        .await?;
        executor.shutdown().await;

        let seen = seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
        assert_eq!(seen.as_deref(), Some("req-9"));
        let finished = logs.lines_containing("end|async|save_picture_url");
        assert_eq!(finished.len(), 1);
        assert!(finished[0].contains("request_id=req-9"));
        Ok(())
    }

    #[tokio::test]
    async fn asynchronous_failures_are_logged_not_raised() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        let executor = BackgroundExecutor::new();

        let result = executor
            .run("upload", true, async { Err::<(), _>(anyhow::anyhow!("store offline")) })
            .await?;
        assert_eq!(result, None);
        executor
            .run("explode", true, async { explode() })
            .await?;
        executor.shutdown().await;

        let failures = logs.lines_containing("error|async|upload");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("ERROR"));
        assert!(failures[0].contains("store offline"));
        assert!(failures[0].contains("backtrace=Backtrace ["));
        assert!(!logs.contains("end|async|upload"));

        let panics = logs.lines_containing("error|async|explode");
        assert_eq!(panics.len(), 1);
        assert!(panics[0].contains("location="));
        assert!(panics[0].contains("lib.rs"));
        assert!(panics[0].contains("backtrace=Backtrace ["));
        assert!(panics[0].contains("explode"));
        Ok(())
    }
}
