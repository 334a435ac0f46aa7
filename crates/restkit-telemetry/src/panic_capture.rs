//! Panic location and stack capture for code that recovers from panics.
//!
//! # Design
//! - A process-wide hook records where each panic happened, keyed by the
//!   tokio task it happened in (or the thread, outside a task).
//! - Whoever catches the unwind takes the report back out: the HTTP panic
//!   handler by its own task, background supervisors by the failed task's id.
//! - The previously installed hook still runs, so default stderr output is
//!   kept.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::panic::{self, PanicHookInfo};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

use once_cell::sync::{Lazy, OnceCell};
use tokio::task::Id;

/// Reports nobody collected are dropped once this many pile up.
const MAX_PENDING_REPORTS: usize = 64;

static HOOK_INSTALLED: OnceCell<()> = OnceCell::new();
static REPORTS: Lazy<Mutex<HashMap<Origin, PanicReport>>> = Lazy::new(Mutex::default);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Origin {
    Task(Id),
    Thread(ThreadId),
}

impl Origin {
    fn current() -> Self {
        tokio::task::try_id().map_or_else(|| Self::Thread(thread::current().id()), Self::Task)
    }
}

/// Where a panic happened and the stack at that point.
#[derive(Debug)]
pub struct PanicReport {
    location: String,
    backtrace: Backtrace,
}

impl PanicReport {
    /// `file:line:column` of the panic, or `<unknown>`.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Stack captured inside the panicking frame.
    #[must_use]
    pub const fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Give up the captured stack.
    #[must_use]
    pub fn into_backtrace(self) -> Backtrace {
        self.backtrace
    }
}

/// Install the recording hook once per process; later calls do nothing.
pub fn install_panic_capture() {
    HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            record(info);
            previous(info);
        }));
    });
}

/// Take the report of a panic raised by the current task or thread.
#[must_use]
pub fn take_current_panic_report() -> Option<PanicReport> {
    take(Origin::current())
}

/// Take the report of a panic raised inside the task `id`.
#[must_use]
pub fn take_task_panic_report(id: Id) -> Option<PanicReport> {
    take(Origin::Task(id))
}

fn record(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map_or_else(|| "<unknown>".to_string(), ToString::to_string);
    let report = PanicReport {
        location,
        backtrace: Backtrace::force_capture(),
    };
    let mut reports = REPORTS.lock().unwrap_or_else(PoisonError::into_inner);
    if reports.len() >= MAX_PENDING_REPORTS {
        reports.clear();
    }
    reports.insert(Origin::current(), report);
}

fn take(origin: Origin) -> Option<PanicReport> {
    REPORTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&origin)
}
