//! Bounded completion polling with backoff and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, ErrorCode, Result};
use crate::farm::{BuildFarm, BuildHandle, BuildStatus};

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
        }
    }
}

/// Cooperative cancellation flag shared between the poll loop and whoever
/// wants to abort it (signal handler, test, controlling thread).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// Sleep is sliced so a cancellation is observed within roughly this long.
const CANCEL_POLL_SLICE: Duration = Duration::from_millis(100);

/// Query `handle` until a terminal status is observed.
///
/// Transport errors count as an `Unknown` observation and consume an
/// attempt; any other farm error propagates immediately. Returns
/// `poll.timeout` once `max_attempts` is exhausted and `poll.cancelled`
/// as soon as the token is set. Never returns a non-terminal status.
pub fn wait_for_completion(
    farm: &dyn BuildFarm,
    handle: &BuildHandle,
    opts: &PollOptions,
    cancel: &CancelToken,
) -> Result<BuildStatus> {
    let mut interval = opts.initial_interval;

    for attempt in 1..=opts.max_attempts {
        if cancel.is_cancelled() {
            return Err(Error::poll_cancelled(handle.project.clone()));
        }

        let status = match farm.build_status(handle) {
            Ok(status) => status,
            Err(err) if err.code == ErrorCode::FarmNetwork => {
                log_status!(
                    "poll",
                    "Status query failed (attempt {}/{}): {}",
                    attempt,
                    opts.max_attempts,
                    err
                );
                BuildStatus::Unknown
            }
            Err(err) => return Err(err),
        };

        if status.is_terminal() {
            return Ok(status);
        }

        log_status!(
            "poll",
            "Build {} is {} (attempt {}/{})",
            handle.build_number,
            status.as_str(),
            attempt,
            opts.max_attempts
        );

        if attempt < opts.max_attempts {
            sleep_cancellable(interval, cancel);
            interval = (interval * 2).min(opts.max_interval);
        }
    }

    Err(Error::poll_timeout(
        opts.max_attempts,
        handle.project.clone(),
    ))
}

fn sleep_cancellable(total: Duration, cancel: &CancelToken) {
    let mut remaining = total;
    while !remaining.is_zero() && !cancel.is_cancelled() {
        let slice = remaining.min(CANCEL_POLL_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}
