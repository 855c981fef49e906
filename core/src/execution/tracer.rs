//! Trace side-channel and cancellation
//!
//! A [`TraceSink`] receives one human-readable line per completed
//! augmentation. Sinks are purely observational: the engine never reads
//! anything back from them.
//!
//! A [`CancellationToken`] is polled by the engine once per outer iteration,
//! before each path search, so a cancelled run always stops on a whole number
//! of completed augmentations.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::algorithm::traits::Capacity;

/// Log target used by [`LogTraceSink`]
pub const TRACE_TARGET: &str = "flowtrace::trace";

/// Receiver of per-step trace lines
pub trait TraceSink {
    fn record(&mut self, line: &str);
}

impl<F> TraceSink for F
where
    F: FnMut(&str),
{
    fn record(&mut self, line: &str) {
        self(line)
    }
}

/// Forwards trace lines to the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogTraceSink {
    level: log::Level,
}

impl LogTraceSink {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogTraceSink {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl TraceSink for LogTraceSink {
    fn record(&mut self, line: &str) {
        log::log!(target: TRACE_TARGET, self.level, "{}", line);
    }
}

/// Keeps every trace line in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingTraceSink {
    lines: Vec<String>,
}

impl CollectingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl TraceSink for CollectingTraceSink {
    fn record(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

/// Renders `Step <n>: path=<A -> B -> C>, bottleneck=<b>, cumulative=<c>`
pub fn format_step_line<N: Display>(step: usize, path: &[N], bottleneck: Capacity, cumulative: Capacity) -> String {
    let path = path
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    format!("Step {step}: path={path}, bottleneck={bottleneck}, cumulative={cumulative}")
}

/// Cooperative cancellation flag with an optional deadline
///
/// Clones share the flag, so a token handed to a run can be cancelled from
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that reports cancellation once `deadline` has passed
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Token expiring after `timeout`; a timeout past the clock's range
    /// means no deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
