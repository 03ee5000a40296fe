//! Tracing setup and lightweight timing helpers.
//!
//! `tracing` + `tracing-subscriber`, with a span per pipeline step/loop
//! iteration and a small `Logger` for CLI-facing timing summaries.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `verbose` raises the default filter from `info` to `debug` when the
/// caller did not set `RUST_LOG` explicitly.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "autoplan=debug,info" } else { "autoplan=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if verbose {
        let _ = builder.with_target(true).with_line_number(true).try_init();
    } else {
        let _ = builder.with_target(false).compact().try_init();
    }
}

/// Open a span for one pipeline step or execution-loop iteration.
pub fn phase_span(run_id: &str, phase: &str) -> tracing::Span {
    tracing::info_span!("phase", run_id = %run_id, phase = %phase)
}

pub fn log_phase_start(run_id: &str, phase: &str) {
    tracing::info!(run_id = %run_id, phase = %phase, "phase started");
}

pub fn log_phase_complete(run_id: &str, phase: &str, elapsed: Duration) {
    tracing::info!(
        run_id = %run_id,
        phase = %phase,
        elapsed_ms = elapsed.as_millis() as u64,
        "phase complete"
    );
}

pub fn log_phase_error(run_id: &str, phase: &str, error: &str) {
    tracing::error!(run_id = %run_id, phase = %phase, error = %error, "phase failed");
}

/// CLI-facing timing tracker, surfaced by `--verbose` runs and `autoplan status`.
#[derive(Debug)]
pub struct Logger {
    verbose: bool,
    start_time: Instant,
    operation_timings: HashMap<String, Vec<Duration>>,
    run_id: Option<String>,
    phase: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            start_time: Instant::now(),
            operation_timings: HashMap::new(),
            run_id: None,
            phase: None,
        }
    }

    pub fn set_run_id(&mut self, run_id: impl Into<String>) {
        self.run_id = Some(run_id.into());
    }

    pub fn set_phase(&mut self, phase: impl Into<String>) {
        self.phase = Some(phase.into());
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose {
            tracing::debug!(run_id = ?self.run_id, phase = ?self.phase, "{message}");
        }
    }

    pub fn info(&self, message: &str) {
        tracing::info!(run_id = ?self.run_id, phase = ?self.phase, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(run_id = ?self.run_id, phase = ?self.phase, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(run_id = ?self.run_id, phase = ?self.phase, "{message}");
    }

    /// Record a timing sample for `operation`.
    pub fn record_timing(&mut self, operation: &str, elapsed: Duration) {
        self.operation_timings
            .entry(operation.to_string())
            .or_default()
            .push(elapsed);
    }

    /// Time a closure and record the sample under `operation`.
    pub fn time_operation<T>(&mut self, operation: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record_timing(operation, start.elapsed());
        result
    }

    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average duration recorded for `operation`, if any samples exist.
    #[must_use]
    pub fn average_timing(&self, operation: &str) -> Option<Duration> {
        let samples = self.operation_timings.get(operation)?;
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().sum();
        Some(total / samples.len() as u32)
    }
}
