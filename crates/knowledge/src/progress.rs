//! Structured progress reporting for ingestion.

use std::sync::Arc;
use std::time::Instant;

/// Ingestion phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Parse,
    Chunk,
    Embed,
    Upsert,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discover => "discover",
            Phase::Parse => "parse",
            Phase::Chunk => "chunk",
            Phase::Embed => "embed",
            Phase::Upsert => "upsert",
        }
    }
}

/// Progress event emitted during ingestion.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Units of work done so far in this phase
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    /// Percentage complete (0.0 - 100.0), when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase.as_str(), progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events to tracing and an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    fn emit(&self, phase: Phase, current: u64, total: Option<u64>, message: String) {
        let event = ProgressEvent {
            phase,
            current,
            total,
            message,
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = event.phase.as_str(),
            current = event.current,
            total = ?event.total,
            elapsed_secs = event.elapsed_secs,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn discover(&self, found: u64, root: &str) {
        self.emit(Phase::Discover, found, None, format!("scanning {}", root));
    }

    pub fn parse(&self, current: u64, total: u64, file: &str) {
        self.emit(Phase::Parse, current, Some(total), format!("reading {}", file));
    }

    pub fn chunk(&self, current: u64, total: u64, chunks_created: usize) {
        self.emit(
            Phase::Chunk,
            current,
            Some(total),
            format!("{} chunks created", chunks_created),
        );
    }

    pub fn embed(&self, current: u64, total: u64, model: &str) {
        self.emit(Phase::Embed, current, Some(total), format!("model={}", model));
    }

    pub fn upsert(&self, points: u64, collection: &str) {
        self.emit(
            Phase::Upsert,
            points,
            Some(points),
            format!("writing to {}", collection),
        );
    }
}
