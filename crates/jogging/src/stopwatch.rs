use std::time::Instant;

use chrono::Duration;
use utility::serde::duration_clock;

/// Measures the time spent following a route. Owned by the jog it times.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self {
            started_at: None,
            accumulated: Duration::zero(),
        }
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated = self.accumulated + since(started_at);
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.accumulated + since(started_at),
            None => self.accumulated,
        }
    }

    /// `hh:mm:ss`
    pub fn display(&self) -> String {
        duration_clock::format(&self.elapsed())
    }
}

fn since(instant: Instant) -> Duration {
    Duration::from_std(instant.elapsed()).unwrap_or_else(|_| Duration::zero())
}
