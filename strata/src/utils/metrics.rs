#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use log::debug;

/// Measures how long labelled command scopes take to execute.
#[cfg(feature = "metrics")]
#[derive(Debug, Default)]
pub struct Metrics {
    scopes: Vec<(String, Instant)>,
}

#[cfg(feature = "metrics")]
impl Metrics {
    pub fn begin(&mut self, label: String) {
        self.scopes.push((label, Instant::now()));
    }

    pub fn end(&mut self) {
        if let Some((label, started_at)) = self.scopes.pop() {
            debug!(
                "{label}: {}",
                humantime::format_duration(started_at.elapsed())
            );
        }
    }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Metrics;

#[cfg(not(feature = "metrics"))]
impl Metrics {
    pub fn begin(&mut self, _: String) {}

    pub fn end(&mut self) {}
}
