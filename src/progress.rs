use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::pipeline::ChunkFailure;

/// Receives progress of a document run
pub trait ProgressObserver {
    /// Called with a percentage in 0..=100, never decreasing within a run
    fn on_progress(&mut self, percent: u8);

    /// Called once for every chunk that fell back to its source text
    fn on_warning(&mut self, _failure: &ChunkFailure) {}
}

impl<F: FnMut(u8)> ProgressObserver for F {
    fn on_progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards all notifications
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _percent: u8) {}
}

/// Reports through the tracing subscriber
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&mut self, percent: u8) {
        info!("Translation progress: {}%", percent);
    }

    fn on_warning(&mut self, failure: &ChunkFailure) {
        warn!("{}", failure);
    }
}

/// Terminal progress bar for interactive runs
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(label.to_string());
        Self { bar }
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_progress(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
        if percent >= 100 {
            self.bar.finish();
        }
    }

    fn on_warning(&mut self, failure: &ChunkFailure) {
        self.bar.println(format!("warning: {}", failure));
    }
}

/// Forward-only completion counter for one document run
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            last: None,
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.completed.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    /// Report 0 at the start of a run
    pub fn start(&mut self, observer: &mut dyn ProgressObserver) {
        self.emit(0, observer);
    }

    /// Count `units` more as done and report the new percentage
    pub fn advance(&mut self, units: usize, observer: &mut dyn ProgressObserver) {
        self.completed = self.completed.saturating_add(units);
        let percent = self.percent();
        self.emit(percent, observer);
    }

    /// Report 100 unless it was already reported
    pub fn finish(&mut self, observer: &mut dyn ProgressObserver) {
        self.completed = self.total;
        self.emit(100, observer);
    }

    fn emit(&mut self, percent: u8, observer: &mut dyn ProgressObserver) {
        match self.last {
            Some(last) if percent <= last => {}
            _ => {
                self.last = Some(percent);
                observer.on_progress(percent);
            }
        }
    }
}
