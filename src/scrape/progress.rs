//! Progress reporting abstraction
//!
//! Decouples page fetching from UI concerns (indicatif).

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// A handle to an active progress bar
pub trait ProgressHandle {
    /// Total becomes known after the first page
    fn set_length(&self, len: u64);
    fn set_position(&self, pos: u64);
    fn finish(&self);
}

/// Factory for creating progress handles
pub trait ProgressReporter {
    fn start(&self, label: &str) -> Box<dyn ProgressHandle>;
}

/// Indicatif-based progress reporter for CLI usage (draws on stderr)
pub struct IndicatifProgress;

impl ProgressReporter for IndicatifProgress {
    fn start(&self, label: &str) -> Box<dyn ProgressHandle> {
        let pb = ProgressBar::no_length();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} {}: [{{bar:50.cyan/blue}}] page {{pos}}/{{len}} ({{elapsed}})",
                    label
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Box::new(IndicatifHandle(pb))
    }
}

struct IndicatifHandle(ProgressBar);

impl ProgressHandle for IndicatifHandle {
    fn set_length(&self, len: u64) {
        self.0.set_length(len);
    }

    fn set_position(&self, pos: u64) {
        self.0.set_position(pos);
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

/// No-op progress reporter for tests and quiet mode
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _label: &str) -> Box<dyn ProgressHandle> {
        Box::new(NoopHandle)
    }
}

struct NoopHandle;

impl ProgressHandle for NoopHandle {
    fn set_length(&self, _len: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn finish(&self) {}
}

/// Progress reporter that only shows output when verbose
pub struct VerboseProgress {
    verbose: bool,
}

impl VerboseProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for VerboseProgress {
    fn start(&self, label: &str) -> Box<dyn ProgressHandle> {
        if self.verbose {
            IndicatifProgress.start(label)
        } else {
            NoopProgress.start(label)
        }
    }
}
