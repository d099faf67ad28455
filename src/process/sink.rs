use tracing::{error, info};

/// Receives progress and user-facing messages from a scoring run.
pub trait ProgressSink {
    /// `percent` is in `0..=100`.
    fn set_progress(&mut self, percent: u8);
    fn report_error(&mut self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn set_progress(&mut self, _percent: u8) {}
    fn report_error(&mut self, _message: &str) {}
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn set_progress(&mut self, percent: u8) {
        info!(percent, "progress");
    }

    fn report_error(&mut self, message: &str) {
        error!("{}", message);
    }
}

/// Collects every call; handy for inspecting a run after the fact.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub progress: Vec<u8>,
    pub messages: Vec<String>,
}

impl ProgressSink for RecordingSink {
    fn set_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn report_error(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
