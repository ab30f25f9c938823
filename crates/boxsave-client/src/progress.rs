//! Upload progress tracking
//!
//! The percentage arithmetic is a pure function so it can be tested without
//! a network or a terminal. [`ProgressTracker`] feeds its results to a
//! [`UiObserver`] supplied by the caller.

use std::sync::Arc;

/// UI surface notified while an operation runs
///
/// Calls happen inline with the upload, on whatever task drives the request
/// body, so implementations should return quickly.
pub trait UiObserver: Send + Sync {
    /// Show a status message
    fn info(&self, message: &str);

    /// Show a label without ending the line, so progress renders after it
    fn info_inline(&self, message: &str) {
        self.info(message);
    }

    /// Erase the current progress line
    fn clear_line(&self);

    /// Render progress as `sent` of `total` bytes
    fn report_progress(&self, sent: u64, total: u64);
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUi;

impl UiObserver for NoopUi {
    fn info(&self, _message: &str) {}
    fn clear_line(&self) {}
    fn report_progress(&self, _sent: u64, _total: u64) {}
}

/// How the UI should draw an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// Clear the previous progress line, then draw the new one in its place
    ReplaceLine,
}

/// A progress change worth showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub sent: u64,
    pub total: u64,
    pub render: Render,
}

/// Rounded (half-up) percentage of `sent` over `total`. An empty total is complete.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    ((sent * 200 + total) / (total * 2)) as u8
}

/// Decide whether a progress tick should be shown
///
/// Returns `None` when the rounded percentage equals `previous`.
pub fn next_progress(sent: u64, total: u64, previous: Option<u8>) -> Option<ProgressUpdate> {
    let percent = percent_of(sent, total);
    if previous == Some(percent) {
        return None;
    }
    Some(ProgressUpdate {
        percent,
        sent: sent.min(total),
        total,
        render: Render::ReplaceLine,
    })
}

/// Tracks bytes handed to the transport for one upload
pub struct ProgressTracker {
    total: u64,
    sent: u64,
    last_percent: Option<u8>,
    ui: Arc<dyn UiObserver>,
}

impl ProgressTracker {
    pub fn new(total: u64, ui: Arc<dyn UiObserver>) -> Self {
        Self {
            total,
            sent: 0,
            last_percent: None,
            ui,
        }
    }

    /// Emit the initial notification before any byte is sent
    pub fn start(&mut self) {
        self.tick();
    }

    /// Record `bytes` more sent
    pub fn advance(&mut self, bytes: u64) {
        self.sent = self.sent.saturating_add(bytes).min(self.total);
        self.tick();
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    fn tick(&mut self) {
        if let Some(update) = next_progress(self.sent, self.total, self.last_percent) {
            self.last_percent = Some(update.percent);
            match update.render {
                Render::ReplaceLine => {
                    self.ui.clear_line();
                    self.ui.report_progress(update.sent, update.total);
                }
            }
        }
    }
}
