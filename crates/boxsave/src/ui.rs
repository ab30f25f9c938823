//! Terminal rendering of client notifications

use boxsave_client::{UiObserver, percent_of};
use std::io::{self, Write};

/// Writes status lines and a single in-place progress line to stdout
#[derive(Debug, Default)]
pub struct ConsoleUi;

impl UiObserver for ConsoleUi {
    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn info_inline(&self, message: &str) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "{} ", message);
        let _ = out.flush();
    }

    fn clear_line(&self) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K");
        let _ = out.flush();
    }

    fn report_progress(&self, sent: u64, total: u64) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "{}", progress_line(sent, total));
        let _ = out.flush();
    }
}

fn progress_line(sent: u64, total: u64) -> String {
    format!(
        "Progress: {}% ({} / {} bytes)",
        percent_of(sent, total),
        sent,
        total
    )
}
