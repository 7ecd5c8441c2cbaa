//! Merge progress bar.
//!
//! # Examples
//!
//! ```
//! use pdfstudio::output::progress::{ProgressBar, ProgressStyle};
//! use pdfstudio::services::MergeProgress;
//!
//! let mut progress = ProgressBar::new(3, ProgressStyle::Bar);
//! progress.set_message("Merging");
//! for current in 1..=3 {
//!     progress.report(MergeProgress { current, total: 3 });
//! }
//! progress.finish();
//! ```

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::services::MergeProgress;

/// Style of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Classic progress bar: [=====>    ]
    Bar,
    /// Simple counter: 3/10
    Counter,
}

/// Progress bar drawn on stderr.
#[derive(Debug)]
pub struct ProgressBar {
    total: usize,
    current: usize,
    style: ProgressStyle,
    message: Option<String>,
    start_time: Instant,
    enabled: bool,
}

impl ProgressBar {
    /// Create a new progress bar. Drawing is enabled when stderr is a terminal.
    pub fn new(total: usize, style: ProgressStyle) -> Self {
        Self {
            total,
            current: 0,
            style,
            message: None,
            start_time: Instant::now(),
            enabled: Self::is_terminal(),
        }
    }

    /// Create a disabled progress bar (no output).
    pub fn disabled() -> Self {
        let mut pb = Self::new(0, ProgressStyle::Counter);
        pb.enabled = false;
        pb
    }

    fn is_terminal() -> bool {
        use std::io::IsTerminal;
        io::stderr().is_terminal()
    }

    /// Set the message shown before the bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Record a merge progress report.
    pub fn report(&mut self, progress: MergeProgress) {
        self.total = progress.total;
        self.update(progress.current);
    }

    /// Move to `current` and redraw.
    pub fn update(&mut self, current: usize) {
        self.current = current;
        if self.enabled {
            eprint!("\r{}", self.line());
            io::stderr().flush().ok();
        }
    }

    /// Mark the progress bar as finished.
    pub fn finish(&mut self) {
        self.current = self.total;
        if self.enabled {
            eprintln!("\r{}", self.line());
        }
    }

    /// Current progress percentage.
    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            (self.current as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// The text that would be drawn.
    pub fn line(&self) -> String {
        let body = match self.style {
            ProgressStyle::Bar => self.render_bar(),
            ProgressStyle::Counter => format!("{}/{}", self.current, self.total),
        };
        let elapsed = format_duration(self.start_time.elapsed());

        match &self.message {
            Some(msg) => format!("{msg} {body} {elapsed}"),
            None => format!("{body} {elapsed}"),
        }
    }

    fn render_bar(&self) -> String {
        let width = 30;
        let filled = (width * self.current) / self.total.max(1);
        let filled = filled.min(width);
        let arrow = if filled > 0 { ">" } else { "" };
        format!(
            "[{}{arrow}{}] {:.0}% {}/{}",
            "=".repeat(filled.saturating_sub(1)),
            " ".repeat(width - filled),
            self.percent(),
            self.current,
            self.total
        )
    }
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_tracks_total() {
        let mut pb = ProgressBar::disabled();
        pb.report(MergeProgress {
            current: 1,
            total: 4,
        });
        assert_eq!(pb.percent(), 25.0);
    }

    #[test]
    fn test_bar_line() {
        let mut pb = ProgressBar::disabled();
        pb.style = ProgressStyle::Bar;
        pb.report(MergeProgress {
            current: 2,
            total: 2,
        });
        let line = pb.line();
        assert!(line.starts_with(&format!("[{}>]", "=".repeat(29))));
        assert!(line.contains("100% 2/2"));
    }

    #[test]
    fn test_counter_line_with_message() {
        let mut pb = ProgressBar::disabled();
        pb.set_message("Merging");
        pb.report(MergeProgress {
            current: 1,
            total: 3,
        });
        assert!(pb.line().starts_with("Merging 1/3 "));
    }

    #[test]
    fn test_percent_zero_total() {
        let pb = ProgressBar::new(0, ProgressStyle::Bar);
        assert_eq!(pb.percent(), 0.0);
    }

    #[test]
    fn test_finish() {
        let mut pb = ProgressBar::disabled();
        pb.report(MergeProgress {
            current: 1,
            total: 5,
        });
        pb.finish();
        assert_eq!(pb.current, 5);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }
}
