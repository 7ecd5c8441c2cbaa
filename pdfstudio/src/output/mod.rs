//! User-facing output for the CLI.
//!
//! Status text is separate from `tracing` logs: the formatter prints what a
//! user asked to see, logs record what the engine did.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstudio::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, true);
//! formatter.info("Importing 3 file(s)");
//! formatter.success("Merge completed successfully");
//! ```

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::{ProgressBar, ProgressStyle};

use crate::grouping::Card;
use crate::request::{FilePayload, MergeRequest};
use crate::utils::format_page_range;

/// One line describing a card in the grid.
pub fn card_line(card: &Card) -> String {
    match card {
        Card::File(file) => {
            let pages: Vec<usize> = file.source_page_indices.iter().map(|i| i + 1).collect();
            format!(
                "[{}] {} (pages {}, collapsed)",
                file.flat_index,
                file.name,
                format_page_range(&pages)
            )
        }
        Card::Page(page) => {
            let mut line = format!(
                "[{}] {} p.{}",
                page.flat_index,
                page.name,
                page.source_page_index + 1
            );
            if !page.rotation.is_upright() {
                line.push_str(&format!(" ↻{}°", page.rotation.as_degrees()));
            }
            line
        }
    }
}

/// One line describing a merge segment.
pub fn segment_line(segment: &FilePayload) -> String {
    let pages = match &segment.pages {
        Some(pages) => {
            let numbers: Vec<usize> = pages.iter().map(|i| i + 1).collect();
            format!("pages {}", format_page_range(&numbers))
        }
        None => "all pages".to_string(),
    };
    format!("{} ({pages})", segment.path.display())
}

/// Print the card grid.
pub fn display_cards(formatter: &OutputFormatter, cards: &[Card]) {
    formatter.section(&format!("Cards ({})", cards.len()));
    for card in cards {
        formatter.info(&format!("  {}", card_line(card)));
    }
}

/// Print the segments a merge would produce.
pub fn display_request(formatter: &OutputFormatter, request: &MergeRequest) {
    let pages = request
        .total_pages()
        .map(|n| format!(", {n} page(s)"))
        .unwrap_or_default();
    formatter.section(&format!("Merge plan: {} segment(s){pages}", request.len()));
    for (index, segment) in request.files.iter().enumerate() {
        formatter.list_item(index + 1, &segment_line(segment));
    }
}
