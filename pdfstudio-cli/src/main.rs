//! pdfstudio - Arrange pages from many PDF files into a single document.
//!
//! Headless driver over the page-ordering engine: import, replay a plan,
//! then merge.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::process;

use crate::cli::Cli;
use crate::logging::{LogConfig, init_logging};
use pdfstudio::config::OverwriteMode;
use pdfstudio::edit::PdfEditor;
use pdfstudio::error::StudioError;
use pdfstudio::io::PdfReader;
use pdfstudio::merge::PdfMerger;
use pdfstudio::output::{OutputFormatter, ProgressBar, ProgressStyle, display_cards, display_request};
use pdfstudio::plan::Plan;
use pdfstudio::utils::format_file_size;
use pdfstudio::Workspace;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_flags(cli.verbose, cli.quiet));

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err
            .downcast_ref::<StudioError>()
            .map_or(1, StudioError::exit_code);
        process::exit(code);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    cli.validate()?;
    let config = cli.to_config()?;
    let inputs = cli.resolve_inputs()?;
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfstudio::NAME, pdfstudio::VERSION));
        formatter.blank_line();
    }

    formatter.info(&format!("Importing {} file(s)...", inputs.len()));
    let mut workspace = Workspace::with_config(&config);
    workspace.import(&PdfReader::new(), &inputs).await;

    if formatter.is_verbose() {
        for doc in workspace.documents() {
            let title = doc.title().map(|t| format!(" \"{t}\"")).unwrap_or_default();
            formatter.detail(doc.name(), &format!("{} page(s){title}", doc.page_count()));
        }
    }

    if let Some(path) = &cli.plan {
        let plan = Plan::from_json_file(path)
            .with_context(|| format!("Could not load plan {}", path.display()))?;
        formatter.info(&format!("Applying plan ({} step(s))...", plan.len()));

        let summary = plan.apply(&mut workspace, &PdfEditor::new()).await?;
        for (file, reason) in &summary.persist_failures {
            formatter.warning(&format!(
                "Rotation not saved to {}: {reason}",
                file.display()
            ));
        }
        formatter.debug(&format!(
            "{} of {} step(s) changed the arrangement",
            summary.changed, summary.applied
        ));
    }

    let request = workspace.build_request()?;
    let output = config.output_path();

    if cli.dry_run {
        display_cards(&formatter, &workspace.cards());
        display_request(&formatter, &request);
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!("  Output would be: {}", output.display()));
        formatter.info("  Run without --dry-run to create the merged PDF");
        return Ok(());
    }

    handle_output_overwrite(&output, config.overwrite_mode, &formatter)?;

    formatter.info("Merging documents...");
    let merger = PdfMerger::new()
        .with_compression(config.compression)
        .with_jobs(config.effective_jobs());

    let mut progress = if formatter.should_print() {
        ProgressBar::new(request.len(), ProgressStyle::Bar)
    } else {
        ProgressBar::disabled()
    };
    progress.set_message("Merging");

    let outcome = workspace
        .merge_with_progress(&merger, &output, |report| progress.report(report))
        .await?;
    progress.finish();

    if formatter.should_print() {
        let size = std::fs::metadata(&outcome.output_path)
            .map(|meta| format_file_size(meta.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        formatter.blank_line();
        formatter.success(&format!(
            "Successfully created {} ({} page(s), {size})",
            outcome.output_path.display(),
            outcome.total_pages
        ));
        formatter.detail("Segments", &request.len().to_string());
        formatter.detail("Compression", &format!("{:?}", config.compression));
    }

    Ok(())
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    output: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<(), StudioError> {
    if !output.exists() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(StudioError::output_exists(output)),
        OverwriteMode::Prompt => {
            // In quiet mode, treat as no-clobber
            if formatter.is_quiet() {
                return Err(StudioError::output_exists(output));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                output.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| StudioError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(StudioError::Cancelled)
            }
        }
    }
}
