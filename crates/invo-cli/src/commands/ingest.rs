//! Ingest command - extract orders from invoice documents into the store.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::{glob_with, MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use invo_core::{
    BatchCoordinator, BatchObserver, DocumentOutcome, FileDocument, MergeOutcome, OrderStore,
};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Process a single file from the input directory
    #[arg(short, long, conflicts_with = "limit")]
    file: Option<String>,

    /// Process only the first N documents
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Directory containing invoice documents
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Order store file
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Documents validated before each store write
    #[arg(long)]
    chunk_size: Option<usize>,
}

/// Reports per-document and per-chunk progress on the terminal.
struct ProgressReporter {
    bar: ProgressBar,
}

impl BatchObserver for ProgressReporter {
    fn on_document(&mut self, outcome: &DocumentOutcome) {
        self.bar.inc(1);
        match outcome {
            DocumentOutcome::Valid { document, order_id } => {
                self.bar.set_message(format!("{} -> order {}", document, order_id));
            }
            DocumentOutcome::Skipped(e) => {
                self.bar
                    .suspend(|| println!("{} {}", style("✗").red(), e));
            }
        }
    }

    fn on_merge(&mut self, chunk: usize, outcome: &MergeOutcome) {
        let line = match outcome {
            MergeOutcome::NothingNew { duplicates } => format!(
                "{} Chunk {}: nothing new to save ({} already stored)",
                style("ℹ").blue(),
                chunk + 1,
                duplicates
            ),
            MergeOutcome::Persisted {
                accepted,
                duplicates,
                total,
            } => format!(
                "{} Chunk {}: saved {} order(s), skipped {} duplicate(s), {} in store",
                style("✓").green(),
                chunk + 1,
                accepted,
                duplicates,
                total
            ),
        };
        self.bar.suspend(|| println!("{}", line));
    }
}

pub fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    let input_dir = args.input_dir.unwrap_or(config.ingest.input_dir);
    let store_path = args.store.unwrap_or(config.store.path);
    let chunk_size = args.chunk_size.unwrap_or(config.ingest.chunk_size);

    let files = match args.file {
        Some(name) => {
            let path = input_dir.join(&name);
            if !path.is_file() {
                println!("{} File '{}' was not found.", style("✗").red(), path.display());
                return Ok(());
            }
            vec![path]
        }
        None => {
            let mut files = discover(&input_dir, &config.ingest.extensions)?;
            if files.is_empty() {
                println!(
                    "{} No invoice documents found in {}",
                    style("ℹ").blue(),
                    input_dir.display()
                );
                return Ok(());
            }

            let available = files.len();
            if let Some(limit) = args.limit {
                files.truncate(limit.clamp(1, available));
            }
            println!(
                "{} Processing {} of {} document(s)",
                style("ℹ").blue(),
                files.len(),
                available
            );
            files
        }
    };

    let documents: Vec<FileDocument> = files.into_iter().map(FileDocument::new).collect();
    let store = OrderStore::new(&store_path);
    let coordinator = BatchCoordinator::new(&store).with_chunk_size(chunk_size);

    let bar = ProgressBar::new(documents.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let mut reporter = ProgressReporter { bar };

    let report = coordinator.run_with(&documents, &mut reporter)?;
    reporter.bar.finish_and_clear();

    println!();
    println!(
        "{} Processed {} document(s) in {:?}",
        style("✓").green(),
        report.documents,
        start.elapsed()
    );
    println!(
        "   {} valid, {} skipped",
        style(report.validated).green(),
        style(report.skipped.len()).red()
    );
    println!(
        "   {} saved, {} duplicate(s) -> {}",
        style(report.accepted).green(),
        style(report.duplicates).yellow(),
        store.path().display()
    );

    if report.validated == 0 {
        println!();
        println!("{} No valid data was extracted.", style("ℹ").blue());
    }

    Ok(())
}

/// List input documents in `dir` with any of `extensions`, sorted by path.
fn discover(dir: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let base = Pattern::escape(&dir.to_string_lossy());

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", base, ext.trim_start_matches('.'));
        debug!("Scanning {}", pattern);
        files.extend(
            glob_with(&pattern, options)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file()),
        );
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.TXT", "c.png", "d.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let files = discover(dir.path(), &["pdf".to_string(), "txt".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.TXT", "b.pdf", "d.txt"]);
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover(&dir.path().join("nope"), &["pdf".to_string()]).unwrap();
        assert!(files.is_empty());
    }
}
