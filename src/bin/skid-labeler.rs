//! Skid Labeler CLI tool
//!
//! A command-line tool for stamping skid numbers and pack markers on
//! manufacturing manifest PDFs.

use clap::{Parser, Subcommand};
use glob::glob;
use std::path::PathBuf;
use std::process;

use lopdf::Document;
use tracing_subscriber::EnvFilter;

use skid_labeler::group::{GroupKey, GroupMap};
use skid_labeler::markone;
use skid_labeler::pdf::{label_document, LabelOptions, PageText, StampOptions};
use skid_labeler::record::PageRecord;
use skid_labeler::regions;
use skid_labeler::report::TracingReporter;
use skid_labeler::skid;
use skid_labeler::watch::{watch_folder, WatchOptions};
use skid_labeler::Error;

/// Skid Labeler - Stamp skid numbers on manifest PDFs
#[derive(Parser)]
#[command(name = "skid-labeler")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Label every manifest in the current directory
    skid-labeler label -o labeled *.pdf

    # Watch an inbox and label manifests as they arrive
    skid-labeler watch /srv/manifests/inbox -o /srv/manifests/labeled

    # Audit why a page was or was not marked
    skid-labeler inspect manifest.pdf")]
struct Cli {
    /// Enable trace-level per-page reporting
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label manifest PDFs with skid numbers
    Label {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory for labeled PDFs
        #[arg(short = 'o', long, default_value = "labeled")]
        out_dir: PathBuf,

        /// Skid index font size in points
        #[arg(long)]
        font_size: Option<f32>,
    },

    /// Watch an inbox folder and label manifests as they arrive
    Watch {
        /// Inbox directory to watch
        inbox: PathBuf,

        /// Output directory for labeled PDFs
        #[arg(short = 'o', long, default_value = "labeled")]
        out_dir: PathBuf,
    },

    /// Show the per-page extraction and decision audit for a manifest
    Inspect {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Label {
            inputs,
            out_dir,
            font_size,
        } => cmd_label(inputs, out_dir, font_size),
        Commands::Watch { inbox, out_dir } => cmd_watch(inbox, out_dir),
        Commands::Inspect { input } => cmd_inspect(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "skid_labeler=trace"
    } else {
        "skid_labeler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                return Err(format!("No files matched pattern: {}", pattern).into());
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    paths.sort();

    Ok(paths)
}

/// Label a batch of manifest PDFs
fn cmd_label(
    inputs: Vec<String>,
    out_dir: PathBuf,
    font_size: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = expand_globs(inputs)?;

    for path in &inputs {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }

    std::fs::create_dir_all(&out_dir)?;

    let mut options = LabelOptions::default();
    if let Some(size) = font_size {
        options.stamp = StampOptions {
            font_size: size,
            ..Default::default()
        };
    }

    for input in &inputs {
        let file_name = input
            .file_name()
            .ok_or_else(|| format!("Not a file: {}", input.display()))?;
        let output = out_dir.join(file_name);

        match label_document(input, &output, &options, &TracingReporter) {
            Ok(stats) => {
                eprintln!(
                    "{}: {} pages, {} labeled, {} marked, {} groups -> {}",
                    input.display(),
                    stats.pages,
                    stats.labeled,
                    stats.marked,
                    stats.groups,
                    output.display()
                );
            }
            Err(Error::NoValidPages(_)) => {
                eprintln!(
                    "{}: no page validated, skipped (source left in place)",
                    input.display()
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Watch an inbox folder until terminated
fn cmd_watch(inbox: PathBuf, out_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let options = WatchOptions {
        inbox,
        out_dir,
        label: LabelOptions::default(),
    };
    watch_folder(&options, &TracingReporter)?;
    Ok(())
}

/// Print the per-page extraction and decision audit for one manifest
fn cmd_inspect(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    let mut doc = Document::load(&input)?;
    doc.decompress();

    let pages: Vec<_> = doc.get_pages().values().copied().collect();
    println!("File: {}", input.display());
    println!("Pages: {}", pages.len());

    let mut texts = Vec::with_capacity(pages.len());
    let mut records: Vec<Option<PageRecord>> = Vec::with_capacity(pages.len());
    for (index, page_id) in pages.iter().enumerate() {
        let text = PageText::collect(&doc, *page_id)?;
        let dock_raw = text.in_region(&regions::DOCK_CODE);
        let order_raw = text.in_region(&regions::ORDER_NUMBER);
        match PageRecord::build(index, &dock_raw, &order_raw) {
            Ok(record) => records.push(Some(record)),
            Err(reason) => {
                println!(
                    "Page {}: REJECTED ({}) dock_raw='{}' order_raw='{}'",
                    index + 1,
                    reason,
                    dock_raw,
                    order_raw
                );
                records.push(None);
            }
        }
        texts.push(text);
    }

    let valid: Vec<PageRecord> = records.iter().flatten().cloned().collect();
    if valid.is_empty() {
        println!("No page validated; this document would be rejected wholesale.");
        return Ok(());
    }

    let groups = GroupMap::build(&valid);
    println!("Groups: {}", groups.len());

    for (index, _page_id) in pages.iter().enumerate() {
        let Some(record) = &records[index] else {
            continue;
        };
        let key = GroupKey::of(record);
        let group = groups
            .get(&key)
            .ok_or_else(|| format!("group missing for page {}", index + 1))?;
        let assignment = skid::assign(&group.sorted_indices(), record.original_index)?;
        let rule = markone::rule_for(&record.dock_code);
        let region_text = texts[index].in_region(&rule.region());
        let marked = rule.matches(&region_text);
        println!(
            "Page {}: dock='{}' order='{}' group={} stamp='{}' mark-one={}{}",
            index + 1,
            record.dock_code,
            record.order_number,
            key,
            assignment.stamp_text(),
            if marked { "yes" } else { "no" },
            if region_text.is_empty() {
                String::new()
            } else {
                format!(" (region text: '{}')", region_text.replace('\n', "\\n"))
            }
        );
    }

    Ok(())
}
