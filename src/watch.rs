//! Inbox folder watching
//!
//! Blocking watch loop over an inbox directory: every PDF that lands there is
//! labeled into the output directory and the source is deleted on success. A
//! document rejected wholesale (no valid pages) stays in the inbox so it can
//! be retried or inspected manually, and one bad file never kills the loop.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::pdf::label::{label_document, LabelOptions};
use crate::report::Reporter;

/// Options for the watch loop
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory to watch for incoming manifest PDFs
    pub inbox: PathBuf,
    /// Directory receiving labeled output
    pub out_dir: PathBuf,
    /// Labeling options applied to every document
    pub label: LabelOptions,
}

/// How long a file's size must hold still before we treat the upload as done
const STABLE_INTERVAL: Duration = Duration::from_millis(500);
const STABLE_ATTEMPTS: u32 = 20;

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Wait until the file stops growing. Uploads over network shares arrive in
/// chunks and labeling a half-written PDF fails on a truncated xref.
fn wait_for_stable_size(path: &Path) -> Result<()> {
    let mut last_size = fs::metadata(path)?.len();
    for _ in 0..STABLE_ATTEMPTS {
        thread::sleep(STABLE_INTERVAL);
        let size = fs::metadata(path)?.len();
        if size == last_size && size > 0 {
            return Ok(());
        }
        last_size = size;
    }
    Err(Error::General(format!(
        "file did not stabilize: {}",
        path.display()
    )))
}

/// Label one inbox file into the output directory, deleting the source on
/// success. Rejections and failures leave the source in place.
fn process_file(path: &Path, options: &WatchOptions, reporter: &dyn Reporter) {
    let Some(file_name) = path.file_name() else {
        return;
    };
    let output = options.out_dir.join(file_name);

    match label_document(path, &output, &options.label, reporter) {
        Ok(stats) => {
            info!(
                input = %path.display(),
                output = %output.display(),
                pages = stats.pages,
                labeled = stats.labeled,
                marked = stats.marked,
                "labeled document"
            );
            if let Err(e) = fs::remove_file(path) {
                warn!(input = %path.display(), error = %e, "could not remove source");
            }
        }
        Err(Error::NoValidPages(_)) => {
            warn!(
                input = %path.display(),
                "no page validated; leaving source for manual inspection"
            );
        }
        Err(e) => {
            warn!(input = %path.display(), error = %e, "labeling failed; leaving source");
        }
    }
}

/// Watch the inbox until the process is terminated.
///
/// Pre-existing PDFs are processed first, then the loop handles arrivals as
/// the filesystem reports them.
pub fn watch_folder(options: &WatchOptions, reporter: &dyn Reporter) -> Result<()> {
    if !options.inbox.is_dir() {
        return Err(Error::FileNotFound(options.inbox.clone()));
    }
    fs::create_dir_all(&options.out_dir)?;

    // Backlog: anything already sitting in the inbox
    let mut backlog: Vec<PathBuf> = fs::read_dir(&options.inbox)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_pdf(path))
        .collect();
    backlog.sort();
    for path in backlog {
        process_file(&path, options, reporter);
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(&options.inbox, RecursiveMode::NonRecursive)?;

    info!(
        inbox = %options.inbox.display(),
        out_dir = %options.out_dir.display(),
        "watching for manifest PDFs"
    );

    for result in rx {
        let event: Event = result?;
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            continue;
        }
        for path in event.paths {
            // A processed file's delete also raises events; the exists()
            // check drops those
            if !is_pdf(&path) || !path.exists() {
                continue;
            }
            if let Err(e) = wait_for_stable_size(&path) {
                warn!(input = %path.display(), error = %e, "skipping unstable file");
                continue;
            }
            process_file(&path, options, reporter);
        }
    }

    Ok(())
}
