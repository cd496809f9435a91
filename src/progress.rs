//! Spinner progress for interactive runs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::logger::Logger;

/// indicatif spinner fed through the Logger seam: the bottom line
/// tracks directories visited and files fetched while the crawl runs.
pub struct SpinnerProgress {
    spinner: ProgressBar,
    dirs: AtomicU64,
    files: AtomicU64,
    bytes: AtomicU64,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner,
            dirs: AtomicU64::new(0),
            files: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    fn refresh(&self, current: &str) {
        let dirs = self.dirs.load(Ordering::Relaxed);
        let files = self.files.load(Ordering::Relaxed);
        let mb = self.bytes.load(Ordering::Relaxed) as f64 / 1_048_576.0;
        self.spinner
            .set_message(format!("{dirs} dirs, {files} files ({mb:.1} MB) - {current}"));
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for SpinnerProgress {
    fn start(&self, host: &str, path: &str) {
        self.spinner.set_message(format!("spidering {host}{path}"));
    }

    fn visit(&self, path: &str) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
        self.refresh(path);
    }

    fn fetched(&self, path: &str, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.refresh(path);
    }

    fn error(&self, _context: &str, path: &str, msg: &str) {
        self.spinner.suspend(|| eprintln!("error: {path}: {msg}"));
    }

    fn done(&self, files: u64, bytes: u64, seconds: f64) {
        self.spinner.finish_with_message(format!(
            "done: {} files ({:.1} MB) in {:.1}s",
            files,
            bytes as f64 / 1_048_576.0,
            seconds
        ));
    }
}
