//! Spider controller: mirror a remote tree onto local storage
//!
//! One synchronous session drives the whole run with one outstanding
//! request at a time. The finalize step (persist the mirror state,
//! close the session) runs no matter how the traversal ended, so a
//! failed or interrupted run never loses the progress already made.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveTime};
use filetime::FileTime;

use crate::error::{Result, SpiderError};
use crate::logger::Logger;
use crate::session::RemoteSession;
use crate::state::MirrorState;
use crate::walker::Walker;

/// Controller parameters
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Local root the remote hierarchy is recreated under
    pub target_dir: PathBuf,
    /// Durable state file location
    pub state_file: PathBuf,
    /// Progress messages to stdout
    pub verbose: bool,
    /// Walk and report without downloading or recording
    pub dry_run: bool,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("."),
            state_file: PathBuf::from("ftp_spider.json"),
            verbose: false,
            dry_run: false,
        }
    }
}

/// Outcome of one spidering run
#[derive(Debug, Default, Clone)]
pub struct SpiderStats {
    pub dirs_visited: u64,
    pub files_downloaded: u64,
    pub files_skipped: u64,
    pub bytes_downloaded: u64,
    pub errors: Vec<String>,
    pub completed: bool,
}

pub struct Spider<S: RemoteSession> {
    session: S,
    state: MirrorState,
    config: SpiderConfig,
    logger: Arc<dyn Logger>,
    shutdown: Arc<AtomicBool>,
}

impl<S: RemoteSession> Spider<S> {
    /// Load the mirror state and take exclusive ownership of the
    /// session for one run.
    pub fn new(
        session: S,
        config: SpiderConfig,
        logger: Arc<dyn Logger>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let state = MirrorState::load(&config.state_file)?;
        Ok(Self {
            session,
            state,
            config,
            logger,
            shutdown,
        })
    }

    /// Mirror everything under `starting_path`.
    ///
    /// Traversal failures are folded into the returned stats rather
    /// than propagated - the run ends "partially completed, state
    /// saved". The state file is written and the session closed on
    /// every path out of this function; `Err` is returned only when
    /// that final save itself fails.
    pub fn run(&mut self, starting_path: &str) -> Result<SpiderStats> {
        let start = Instant::now();
        let mut stats = SpiderStats::default();

        match self.crawl(starting_path, &mut stats) {
            Ok(()) => stats.completed = true,
            Err(e) => {
                self.logger.error("crawl", starting_path, &e.to_string());
                if self.config.verbose {
                    eprintln!("Run aborted: {e}");
                }
                stats.errors.push(e.to_string());
            }
        }

        // Finalize unconditionally: state first, then the session.
        let saved = self.state.save(&self.config.state_file);
        if let Err(e) = self.session.close() {
            self.logger.error("close", "-", &e.to_string());
        }
        self.logger.done(
            stats.files_downloaded,
            stats.bytes_downloaded,
            start.elapsed().as_secs_f64(),
        );
        saved?;
        Ok(stats)
    }

    fn crawl(&mut self, starting_path: &str, stats: &mut SpiderStats) -> Result<()> {
        let mut walker = Walker::new(starting_path);
        while let Some(record) = walker.next_dir(&mut self.session) {
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(SpiderError::Interrupted);
            }
            let record = record?;
            stats.dirs_visited += 1;
            self.logger.visit(&record.path);

            let local_dir = self.local_dir(&record.path);
            if !local_dir.exists() {
                if self.config.verbose {
                    println!("Creating directory {}", local_dir.display());
                }
                if !self.config.dry_run {
                    std::fs::create_dir_all(&local_dir)?;
                }
            }

            for file in &record.files {
                if self.shutdown.load(Ordering::SeqCst) {
                    return Err(SpiderError::Interrupted);
                }
                let remote_path = join_remote(&record.path, &file.name);

                if self.state.has_current_version(&remote_path, file.modified) {
                    stats.files_skipped += 1;
                    self.logger.skipped(&remote_path);
                    continue;
                }

                if self.config.dry_run {
                    println!("Would download {remote_path}");
                    stats.files_downloaded += 1;
                    continue;
                }

                if self.config.verbose {
                    println!("Downloading {remote_path}");
                }
                let bytes = self.download(&file.name, &local_dir, file.modified)?;
                stats.files_downloaded += 1;
                stats.bytes_downloaded += bytes;
                self.logger.fetched(&remote_path, bytes);
                // Recorded only after the full download succeeded.
                self.state.record(remote_path, file.modified);
            }
        }
        Ok(())
    }

    /// Retrieve `name` from the session's current directory into
    /// `local_dir`, appending to any partial file from an earlier
    /// attempt, and stamp the result with the listed date.
    fn download(&mut self, name: &str, local_dir: &Path, modified: NaiveDate) -> Result<u64> {
        let dest = local_dir.join(name);
        let mut out = OpenOptions::new().create(true).append(true).open(&dest)?;
        let bytes = self.session.retrieve(name, &mut out)?;
        drop(out);

        let stamp = modified.and_time(NaiveTime::MIN).and_utc().timestamp();
        filetime::set_file_mtime(&dest, FileTime::from_unix_time(stamp, 0))?;
        Ok(bytes)
    }

    /// Map a remote directory path onto the configured target root.
    fn local_dir(&self, remote_path: &str) -> PathBuf {
        let mut dir = self.config.target_dir.clone();
        for part in remote_path.split('/').filter(|p| !p.is_empty()) {
            dir.push(part);
        }
        dir
    }
}

/// Durable-state lookup key for a file inside a listed directory.
fn join_remote(dir_path: &str, name: &str) -> String {
    if dir_path.ends_with('/') {
        format!("{dir_path}{name}")
    } else {
        format!("{dir_path}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_keys_have_single_separator() {
        assert_eq!(join_remote("/", "a.txt"), "/a.txt");
        assert_eq!(join_remote("/pub", "a.txt"), "/pub/a.txt");
        assert_eq!(join_remote("/pub/sub", "b c.txt"), "/pub/sub/b c.txt");
    }
}
