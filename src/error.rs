//! Error types for ftpspider
//!
//! Library code returns `SpiderError`; the binary wraps everything in
//! anyhow at its boundary. A malformed listing line always fails the
//! parse rather than being skipped, session failures end the run but
//! never prevent state finalization, and no timestamp is recorded for
//! a file that did not fully download.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpiderError {
    /// A directory listing line the parser cannot interpret
    #[error("malformed listing entry: {line:?}")]
    MalformedListing { line: String },

    /// Connection, listing, or retrieval failure on the FTP session
    #[error("session error: {0}")]
    Session(#[from] suppaftp::FtpError),

    /// Cannot create a local directory or write a local file
    #[error("local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// State file could not be decoded or encoded
    #[error("state file error: {0}")]
    State(#[from] serde_json::Error),

    /// Run stopped by an external signal
    #[error("interrupted by signal")]
    Interrupted,
}

/// Result type alias for SpiderError
pub type Result<T> = std::result::Result<T, SpiderError>;
