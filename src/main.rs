//! ftpspider - polite incremental FTP mirroring
//!
//! Design goals:
//! - One outstanding request to the remote server at a time
//! - Unbounded directory depth without native recursion
//! - Repeat runs download only new or modified files

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ftpspider::logger::{Logger, NoopLogger, TextLogger};
use ftpspider::progress::SpinnerProgress;
use ftpspider::session::FtpSession;
use ftpspider::spider::{Spider, SpiderConfig};
use ftpspider::url::{parse_remote_url, DEFAULT_PORT};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "FtpSpider - polite incremental FTP mirroring with resumable state"
)]
struct Args {
    /// FTP host, or ftp://[user[:pass]@]host[:port][/path] URL
    remote: String,

    /// User name (overrides URL userinfo)
    #[arg(short, long)]
    user: Option<String>,

    /// Password (overrides URL userinfo)
    #[arg(short, long)]
    password: Option<String>,

    /// Control connection port (overrides URL port)
    #[arg(long)]
    port: Option<u16>,

    /// Remote directory to start from (overrides URL path)
    #[arg(long = "path")]
    start_path: Option<String>,

    /// Local directory the remote tree is mirrored under
    #[arg(short, long, default_value = ".")]
    target: PathBuf,

    /// Durable state file recording already-downloaded files
    #[arg(long = "state-file", default_value = "ftp_spider.json")]
    state_file: PathBuf,

    /// Show each directory and download as it happens
    #[arg(short, long)]
    verbose: bool,

    /// List what would be downloaded without transferring anything
    #[arg(short = 'l', long, alias = "list-only")]
    dry_run: bool,

    /// Write timestamped log entries to file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ctrl-C requests a polite stop; the controller still saves state.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupted by user. Stopping and saving state...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl-C handler")?;
    }

    // The URL form carries host, port, credentials, and start path in
    // one string; explicit flags win over it.
    let (host, url_port, url_user, url_pass, url_path) = match parse_remote_url(&args.remote) {
        Some(t) => (t.host, t.port, t.user, t.password, t.path),
        None => (
            args.remote.clone(),
            DEFAULT_PORT,
            "anonymous".to_string(),
            String::new(),
            "/".to_string(),
        ),
    };
    let port = args.port.unwrap_or(url_port);
    let user = args.user.clone().unwrap_or(url_user);
    let password = args.password.clone().unwrap_or(url_pass);
    let start_path = args.start_path.clone().unwrap_or(url_path);

    let logger: Arc<dyn Logger> = if let Some(ref p) = args.log_file {
        match TextLogger::new(p) {
            Ok(l) => Arc::new(l),
            Err(_) => Arc::new(NoopLogger),
        }
    } else if !args.verbose && !args.dry_run {
        Arc::new(SpinnerProgress::new())
    } else {
        Arc::new(NoopLogger)
    };

    let start = Instant::now();

    if args.verbose {
        println!(
            "FtpSpider {} - connecting to {}:{}",
            env!("CARGO_PKG_VERSION"),
            host,
            port
        );
    }
    if args.dry_run {
        println!("DRY RUN MODE - No files will be downloaded");
    }

    let mut session = FtpSession::connect(&host, port)
        .with_context(|| format!("Failed to connect to {}:{}", host, port))?;
    session
        .login(&user, &password)
        .with_context(|| format!("Login failed for user {}", user))?;
    logger.start(&host, &start_path);

    let config = SpiderConfig {
        target_dir: args.target.clone(),
        state_file: args.state_file.clone(),
        verbose: args.verbose,
        dry_run: args.dry_run,
    };
    let mut spider = Spider::new(session, config, logger, shutdown)?;
    let stats = spider.run(&start_path)?;

    // Print summary (always show)
    let elapsed = start.elapsed();
    println!();
    println!(
        "=== {} ===",
        if args.dry_run {
            "Dry Run Complete"
        } else {
            "Mirror Complete"
        }
    );
    println!("Directories visited: {}", stats.dirs_visited);
    println!("Files downloaded: {}", stats.files_downloaded);
    println!("Files skipped: {}", stats.files_skipped);
    println!(
        "Total size: {:.2} MB",
        stats.bytes_downloaded as f64 / 1_048_576.0
    );
    println!("Time: {:.2}s", elapsed.as_secs_f64());

    if !stats.errors.is_empty() {
        println!("\nErrors encountered: {}", stats.errors.len());
        for error in &stats.errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(1);
    }

    Ok(())
}
