//! checksync monitor - keeps a markdown task list in step with a task manager.
//!
//! # Commands
//!
//! - `checksync run`: Watch the document, sync completions and tidy it
//! - `checksync check <old> <new>`: Print the completion changes between two files
//! - `checksync tidy`: Move completed tasks and fix header counts once
//!
//! # Environment Variables
//!
//! See the `checksync_monitor::config` module for available configuration options.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use checksync_engine::reconcile::HeaderCount;
use checksync_engine::{ChangeDetector, LineClassifier, Reconciler};
use checksync_monitor::config::Config;
use checksync_monitor::daemon::{build_engine, handle_document_event, init_logging};
use checksync_monitor::notifier::LogNotifier;
use checksync_monitor::watcher::DocumentWatcher;

/// checksync - checkbox completion sync for markdown task lists.
///
/// Watches a markdown document, pushes checkbox completion changes to a
/// task manager and keeps a "Completed" section with accurate counts.
#[derive(Parser, Debug)]
#[command(name = "checksync")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    CHECKSYNC_DOCUMENT            Document to watch (required for 'run' and 'tidy')
    CHECKSYNC_DETECTION           key-mapped | positional (default: key-mapped)
    CHECKSYNC_RECONCILE           per-event | batch (default: per-event)
    CHECKSYNC_MOVE_COMPLETED      Move completed tasks (default: true)
    CHECKSYNC_COMPLETED_HEADER    Completed section name (default: Completed)
    CHECKSYNC_PENDING_HEADER      Pending section name (default: Pending)
    CHECKSYNC_COUNT_SUFFIX        Header count suffix (default: 个)
    CHECKSYNC_LINK_SCHEME         Task link scheme (default: omnifocus)
    CHECKSYNC_KEEP_DOTTED_SUFFIX  Keep .N in task identifiers (default: false)
    CHECKSYNC_TASKS_URL           Task manager URL (enables remote sync)
    CHECKSYNC_DUE_GRACE_DAYS      Due date grace period, 0-1 (default: 0)
    CHECKSYNC_DEBOUNCE_MS         File event quiet period (default: 100)

EXAMPLES:
    # Watch a daily note and sync completions
    export CHECKSYNC_DOCUMENT=~/notes/today.md
    export CHECKSYNC_TASKS_URL=http://localhost:8080
    checksync run

    # Show what changed between two versions
    checksync check before.md after.md

    # Tidy the document once
    checksync tidy
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the document and keep it in sync.
    ///
    /// Requires CHECKSYNC_DOCUMENT.
    Run,

    /// Print the completion changes between two versions of a document.
    Check {
        /// Previous version.
        old: PathBuf,

        /// Current version.
        new: PathBuf,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Move completed tasks into the completed section and fix header counts.
    ///
    /// Requires CHECKSYNC_DOCUMENT.
    Tidy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { old, new, json } => run_check(&old, &new, json),
        Command::Tidy => run_tidy(),
        Command::Run => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_monitor())
        }
    }
}

/// Runs the check command.
fn run_check(old: &Path, new: &Path, json: bool) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let old_content = std::fs::read_to_string(old)
        .with_context(|| format!("Failed to read {}", old.display()))?;
    let new_content = std::fs::read_to_string(new)
        .with_context(|| format!("Failed to read {}", new.display()))?;

    let classifier = LineClassifier::new(&config.engine.link_scheme, config.engine.suffix_policy)
        .context("Invalid link scheme")?;
    let detector = ChangeDetector::new(classifier, config.engine.detection);
    let events = detector.detect(&old_content, &new_content);

    if json {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        return Ok(());
    }

    if events.is_empty() {
        println!("No completion changes.");
    }
    for event in &events {
        let mark = if event.completed { "[x]" } else { "[ ]" };
        let reference = event
            .reference
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!("{mark} {reference:<12} {}", event.line.trim());
    }

    let counts = Reconciler::new(config.engine.sections.clone()).section_counts(&new_content);
    print_header_count(&config.engine.sections.completed, counts.completed);
    print_header_count(&config.engine.sections.pending, counts.pending);

    Ok(())
}

fn print_header_count(name: &str, count: Option<HeaderCount>) {
    let Some(count) = count else {
        return;
    };
    let stated = count
        .stated
        .map_or_else(|| "none".to_string(), |n| n.to_string());
    let status = if count.is_accurate() { "ok" } else { "stale" };
    println!(
        "## {name}: stated {stated}, actual {} ({status})",
        count.actual
    );
}

/// Runs the tidy command.
fn run_tidy() -> Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    let document = config.require_document()?;

    let mut engine = build_engine(&config, document, Arc::new(LogNotifier))
        .context("Failed to initialize engine")?;

    if engine.tidy().context("Failed to tidy document")? {
        println!("Updated {}", document.display());
    } else {
        println!("{} is already tidy", document.display());
    }

    Ok(())
}

/// Runs the monitor daemon.
async fn run_monitor() -> Result<()> {
    init_logging();

    info!("Starting checksync monitor");

    let config = Config::from_env().context("Failed to load configuration")?;
    let document = config.require_document()?.to_path_buf();

    info!(
        document = %document.display(),
        detection = ?config.engine.detection,
        reconcile = ?config.engine.reconcile,
        remote_sync = config.tasks_url.is_some(),
        "Configuration loaded"
    );

    let mut engine = build_engine(&config, &document, Arc::new(LogNotifier))
        .context("Failed to initialize engine")?;

    let initial = std::fs::read_to_string(&document)
        .with_context(|| format!("Failed to read {}", document.display()))?;
    engine.document_opened(&initial);

    let (event_tx, mut event_rx) = mpsc::channel(16);
    let _watcher = DocumentWatcher::new(
        document.clone(),
        Duration::from_millis(config.debounce_ms),
        event_tx,
    )
    .with_context(|| format!("Failed to watch {}", document.display()))?;

    info!("Monitor running. Press Ctrl+C to stop.");

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }

            event = event_rx.recv() => {
                let Some(event) = event else {
                    warn!("Watcher stopped");
                    break;
                };
                handle_document_event(&mut engine, event);
            }
        }
    }

    info!("Monitor stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
