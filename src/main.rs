//! glance - Folder navigation with progressive file previews.
//!
//! Usage:
//!   glance peek <FILE>                      Preview a file and report the outcome
//!   glance walk <FILE> --delta N --steps K  Step through the folder K times by N
//!   glance list <FILE>                      Show the indexed folder
//!   glance --config <FILE> ...              Load settings from a TOML file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};

use glance_core::{File, PeekConfig, PreviewState, UiContext};
use glance_index::{FsShell, IndexOutcome, ShellService};
use glance_preview::{HandleLedger, PreviewServices};
use glance_session::PeekSession;

#[derive(Parser)]
#[command(
    name = "glance",
    version,
    about = "Folder navigation with progressive file previews",
    long_about = "glance previews a file in progressively better quality while \
                  indexing its folder in the background, so you can step to \
                  neighbouring files as soon as the index is ready."
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preview a file and report the outcome
    Peek {
        /// File to preview
        file: PathBuf,
    },

    /// Step through the file's folder, previewing each file
    Walk {
        /// File to start from
        file: PathBuf,

        /// Positions to move per step (negative moves backwards)
        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        delta: isize,

        /// Number of steps
        #[arg(short, long, default_value = "1")]
        steps: usize,
    },

    /// Show the indexed folder with the file marked
    List {
        /// File whose folder to list
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PeekConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PeekConfig::default(),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    runtime.block_on(run(cli.command, config))
}

async fn run(command: Command, config: PeekConfig) -> Result<()> {
    let shell = Arc::new(FsShell::from_config(&config));
    let ledger = HandleLedger::new();
    let ui = UiContext::spawn().context("Failed to start UI thread")?;
    let session = PeekSession::new(
        shell.clone(),
        PreviewServices::filesystem(Arc::clone(&ledger)),
        ui,
        config,
    );

    match command {
        Command::Peek { file } => {
            let file = describe(shell.as_ref(), &file)?;
            session.open(file);
            let state = session.wait_for_preview().await;
            let outcome = session.wait_for_index().await;
            print_preview(&session, state).await;
            print_position(&session, outcome.as_ref());
        }
        Command::Walk { file, delta, steps } => {
            let file = describe(shell.as_ref(), &file)?;
            session.open(file);
            let outcome = session.wait_for_index().await;
            if !matches!(outcome, Some(IndexOutcome::Published { .. })) {
                return Err(eyre!("Folder could not be indexed: {outcome:?}"));
            }

            let state = session.wait_for_preview().await;
            print_preview(&session, state).await;
            for _ in 0..steps {
                if session.navigate(delta).is_none() {
                    eprintln!("Nothing to navigate to");
                    break;
                }
                let state = session.wait_for_preview().await;
                print_preview(&session, state).await;
            }
        }
        Command::List { file } => {
            let file = describe(shell.as_ref(), &file)?;
            session.open(file);
            let outcome = session.wait_for_index().await;
            print_listing(&session, outcome.as_ref());
        }
    }

    if let Some(previewer) = session.previewer() {
        previewer.dispose().await;
    }
    session.clear();

    let outstanding = ledger.outstanding();
    if outstanding > 0 {
        eprintln!("{outstanding} native handle(s) still outstanding");
    }

    Ok(())
}

/// Build a file value with size and timestamp from the shell.
fn describe(shell: &dyn ShellService, path: &Path) -> Result<File> {
    let path = path.canonicalize().context("Invalid path")?;
    let item = shell
        .describe(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(item.into_file())
}

async fn print_preview(session: &PeekSession, state: PreviewState) {
    let Some(file) = session.current_file() else {
        return;
    };
    let size = match session.previewer() {
        Some(previewer) => previewer.preview_size().await,
        None => session.factory().config().fallback_size(),
    };
    let kind = session.factory().kind_for(&file);

    println!(
        "{:<32} {:>10}  {:<11} {:<7} {}x{}",
        truncate(file.name(), 32),
        format_size(file.size()),
        kind.to_string(),
        state.to_string(),
        size.width,
        size.height,
    );
    match session.current_artifact() {
        Some(artifact) => println!("  showing {artifact}"),
        None => println!("  nothing to show"),
    }
}

fn print_position(session: &PeekSession, outcome: Option<&IndexOutcome>) {
    match (outcome, session.current_item_index()) {
        (Some(IndexOutcome::Published { len, .. }), Some(index)) => {
            println!("  item {} of {}", index + 1, len);
        }
        (Some(IndexOutcome::Failed { message }), _) => {
            println!("  folder not indexed: {message}");
        }
        _ => println!("  navigation unavailable"),
    }
}

fn print_listing(session: &PeekSession, outcome: Option<&IndexOutcome>) {
    let items = session.items();
    if items.is_empty() {
        print_position(session, outcome);
        return;
    }

    for (i, file) in items.files().iter().enumerate() {
        let marker = if Some(i) == items.index() { ">" } else { " " };
        let name = if file.is_dir() {
            format!("{}/", file.name())
        } else {
            file.name().to_string()
        };
        println!(
            "{marker} {:>4}  {:<40} {:>10}",
            i + 1,
            truncate(&name, 40),
            format_size(file.size())
        );
    }
    println!();
    println!("{} items", items.len());
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
