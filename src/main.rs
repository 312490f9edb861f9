use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use todod::{config::ServerConfig, rest, store::TaskStore, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(name = "todod", about = "todod — minimal task-tracking daemon", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port
    #[arg(long, env = "TODOD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "TODOD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TODOD_LOG")]
    log: Option<String>,

    /// Bind address for the HTTP server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TODOD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TODOD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. Use this flag when piping
    /// output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default when no subcommand given).
    ///
    /// Runs todod in the foreground.
    ///
    /// Examples:
    ///   todod serve
    ///   todod
    Serve,
    /// Inspect or modify stored tasks directly, without the server.
    ///
    /// Opens the local database in place. Useful for scripting and for
    /// poking at the store while the server is down.
    ///
    /// Examples:
    ///   todod tasks list
    ///   todod tasks add --title "Buy milk" --content "2%"
    ///   todod tasks remove 3f1a…
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List all stored tasks.
    ///
    /// Examples:
    ///   todod tasks list
    ///   todod tasks list --json
    List {
        /// Output as JSON array (for piping)
        #[arg(long)]
        json: bool,
    },
    /// Add a new task. Both fields are required and must be non-empty.
    ///
    /// Examples:
    ///   todod tasks add --title "Buy milk" --content "2%"
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Remove a task by id.
    ///
    /// Removing an id that is already gone is not an error.
    ///
    /// Examples:
    ///   todod tasks remove 3f1a2b3c-…
    Remove {
        /// Task id (as returned by create or list)
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format =
        std::env::var("TODOD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    let quiet = args.quiet;
    match args.command {
        Some(Command::Tasks { action }) => {
            run_tasks(action, args.data_dir, quiet).await?;
        }
        None | Some(Command::Serve) => {
            run_server(args.port, args.data_dir, args.log, args.bind_address).await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
    log: Option<String>,
    bind_address: Option<String>,
) -> Result<()> {
    let config = Arc::new(ServerConfig::new(port, data_dir, log, bind_address));

    let store = Arc::new(
        TaskStore::new(&config.data_dir)
            .await
            .context("failed to open task store")?,
    );
    info!(db = %config.db_path().display(), "task store ready");

    let ctx = Arc::new(AppContext {
        config,
        store,
        started_at: std::time::Instant::now(),
    });

    rest::start_rest_server(ctx).await
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("todod.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

// ── todod tasks ───────────────────────────────────────────────────────────────

/// Open the task store for CLI commands (no server — just storage access).
async fn open_task_store(data_dir: Option<std::path::PathBuf>) -> Result<TaskStore> {
    let config = ServerConfig::new(None, data_dir, Some("error".to_string()), None);
    TaskStore::new(&config.data_dir).await
}

async fn run_tasks(
    action: TasksAction,
    data_dir: Option<std::path::PathBuf>,
    quiet: bool,
) -> Result<()> {
    let store = open_task_store(data_dir).await?;

    match action {
        TasksAction::List { json } => {
            let tasks = store.list_tasks().await?;
            if json {
                println!("{}", serde_json::to_string(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                println!("{:<38} {:<30} CONTENT", "ID", "TITLE");
                println!("{}", "-".repeat(90));
                for t in &tasks {
                    println!("{:<38} {:<30} {}", t.id, t.title, t.content);
                }
                println!("\n{} task(s)", tasks.len());
            }
        }

        TasksAction::Add { title, content } => {
            let id = store.create_task(&title, &content).await?;
            if !quiet {
                println!("Added: {id} — {title}");
            }
        }

        TasksAction::Remove { id } => {
            store.delete_task(&id).await?;
            if !quiet {
                println!("Removed: {id}");
            }
        }
    }

    Ok(())
}
