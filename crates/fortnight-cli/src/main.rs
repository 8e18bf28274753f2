use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use fortnight_core::settings::ViewSettings;
use fortnight_core::store::TaskStore;
use fortnight_core::task::{Priority, Task};
use fortnight_core::view::{PlannerView, ViewProjection};
use fortnight_sync::SyncEngine;
use fortnight_sync::cache::SessionCache;
use fortnight_sync::client::HttpRemoteStore;

const TOKEN_ENV_VAR: &str = "FORTNIGHT_TOKEN";

#[derive(Parser, Debug)]
#[command(
    name = "fortnight",
    version,
    about = "Fortnight: a two-week and monthly task planner"
)]
struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    quiet: u8,

    /// Explicit view-settings file (otherwise FORTNIGHT_CONFIG or
    /// ./fortnight.toml is tried).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Planner service base URL. When present, view commands hydrate from
    /// the remote; otherwise they render the session-cache seed.
    #[arg(long = "base-url")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the month grid.
    Month {
        /// Cursor date inside the month to show (default: today).
        #[arg(long = "date")]
        date: Option<NaiveDate>,
    },
    /// Render the rolling two-week window.
    Fortnight {
        /// Anchor date for the window (default: today).
        #[arg(long = "date")]
        date: Option<NaiveDate>,
    },
    /// Fetch the full task set from the remote service into the session
    /// cache.
    Sync,
}

fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose, cli.quiet) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = ViewSettings::load(cli.config.as_deref())?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Sync => {
            let engine = remote_engine(cli.base_url.as_deref())?;
            let count = engine.hydrate().await?;
            println!("synced {count} tasks");
            Ok(())
        }
        Command::Month { date } => {
            let store = load_store(cli.base_url.as_deref()).await?;
            let view = PlannerView::month(date.unwrap_or(today), settings);
            print!("{}", render_projection(&view.project(&store, today)));
            Ok(())
        }
        Command::Fortnight { date } => {
            let store = load_store(cli.base_url.as_deref()).await?;
            let view = PlannerView::two_week(date.unwrap_or(today), settings);
            print!("{}", render_projection(&view.project(&store, today)));
            Ok(())
        }
    }
}

fn remote_engine(base_url: Option<&str>) -> anyhow::Result<SyncEngine> {
    let base_url = base_url.context("--base-url is required to reach the remote service")?;
    let token = std::env::var(TOKEN_ENV_VAR)
        .with_context(|| format!("{TOKEN_ENV_VAR} must hold the bearer credential"))?;
    let remote = HttpRemoteStore::new(base_url, token)?;
    let mut engine = SyncEngine::new(Arc::new(remote));
    if let Some(cache) = SessionCache::resolve() {
        engine = engine.with_cache(cache);
    }
    Ok(engine)
}

/// Hydrate from the remote when a base URL is given; otherwise fall back to
/// the session-cache seed (possibly empty).
async fn load_store(base_url: Option<&str>) -> anyhow::Result<TaskStore> {
    let mut store = TaskStore::new();

    if base_url.is_some() {
        let engine = remote_engine(base_url)?;
        engine.hydrate().await?;
        store.replace_all(engine.with_store(|s| s.all().cloned().collect()));
        return Ok(store);
    }

    let Some(cache) = SessionCache::resolve() else {
        return Ok(store);
    };
    let tasks: Vec<Task> = cache
        .load()
        .into_iter()
        .filter_map(|record| match record.into_task() {
            Ok(task) => Some(task),
            Err(err) => {
                warn!(error = %err, "skipping malformed cached record");
                None
            }
        })
        .collect();
    store.replace_all(tasks);
    Ok(store)
}

fn render_projection(projection: &ViewProjection) -> String {
    let mut out = String::new();
    out.push_str(&projection.heading);
    out.push('\n');

    for label in projection.weekday_labels {
        out.push_str(&format!("{label:>5} "));
    }
    out.push('\n');

    for row in projection.cells.chunks(7) {
        for day in row {
            match day.cell.date {
                None => out.push_str("      "),
                Some(date) => {
                    let today_mark = if day.cell.today { '*' } else { ' ' };
                    let task_mark = if day.tasks.is_empty() { ' ' } else { '+' };
                    out.push_str(&format!("{:>3}{today_mark}{task_mark} ", date.day()));
                }
            }
        }
        out.push('\n');
    }

    let mut listed_any = false;
    for day in &projection.cells {
        for task in &day.tasks {
            if !listed_any {
                out.push('\n');
                listed_any = true;
            }
            let time = task
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            out.push_str(&format!(
                "{}  {}  {:<7} {}\n",
                task.date,
                time,
                priority_label(task.priority),
                task.title
            ));
        }
    }

    out
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}
