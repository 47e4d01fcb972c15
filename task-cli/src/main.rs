use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use task_cli::config::Settings;
use task_cli::{ListFilter, TaskChanges, TaskStore, commands};
use tracing_subscriber::EnvFilter;

/// Track tasks in a local JSON file
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Task file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        title: String,
        description: Option<String>,
    },
    /// Update an existing task
    Update {
        id: String,
        title: Option<String>,
        description: Option<String>,
        status: Option<String>,
        /// Updates task title
        #[arg(long = "t", value_name = "TITLE")]
        t: Option<String>,
        /// Updates task description
        #[arg(long = "d", value_name = "DESCRIPTION")]
        d: Option<String>,
        /// Updates task status
        #[arg(long = "s", value_name = "STATUS")]
        s: Option<String>,
    },
    /// Delete a task
    Delete { id: String },
    /// List tasks
    List {
        /// Lists all tasks
        #[arg(long)]
        all: bool,
        /// Lists pending tasks
        #[arg(long = "p")]
        p: bool,
        /// Lists started tasks
        #[arg(long = "s")]
        s: bool,
        /// Lists completed tasks
        #[arg(long = "c")]
        c: bool,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(task_cli::config::DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let settings = Settings::load().context("cannot load settings")?;
    init_tracing(&settings.log_level);

    let store = TaskStore::new(args.file.unwrap_or(settings.store_path));
    let mut out = io::stdout().lock();

    match args.command {
        Commands::Add { title, description } => commands::add(&store, &mut out, title, description),
        Commands::Update {
            id,
            title,
            description,
            status,
            t,
            d,
            s,
        } => {
            let changes = TaskChanges {
                title: t.or(title),
                description: d.or(description),
                status: s.or(status),
            };
            commands::update(&store, &mut out, &id, &changes)
        }
        Commands::Delete { id } => commands::delete(&store, &mut out, &id),
        Commands::List { all, p, s, c } => commands::list(
            &store,
            &mut out,
            ListFilter {
                all,
                pending: p,
                started: s,
                completed: c,
            },
        ),
    }
    .with_context(|| format!("task file {}", store.path().display()))?;

    Ok(())
}
