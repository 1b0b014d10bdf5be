//! runbucket - retrieve training-run artifacts from an object bucket.
//!
//! Lists run configurations and epoch snapshots, and mirrors objects into a
//! local `<dest>/<bucket>/<name>` tree.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::{configs, epochs, fetch, mirror};

#[derive(Parser, Debug)]
#[command(name = "runbucket", author, version, about = "Retrieve training-run artifacts from an object bucket")]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Emit log lines as JSON objects
    #[arg(long, global = true)]
    log_json: bool,

    /// Extra configuration file, applied after the discovered ones
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bucket name (overrides configuration and RUNBUCKET_BUCKET)
    #[arg(short, long, global = true)]
    bucket: Option<String>,

    /// Local mirror root (overrides configuration and RUNBUCKET_DEST)
    #[arg(short, long, global = true)]
    dest: Option<PathBuf>,

    /// Number of concurrent download workers
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configurations of every instance of a run
    Configs {
        /// Run name (top-level bucket directory)
        run: String,

        /// Keep the store's listing order instead of sorting by lesion onset
        #[arg(long)]
        unsorted: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the epoch snapshots of one run instance
    Epochs {
        run: String,

        /// Run instance id
        instance: String,

        /// Keep the store's listing order instead of sorting by epoch
        #[arg(long)]
        unsorted: bool,

        #[arg(long)]
        json: bool,
    },

    /// Download the named objects into the local mirror
    Fetch {
        /// Bucket-relative object names
        #[arg(required = true)]
        objects: Vec<String>,
    },

    /// Download every object in the bucket into the local mirror
    Mirror {
        /// Upper bound on the number of objects listed
        #[arg(long, conflicts_with = "unlimited")]
        max_results: Option<usize>,

        /// List the whole bucket without a cap
        #[arg(long)]
        unlimited: bool,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber may already be installed when running under a test harness.
    let _ = if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = config::load(args.config.as_deref())?;
    init_tracing(
        args.log_level.as_deref().or(settings.log_level.as_deref()).unwrap_or("info"),
        args.log_json,
    );

    if let Some(bucket) = args.bucket {
        settings.bucket_name = Some(bucket);
    }
    if let Some(dest) = args.dest {
        settings.destination_dir = dest;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    debug!(
        bucket = ?settings.bucket_name,
        store = ?settings.store.kind,
        destination = %settings.destination_dir.display(),
        workers = settings.workers,
        "Resolved configuration"
    );

    match args.command {
        Command::Configs { run, unsorted, json } => configs::execute(&settings, &run, !unsorted, json).await,
        Command::Epochs { run, instance, unsorted, json } => {
            epochs::execute(&settings, &run, &instance, !unsorted, json).await
        }
        Command::Fetch { objects } => fetch::execute(&settings, objects).await,
        Command::Mirror { max_results, unlimited } => {
            let limit = if unlimited { None } else { max_results.or_else(|| settings.max_results_limit()) };
            mirror::execute(&settings, limit).await
        }
    }
}
