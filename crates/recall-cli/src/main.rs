use anyhow::Context;
use clap::Parser;
use recall_core::{Config, ExpiringCache, FrecencySorter, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recall")]
#[command(version, about = "Expiring cache and frecency ranking backed by SQLite", long_about = None)]
struct Cli {
    /// Database file (overrides the config file)
    #[arg(long, global = true, env = "RECALL_DB")]
    db: Option<PathBuf>,

    /// Config file (defaults to <config dir>/recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Work with the expiring cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Work with usage history and frecency ranking
    #[command(subcommand)]
    Usage(UsageCommand),
}

#[derive(clap::Subcommand)]
enum CacheCommand {
    /// Print a live value
    Get { key: String },
    /// Store a value (JSON, or taken as a plain string if it isn't)
    Set {
        key: String,
        value: String,
        /// Time to live in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Delete a value
    Remove { key: String },
    /// Delete every expired value
    Prune,
}

#[derive(clap::Subcommand)]
enum UsageCommand {
    /// Record one use of a key
    Record { key: String },
    /// Show the usage record of a key
    Show { key: String },
    /// Forget a key's usage
    Reset { key: String },
    /// Forget the usage of every key
    ResetAll,
    /// Print keys ordered by frecency
    Rank {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recall=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let db_path = match cli.db {
        Some(path) => path,
        None => config.store_path()?,
    };
    tracing::debug!("Using store at {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;

    match command {
        Commands::Cache(cmd) => {
            let cache = ExpiringCache::from_config(
                Arc::new(store.namespace(&config.cache.namespace)),
                &config.cache,
            );
            run_cache(&cache, cmd).await
        }
        Commands::Usage(cmd) => {
            let sorter = FrecencySorter::from_config(
                Arc::new(store.namespace(&config.frecency.namespace)),
                &config.frecency,
            );
            run_usage(&sorter, cmd).await
        }
    }
}

async fn run_cache(cache: &ExpiringCache, cmd: CacheCommand) -> anyhow::Result<()> {
    match cmd {
        CacheCommand::Get { key } => match cache.get::<serde_json::Value>(&key).await? {
            Some(value) => println!("{}", value),
            None => tracing::info!("{} is not cached", key),
        },
        CacheCommand::Set { key, value, ttl } => {
            let value = serde_json::from_str::<serde_json::Value>(&value)
                .unwrap_or(serde_json::Value::String(value));
            let ttl = ttl.map(Duration::from_secs).unwrap_or(cache.default_ttl());
            cache.set_with_ttl(&key, &value, ttl).await?;
            tracing::info!("Cached {} for {}s", key, ttl.as_secs());
        }
        CacheCommand::Remove { key } => {
            cache.remove(&key).await?;
        }
        CacheCommand::Prune => {
            let removed = cache.prune().await?;
            println!("Removed {} expired entries", removed);
        }
    }

    Ok(())
}

async fn run_usage(sorter: &FrecencySorter, cmd: UsageCommand) -> anyhow::Result<()> {
    match cmd {
        UsageCommand::Record { key } => {
            // Losing one data point isn't worth failing the caller over
            match sorter.record_usage(&key).await {
                Ok(record) => println!("{} used {} times", key, record.usage_count),
                Err(e) => tracing::warn!("Could not record usage of {}: {}", key, e),
            }
        }
        UsageCommand::Show { key } => match sorter.usage(&key).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("{} has never been used", key),
        },
        UsageCommand::Reset { key } => {
            sorter.reset(&key).await?;
        }
        UsageCommand::ResetAll => {
            let removed = sorter.reset_all().await?;
            println!("Reset usage of {} keys", removed);
        }
        UsageCommand::Rank { keys } => {
            for scored in sorter.rank(keys, |k| k.as_str()).await? {
                println!("{:.4}\t{}", scored.score, scored.item);
            }
        }
    }

    Ok(())
}
