//! Mirror CLI - mirror command

use anyhow::Result;
use clap::{Parser, Subcommand};
use mirror_cli::util::{self, AppPaths};
use std::path::PathBuf;

mod cmd;

/// Mirror - keep directories in sync as they change
#[derive(Parser)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the watch list and settings
    #[arg(long, global = true, env = "MIRROR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Daemon configuration file
    #[arg(long, global = true, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a watched directory
    Add {
        /// Directory to watch
        watch_dir: PathBuf,
        /// Directory kept in sync with it
        sync_dir: PathBuf,
        /// Display name (default: the watch directory)
        #[arg(long)]
        name: Option<String>,
        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Copy created and changed files
        #[arg(long)]
        auto_add: bool,
        /// Delete removed files
        #[arg(long)]
        auto_delete: bool,
        /// Batch changes until this many milliseconds pass without one
        #[arg(long, default_value = "0")]
        delay: u32,
        /// ';'-separated patterns to exclude by full path (escape ';' as '\;')
        #[arg(long, default_value = "")]
        exclude: String,
        /// ';'-separated patterns a path must match to be mirrored
        #[arg(long, default_value = "")]
        include: String,
        /// Ignore OS events (events can only be injected)
        #[arg(long)]
        observe: bool,
        /// Reconcile the directories right away
        #[arg(long)]
        now: bool,
    },
    /// Remove a watch
    Remove {
        /// Watch name
        name: String,
    },
    /// List watches
    List,
    /// Make a sync directory match its watch directory once
    Sync {
        /// Watch name
        name: String,
    },
    /// Watch every directory until interrupted
    Run {
        /// Skip the startup reconciliation
        #[arg(long)]
        no_reconcile: bool,
    },
    /// Manage stored key/value settings
    #[command(subcommand)]
    Kv(KvCommands),
    /// View and edit the daemon configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum KvCommands {
    /// List all settings
    List,
    /// Print one setting
    Get {
        key: String,
    },
    /// Store a setting
    Set {
        key: String,
        value: String,
        /// Value type: string, int, float or bool
        #[arg(short = 't', long = "type", default_value = "string")]
        kind: String,
    },
    /// Delete a setting
    Unset {
        key: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show every configuration value
    List,
    /// Print one value
    Get {
        /// Key such as sync.retry_attempts
        key: String,
    },
    /// Change one value
    Set {
        key: String,
        value: String,
    },
    /// Show the config file path
    Path {
        /// Write a default file if none exists
        #[arg(long)]
        create: bool,
    },
    /// Print a commented example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::resolve(cli.data_dir, cli.config)?;

    // `run` sets up its own file logging
    if !matches!(cli.command, Commands::Run { .. }) {
        util::init_logging("warn");
    }

    match cli.command {
        Commands::Add {
            watch_dir,
            sync_dir,
            name,
            recursive,
            auto_add,
            auto_delete,
            delay,
            exclude,
            include,
            observe,
            now,
        } => {
            let request = mirror_core::WatchRequest {
                name,
                watch_dir,
                sync_dir,
                auto_add,
                auto_delete,
                recursive,
                delay_ms: delay,
                exclude,
                include,
                observe,
            };
            cmd::add::run(&paths, request, now).await
        }
        Commands::Remove { name } => cmd::remove::run(&paths, &name).await,
        Commands::List => cmd::list::run(&paths).await,
        Commands::Sync { name } => cmd::sync::run(&paths, &name).await,
        Commands::Run { no_reconcile } => cmd::run::run(&paths, !no_reconcile).await,
        Commands::Kv(kv_cmd) => match kv_cmd {
            KvCommands::List => cmd::kv::run_list(&paths).await,
            KvCommands::Get { key } => cmd::kv::run_get(&paths, &key).await,
            KvCommands::Set { key, value, kind } => cmd::kv::run_set(&paths, &key, &value, &kind).await,
            KvCommands::Unset { key } => cmd::kv::run_unset(&paths, &key).await,
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&paths).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&paths, &key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&paths, &key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(&paths, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
