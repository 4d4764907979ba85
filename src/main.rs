use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use conftrack::manager::EnvironmentManager;
use conftrack::repository::GitRepository;

/// Track, version and diff environment configurations
#[derive(Parser)]
#[command(name = "conftrack")]
#[command(about = "Environment configuration version control", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the store file holding all environments
    #[arg(long, global = true, default_value = ".conftrack/store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Manage configurations within an environment
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Compare one configuration across two environments
    Compare {
        /// Environment on the left side of the comparison
        left: String,
        /// Environment on the right side
        right: String,
        /// Name of the configuration to compare
        config: String,
    },
    /// Export a value-only snapshot of all environments
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Import a snapshot, adding what is not already present
    Import {
        /// Snapshot file to read
        file: PathBuf,
    },
    /// Write the current snapshot into a git working tree and commit it
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// Path to the git working tree
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Push a branch to a remote
    Push {
        remote: String,
        branch: String,
        /// Path to the git working tree
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Pull a branch from a remote
    Pull {
        remote: String,
        branch: String,
        /// Path to the git working tree
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// Add a new environment
    Add { name: String },
    /// Remove an environment and all its configurations
    Remove { name: String },
    /// List environment names
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Add a configuration (value is a JSON document)
    Add {
        env: String,
        name: String,
        value: String,
    },
    /// Update an existing configuration with a new JSON value
    Update {
        env: String,
        name: String,
        value: String,
    },
    /// Delete a configuration
    Delete { env: String, name: String },
    /// Print a configuration with its version and timestamp
    Get { env: String, name: String },
    /// List configuration names within an environment
    List { env: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("conftrack started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Env { command } => run_env_command(&cli.store, command),
        Commands::Config { command } => run_config_command(&cli.store, command),
        Commands::Compare {
            left,
            right,
            config,
        } => {
            let manager = EnvironmentManager::load_or_create(&cli.store)?;
            let report = manager.compare_configurations(&left, &right, &config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Export { file } => {
            let manager = EnvironmentManager::load_or_create(&cli.store)?;
            manager.export_to_file(&file)?;
            println!("Configurations exported to {}", file.display());
            Ok(())
        }
        Commands::Import { file } => {
            let mut manager = EnvironmentManager::load_or_create(&cli.store)?;
            manager.import_from_file(&file)?;
            manager.save_state(&cli.store)?;
            println!("Configurations imported from {}", file.display());
            Ok(())
        }
        Commands::Commit { message, repo } => {
            let manager = EnvironmentManager::load_or_create(&cli.store)?.with_repository(
                Arc::new(GitRepository::new(&repo)),
                Some(repo.join("configurations.json")),
            );
            manager.commit_changes(&message).await?;
            println!("Changes committed: {message}");
            Ok(())
        }
        Commands::Push {
            remote,
            branch,
            repo,
        } => {
            let manager = EnvironmentManager::load_or_create(&cli.store)?
                .with_repository(Arc::new(GitRepository::new(&repo)), None);
            manager.push_changes(&remote, &branch).await?;
            println!("Pushed {branch} to {remote}");
            Ok(())
        }
        Commands::Pull {
            remote,
            branch,
            repo,
        } => {
            let manager = EnvironmentManager::load_or_create(&cli.store)?
                .with_repository(Arc::new(GitRepository::new(&repo)), None);
            manager.pull_changes(&remote, &branch).await?;
            println!("Pulled {branch} from {remote}");
            Ok(())
        }
    }
}

fn run_env_command(store: &Path, command: EnvCommands) -> anyhow::Result<()> {
    let mut manager = EnvironmentManager::load_or_create(store)?;

    match command {
        EnvCommands::Add { name } => {
            manager.add_environment(&name)?;
            manager.save_state(store)?;
            println!("Environment '{name}' added");
        }
        EnvCommands::Remove { name } => {
            manager.remove_environment(&name)?;
            manager.save_state(store)?;
            println!("Environment '{name}' removed");
        }
        EnvCommands::List => {
            let mut names = manager.list_environments();
            if names.is_empty() {
                println!("No environments defined");
            } else {
                names.sort();
                for name in names {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}

fn run_config_command(store: &Path, command: ConfigCommands) -> anyhow::Result<()> {
    let mut manager = EnvironmentManager::load_or_create(store)?;

    match command {
        ConfigCommands::Add { env, name, value } => {
            let value = serde_json::from_str(&value)?;
            manager.add_configuration(&env, &name, value)?;
            manager.save_state(store)?;
            println!("Configuration '{name}' added to '{env}'");
        }
        ConfigCommands::Update { env, name, value } => {
            let value = serde_json::from_str(&value)?;
            manager.update_configuration(&env, &name, value)?;
            manager.save_state(store)?;
            println!("Configuration '{name}' updated in '{env}'");
        }
        ConfigCommands::Delete { env, name } => {
            manager.delete_configuration(&env, &name)?;
            manager.save_state(store)?;
            println!("Configuration '{name}' deleted from '{env}'");
        }
        ConfigCommands::Get { env, name } => {
            let config = manager.configuration(&env, &name)?;
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::List { env } => {
            let mut names = manager.environment(&env)?.list_configurations();
            if names.is_empty() {
                println!("No configurations in '{env}'");
            } else {
                names.sort();
                for name in names {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}
