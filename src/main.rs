use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticktag::config::{Config, LoggingConfig};
use ticktag::error::{Error, JobErrorTrait};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "ticktag",
    version,
    about = "Temperature tagging, due-record washing and JSON publishing for tabular records",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json), overriding the configured one
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag schedules and trips with bucket, temp and next-due epoch
    Tag {
        /// Operating mode override (DAY, NIGHT, HOLDOVER)
        #[arg(short, long)]
        mode: Option<String>,

        /// Log patches instead of writing them
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Seconds between DAY passes
        #[arg(long)]
        pass_delay: Option<u64>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Find due, unlocked records and optionally relock or reschedule them
    Wash {
        /// Operating mode override (DAY, NIGHT, HOLDOVER)
        #[arg(short, long)]
        mode: Option<String>,

        /// Set the lock field on due records
        #[arg(long, default_value = "false")]
        relock: bool,

        /// Push next-due forward by the cadence for the stored temp
        #[arg(long, default_value = "false")]
        reschedule: bool,

        /// Number of detection rounds
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Seconds between rounds
        #[arg(long)]
        interval: Option<u64>,

        /// Log patches instead of writing them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Export table views as JSON and commit the changed files
    Publish {
        /// Commit every export, skipping the dirty check and preflight diff
        #[arg(long, default_value = "false")]
        force: bool,

        /// Render and diff without committing or clearing flags
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load_config(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default()
        .with_overrides(cli.log_format.as_deref(), cli.verbose);
    setup_tracing(&logging)?;

    tracing::info!("ticktag starting");

    let result = match loaded {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        match e.downcast_ref::<Error>() {
            Some(job_error) => tracing::error!(
                error = %format!("{e:#}"),
                category = job_error.category().as_str(),
                recoverable = job_error.is_recoverable(),
                "ticktag failed"
            ),
            None => tracing::error!(error = %format!("{e:#}"), "ticktag failed"),
        }
        return result;
    }

    tracing::info!("ticktag completed successfully");
    Ok(())
}

async fn run(command: Commands, config: Config) -> Result<()> {
    tracing::debug!(
        base_id = %config.store.base_id,
        clock = ?config.clock.url,
        log_level = %config.logging.level,
        "Configuration loaded"
    );

    match command {
        Commands::Tag {
            mode,
            dry_run,
            pass_delay,
            timeout,
        } => {
            tracing::info!(
                mode = ?mode,
                dry_run = %dry_run,
                pass_delay = ?pass_delay,
                "Starting tag command"
            );
            commands::tag(
                config,
                commands::TagParams {
                    mode,
                    dry_run,
                    pass_delay,
                    timeout,
                },
            )
            .await
        }

        Commands::Wash {
            mode,
            relock,
            reschedule,
            iterations,
            interval,
            dry_run,
        } => {
            tracing::info!(
                mode = ?mode,
                relock = %relock,
                reschedule = %reschedule,
                iterations = ?iterations,
                "Starting wash command"
            );
            commands::wash(
                config,
                commands::WashParams {
                    mode,
                    relock,
                    reschedule,
                    iterations,
                    interval,
                    dry_run,
                },
            )
            .await
        }

        Commands::Publish { force, dry_run } => {
            tracing::info!(force = %force, dry_run = %dry_run, "Starting publish command");
            commands::publish(config, force, dry_run).await
        }
    }
}

fn setup_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(logging.filter_directive());

    match logging.is_json() {
        true => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        false => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
