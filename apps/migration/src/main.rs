//! Migration CLI tool.
//!
//! Drives the legacy-to-indexed conversion of the remote post store, its
//! rollback, and a status report. Soft preconditions (nothing to migrate,
//! no backup) print a message and exit cleanly; backend failures exit
//! nonzero.

use clap::{Parser, Subcommand};

use briefing_infra::{
    MigrationError, RedisBackend, RedisConfig, index_status, migrate_to_indexed,
    rollback_to_legacy,
};

#[derive(Parser)]
#[command(name = "briefing-migration", about = "Post store migration tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert the legacy single-blob document into the indexed layout
    Migrate,
    /// Tear down the indexed layout and restore the legacy document
    Rollback,
    /// Show which layout is live
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let backend = RedisBackend::connect(RedisConfig::from_env()).await?;

    match cli.command {
        Command::Migrate => match migrate_to_indexed(&backend).await {
            Ok(report) => println!(
                "migrated {}/{} posts ({} failed)",
                report.succeeded, report.attempted, report.failed
            ),
            Err(MigrationError::NothingToMigrate) => println!("nothing to migrate"),
            Err(e) => return Err(e.into()),
        },
        Command::Rollback => match rollback_to_legacy(&backend).await {
            Ok(()) => println!("rollback complete, legacy document restored"),
            Err(MigrationError::NoBackup) => println!("no backup available"),
            Err(e) => return Err(e.into()),
        },
        Command::Status => {
            let status = index_status(&backend).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
