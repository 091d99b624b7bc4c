mod import;

use clap::{Parser, Subcommand};
use mobsync_core::config::DEFAULT_PROVIDER_DOMAIN;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mobsync-cli")]
#[command(about = "Mirror Mobgran offers into Postgres")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import the offer behind a share link
    Import {
        /// Mobgran share link containing the offer identifier
        link: String,
        /// Overwrite the stored offer if it already exists
        #[arg(long)]
        replace: bool,
        /// Fetch and assemble the offer in memory without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a link and print its canonical identifier
    Validate {
        link: String,
        /// Domain marker the link must contain
        #[arg(long, env = "MOBSYNC_PROVIDER_DOMAIN", default_value = DEFAULT_PROVIDER_DOMAIN)]
        domain: String,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

const LOG_LEVEL_VAR: &str = "MOBSYNC_LOG_LEVEL";

/// Filter used when `RUST_LOG` is unset. Blank values fall back to `info`,
/// the same default the config loader applies.
fn fallback_log_level(configured: Option<String>) -> String {
    configured
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(fallback_log_level(std::env::var(LOG_LEVEL_VAR).ok()))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Import {
            link,
            replace,
            dry_run,
        }) => {
            let config = mobsync_core::load_app_config()?;
            import::run_import(&config, &link, replace, dry_run).await?;
        }
        Some(Commands::Validate { link, domain }) => import::run_validate(&link, &domain)?,
        Some(Commands::Db { command }) => {
            let config = mobsync_core::load_app_config()?;
            let pool = mobsync_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    mobsync_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = mobsync_db::run_migrations(&pool).await?;
                    println!("migrations up to date ({applied} applied)");
                }
            }
        }
        None => println!("mobsync-cli ready; see --help"),
    }

    Ok(())
}
