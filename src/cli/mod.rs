use std::future::Future;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::api::{ServerConfig, serve_with_shutdown};
use crate::application::LedgerService;
use crate::storage::DatabaseConfig;

/// ledgerd - account ledger service
#[derive(Parser, Debug)]
#[command(name = "ledgerd")]
#[command(about = "A small account ledger with atomic transfers, served over HTTP/JSON")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "LEDGER_DATABASE", default_value = "ledger.db")]
    pub database: String,

    /// Seconds to wait for a free database connection before failing
    #[arg(long, env = "LEDGER_ACQUIRE_TIMEOUT", default_value = "3")]
    pub acquire_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "JSON_LOGS", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "LEDGER_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "LEDGER_PORT", default_value = "3000")]
        port: u16,
    },

    /// Create the database schema and exit
    Migrate,

    /// Credit (positive) or debit (negative) an account
    Adjust {
        /// Account number to adjust
        #[arg(long)]
        number: i64,

        /// Amount in minor units; negative to debit
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },

    /// List all accounts
    Accounts,
}

impl Cli {
    fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            acquire_timeout: std::time::Duration::from_secs(self.acquire_timeout),
            ..DatabaseConfig::new(&self.database)
        }
    }

    pub async fn run(self) -> Result<()> {
        let db_config = self.database_config();

        match self.command {
            Commands::Serve { host, port } => {
                let service = LedgerService::init(&db_config)
                    .await
                    .context("Failed to open database")?;
                let config = ServerConfig { host, port };

                serve_and_close(service, config, shutdown_signal()).await?;
                info!("Shutdown complete");
            }

            Commands::Migrate => {
                let service = LedgerService::init(&db_config).await?;
                service.close().await;
                println!("Database initialized: {}", self.database);
            }

            Commands::Adjust { number, delta } => {
                let service = LedgerService::init(&db_config).await?;
                let result = service.adjust_balance(number, delta).await;
                service.close().await;

                let account = result.with_context(|| format!("Failed to adjust account {number}"))?;
                println!(
                    "Account {} ({} {}): balance {}",
                    account.account_number, account.first_name, account.last_name, account.balance
                );
            }

            Commands::Accounts => {
                let service = LedgerService::init(&db_config).await?;
                let result = service.list_accounts().await;
                service.close().await;

                let accounts = result.context("Failed to list accounts")?;
                if accounts.is_empty() {
                    println!("No accounts found.");
                    return Ok(());
                }

                println!(
                    "{:<6} {:<10} {:<20} {:<20} {:>12}",
                    "ID", "NUMBER", "FIRST NAME", "LAST NAME", "BALANCE"
                );
                for account in accounts {
                    println!(
                        "{:<6} {:<10} {:<20} {:<20} {:>12}",
                        account.id,
                        account.account_number,
                        account.first_name,
                        account.last_name,
                        account.balance
                    );
                }
            }
        }

        Ok(())
    }
}

/// Serve until `shutdown` resolves, then close the store even if serving failed.
async fn serve_and_close<F>(service: LedgerService, config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = serve_with_shutdown(service.clone(), config, shutdown)
        .await
        .context("Server error");
    service.close().await;
    served
}

/// Install the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; keep serving.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
