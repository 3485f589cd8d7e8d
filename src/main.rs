use anyhow::Result;
use clap::Parser;
use ledgerd::cli::{Cli, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);
    cli.run().await
}
