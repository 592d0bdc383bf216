use clap::Parser;
use dbmigrate::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbmigrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Up => dbmigrate::cli::up::run(&cli).await?,
        Commands::Down { n } => dbmigrate::cli::down::run(&cli, n).await?,
        Commands::Status => dbmigrate::cli::status::run(&cli).await?,
    }

    Ok(())
}
