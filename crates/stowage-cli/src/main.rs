//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;

use stowage_cli::error::exit_code_for;
use stowage_cli::{Cli, CliConfig, Commands, bootstrap, handlers, logging};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so it can feed the env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        handlers::version::execute();
        return Ok(());
    }

    let config = CliConfig::from_cli(&cli)?;

    match cli.command {
        Commands::Serve {
            address,
            cors_origins,
        } => handlers::serve::execute(&config, &address, &cors_origins).await?,
        Commands::Ensure {
            locator,
            credentials,
            credentials_type,
        } => {
            let ctx = bootstrap(&config).await?;
            handlers::ensure::execute(&ctx, &locator, credentials.as_deref(), credentials_type)
                .await?;
        }
        Commands::Lookup { locator } => {
            let ctx = bootstrap(&config).await?;
            handlers::lookup::execute(&ctx, &locator).await?;
        }
        Commands::Evict { locator } => {
            let ctx = bootstrap(&config).await?;
            handlers::evict::execute(&ctx, &locator).await?;
        }
        Commands::Gc => {
            let ctx = bootstrap(&config).await?;
            handlers::gc::execute(&ctx).await?;
        }
        Commands::Version => handlers::version::execute(),
    }
    Ok(())
}
