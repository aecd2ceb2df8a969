mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use sunbird_sso::config::loader::load_config;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format.unwrap_or_default();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(url = %config.url, realm = %config.realm, "Configuration loaded");

    match &cli.command {
        Commands::Verify(args) => commands::token::verify(&config, args, format)?,
        Commands::Activate(args) => {
            commands::account::set_enabled(&config, &args.user_id, true).await?;
        }
        Commands::Deactivate(args) => {
            commands::account::set_enabled(&config, &args.user_id, false).await?;
        }
        Commands::Remove(args) => commands::account::remove(&config, &args.user_id).await?,
        Commands::ResetPassword(args) => commands::account::reset_password(&config, args).await?,
        Commands::RequiredAction(args) => {
            commands::account::required_action(&config, args).await?;
        }
        Commands::FederatedId(args) => {
            commands::account::federated_id(&config, &args.user_id, format)?;
        }
        Commands::Config => commands::config::show(&config, format)?,
    }

    Ok(())
}
