use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sunbird-sso")]
#[command(about = "Verify Sunbird access tokens and manage federated Keycloak accounts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./sunbird-sso.toml when present)
    #[arg(short, long, global = true, env = "SUNBIRD_SSO_CONFIG")]
    pub config: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify an access token and print the user id
    Verify(VerifyArgs),
    /// Enable an account
    Activate(UserArgs),
    /// Disable an account
    Deactivate(UserArgs),
    /// Delete an account
    Remove(UserArgs),
    /// Replace an account's password
    ResetPassword(ResetPasswordArgs),
    /// Force an action on the account's next login
    RequiredAction(RequiredActionArgs),
    /// Print the federated id of a user
    FederatedId(UserArgs),
    /// Show the effective configuration (secrets redacted)
    Config,
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Access token (with or without the "Bearer " prefix)
    #[arg(env = "SUNBIRD_SSO_TOKEN")]
    pub token: String,
    /// SSO base URL to compute the expected issuer from
    #[arg(long)]
    pub issuer_url: Option<String>,
    /// Print the verified claims instead of the user id only
    #[arg(long)]
    pub claims: bool,
}

#[derive(clap::Args)]
pub struct UserArgs {
    /// Plain (non-federated) user id
    pub user_id: String,
}

#[derive(clap::Args)]
pub struct ResetPasswordArgs {
    /// Plain (non-federated) user id
    pub user_id: String,
    /// New password
    #[arg(long, env = "SUNBIRD_SSO_NEW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct RequiredActionArgs {
    /// Plain (non-federated) user id
    pub user_id: String,
    /// Action alias, e.g. UPDATE_PASSWORD or VERIFY_EMAIL
    pub action: String,
}
