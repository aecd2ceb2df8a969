use anyhow::{Context, Result};
use serde_json::json;
use sunbird_sso::{RequiredAction, SsoConfig, SsoService};

use crate::cli::{OutputFormat, RequiredActionArgs, ResetPasswordArgs};
use crate::output::{print_success, print_value};

fn admin_service(config: &SsoConfig) -> Result<SsoService> {
    config
        .admin
        .validate_credentials()
        .context("Admin API credentials are not usable")?;
    Ok(SsoService::from_config(config)?)
}

pub async fn set_enabled(config: &SsoConfig, user_id: &str, enabled: bool) -> Result<()> {
    let service = admin_service(config)?;
    service.accounts().set_enabled(user_id, enabled).await?;

    let verb = if enabled { "Activated" } else { "Deactivated" };
    print_success(&format!("{verb} user {user_id}"));
    Ok(())
}

pub async fn remove(config: &SsoConfig, user_id: &str) -> Result<()> {
    let service = admin_service(config)?;
    service.accounts().remove_user(user_id).await?;
    print_success(&format!("Removed user {user_id}"));
    Ok(())
}

pub async fn reset_password(config: &SsoConfig, args: &ResetPasswordArgs) -> Result<()> {
    let service = admin_service(config)?;
    let updated = service
        .accounts()
        .reset_password(&args.user_id, &args.password)
        .await?;

    if !updated {
        anyhow::bail!(
            "Password reset for user {} was rejected by the identity provider",
            args.user_id
        );
    }
    print_success(&format!("Password reset for user {}", args.user_id));
    Ok(())
}

pub async fn required_action(config: &SsoConfig, args: &RequiredActionArgs) -> Result<()> {
    let service = admin_service(config)?;
    let action = RequiredAction::from(args.action.as_str());
    service
        .accounts()
        .set_required_action(&args.user_id, &action)
        .await?;
    print_success(&format!("Set {action} for user {}", args.user_id));
    Ok(())
}

pub fn federated_id(config: &SsoConfig, user_id: &str, format: OutputFormat) -> Result<()> {
    let service = SsoService::from_config(config)?;
    let id = service.accounts().federated_user_id(user_id)?;
    match format {
        OutputFormat::Json => print_value(&json!({ "federated_id": id }), format),
        OutputFormat::Text => println!("{id}"),
    }
    Ok(())
}
