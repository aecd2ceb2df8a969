use anyhow::Result;
use serde_json::json;
use sunbird_sso::federation::decode_subject;
use sunbird_sso::{SsoConfig, SsoService};

use crate::cli::{OutputFormat, VerifyArgs};
use crate::output::{print_success, print_value};

pub fn verify(config: &SsoConfig, args: &VerifyArgs, format: OutputFormat) -> Result<()> {
    let service = SsoService::from_config(config)?;
    let token = args.token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    if args.claims {
        let claims = service
            .verifier()
            .verify_claims(token, args.issuer_url.as_deref())?;
        let mut value = serde_json::to_value(&claims)?;
        value["user_id"] = decode_subject(claims.subject()).into();
        print_value(&value, format);
        return Ok(());
    }

    let user_id = service
        .verifier()
        .verify_with_issuer(token, args.issuer_url.as_deref())?;
    match format {
        OutputFormat::Json => print_value(&json!({ "user_id": user_id }), format),
        OutputFormat::Text => print_success(&format!("Token verified for user {user_id}")),
    }
    Ok(())
}
