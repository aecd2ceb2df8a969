use anyhow::Result;
use serde_json::Value;
use sunbird_sso::SsoConfig;

use crate::cli::OutputFormat;
use crate::output::print_value;

const REDACTED: &str = "[REDACTED]";

pub fn show(config: &SsoConfig, format: OutputFormat) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    redact(&mut value, "public_key");
    if let Some(admin) = value.get_mut("admin") {
        redact(admin, "client_secret");
        redact(admin, "password");
    }
    print_value(&value, format);
    Ok(())
}

fn redact(value: &mut Value, field: &str) {
    if let Some(slot) = value.get_mut(field)
        && !slot.is_null()
    {
        *slot = Value::String(REDACTED.to_string());
    }
}
