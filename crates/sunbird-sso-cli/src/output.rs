use colored::Colorize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => print_error(&format!("Failed to render output: {e}")),
        },
        OutputFormat::Text => print_fields(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_fields(value: &Value) {
    let Some(fields) = value.as_object() else {
        println!("{value}");
        return;
    };

    for (key, field) in fields {
        let rendered = match field {
            Value::String(s) => s.clone(),
            Value::Null => "(not set)".to_string(),
            other => other.to_string(),
        };
        println!("{}: {}", key.cyan(), rendered);
    }
}
