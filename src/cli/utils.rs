use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. Object `data` is
/// merged into the JSON envelope; anything else lands under `"data"`.
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_envelope(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

fn success_envelope(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    match (response.as_object_mut(), data) {
        (Some(envelope), Some(Value::Object(fields))) => envelope.extend(fields),
        (Some(envelope), Some(other)) => {
            envelope.insert("data".to_string(), other);
        }
        _ => {}
    }

    response
}

/// Output a list of `key: value` lines in text mode, or the object in JSON mode
pub fn output_details(output_format: &OutputFormat, details: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(details)?);
        }
        OutputFormat::Text => {
            if let Some(fields) = details.as_object() {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("{}: {}", key, s),
                        Value::Null => println!("{}: -", key),
                        other => println!("{}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}
