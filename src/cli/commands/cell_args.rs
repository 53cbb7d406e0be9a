use serde_json::Value;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::request::Fields;

/// Parse repeated `HEADER=VALUE` arguments. Later values for the same
/// header win; values are stored as text.
pub fn parse(pairs: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let Some((header, value)) = pair.split_once('=') else {
            return Err(SignoffError::InvalidConfig {
                detail: format!("expected HEADER=VALUE, got '{pair}'"),
            });
        };
        let header = header.trim();
        if header.is_empty() {
            return Err(SignoffError::InvalidConfig {
                detail: format!("missing header name in '{pair}'"),
            });
        }
        fields.insert(header.to_string(), Value::String(value.to_string()));
    }
    Ok(fields)
}
