//! Shared helper functions for CLI commands

use handoff_core::{error::Result, ErrorState};
use serde::Serialize;

/// Parse a `key=value` argument
pub fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.trim().is_empty() => Err(format!("missing key in '{}'", raw)),
        Some((key, value)) => Ok((key.trim().to_string(), value.to_string())),
        None => Err(format!("expected key=value, got '{}'", raw)),
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Exit after a failure that has already been shown and logged
pub fn exit_reported(state: &ErrorState) -> ! {
    tracing::debug!("Exiting after {}", state.error_code);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("badge=B-1").unwrap(),
            ("badge".to_string(), "B-1".to_string())
        );
        assert_eq!(
            parse_key_value("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("flag=").unwrap(),
            ("flag".to_string(), String::new())
        );
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }
}
