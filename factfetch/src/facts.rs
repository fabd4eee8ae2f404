//! Normalization of raw channel payloads into version facts.

use serde::{Deserialize, Serialize};

use crate::channel::{Payload, RawResponse};
use crate::error::ChannelError;

/// RESTCONF wraps the version container under its module-qualified name.
const RESTCONF_CONTAINER: &str = "f5-system-version:version";

/// Normalized version facts from one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFact {
    /// Operating system version, e.g. `1.8.0-16036`.
    pub os_version: String,

    /// Management service version.
    pub service_version: String,

    /// Product identity, e.g. `F5OS-A`.
    pub product: String,

    /// Name of the channel this fact came from.
    pub source_channel: String,
}

impl VersionFact {
    /// True if the version/product fields match, ignoring the source.
    pub fn same_values(&self, other: &VersionFact) -> bool {
        self.os_version == other.os_version
            && self.service_version == other.service_version
            && self.product == other.product
    }
}

/// Map a raw channel payload onto the common fact schema.
///
/// JSON bodies are looked up by field name (accepting both the flat and
/// the RESTCONF-wrapped shape). Text output uses the fixed-line,
/// last-token contract: line 0 is the OS version, line 1 the service
/// version, line 2 the product. Missing lines or tokens surface as
/// [`ChannelError::UnexpectedFormat`]; extraction never indexes past the
/// available data.
pub fn normalize(raw: &RawResponse) -> Result<VersionFact, ChannelError> {
    match &raw.payload {
        Payload::Json(body) => normalize_json(&raw.channel, body),
        Payload::Text(output) => normalize_text(&raw.channel, output),
    }
}

fn normalize_json(
    channel: &str,
    body: &serde_json::Value,
) -> Result<VersionFact, ChannelError> {
    // Unwrap the RESTCONF container if present; flat bodies pass through.
    let body = body.get(RESTCONF_CONTAINER).unwrap_or(body);

    Ok(VersionFact {
        os_version: string_field(body, "os-version")?,
        service_version: string_field(body, "service-version")?,
        product: string_field(body, "product")?,
        source_channel: channel.to_string(),
    })
}

fn string_field(body: &serde_json::Value, name: &str) -> Result<String, ChannelError> {
    body.get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ChannelError::unexpected_format(format!("missing or non-string field '{name}'"))
        })
}

fn normalize_text(channel: &str, output: &str) -> Result<VersionFact, ChannelError> {
    let lines: Vec<&str> = output.lines().collect();

    Ok(VersionFact {
        os_version: last_token(&lines, 0)?,
        service_version: last_token(&lines, 1)?,
        product: last_token(&lines, 2)?,
        source_channel: channel.to_string(),
    })
}

/// Last whitespace-separated token of the line at `index`.
///
/// The fixed-position contract is deliberately literal; it tracks the
/// device's output format rather than guessing at a grammar.
fn last_token(lines: &[&str], index: usize) -> Result<String, ChannelError> {
    let line = lines.get(index).ok_or_else(|| {
        ChannelError::unexpected_format(format!(
            "expected at least {} output lines, got {}",
            index + 1,
            lines.len()
        ))
    })?;

    line.split_whitespace()
        .next_back()
        .map(str::to_string)
        .ok_or_else(|| ChannelError::unexpected_format(format!("output line {index} is empty")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RawResponse;

    #[test]
    fn test_normalize_flat_rest_body() {
        let body = serde_json::json!({
            "os-version": "1.8.0-16036",
            "service-version": "1.8.0-16036",
            "product": "F5OS-A",
        });

        let fact = normalize(&RawResponse::json("rest", body)).unwrap();
        assert_eq!(fact.os_version, "1.8.0-16036");
        assert_eq!(fact.service_version, "1.8.0-16036");
        assert_eq!(fact.product, "F5OS-A");
        assert_eq!(fact.source_channel, "rest");
    }

    #[test]
    fn test_normalize_restconf_wrapped_body() {
        let body = serde_json::json!({
            "f5-system-version:version": {
                "os-version": "1.8.0-16036",
                "service-version": "1.8.0-16036",
                "product": "F5OS-A",
            }
        });

        let fact = normalize(&RawResponse::json("rest", body)).unwrap();
        assert_eq!(fact.product, "F5OS-A");
    }

    #[test]
    fn test_missing_json_field() {
        let body = serde_json::json!({ "os-version": "1.8.0-16036" });

        let err = normalize(&RawResponse::json("rest", body)).unwrap_err();
        assert_eq!(err.kind(), "unexpected-format");
        assert!(err.to_string().contains("service-version"));
    }

    #[test]
    fn test_non_string_json_field() {
        let body = serde_json::json!({
            "os-version": 42,
            "service-version": "1.8.0-16036",
            "product": "F5OS-A",
        });

        let err = normalize(&RawResponse::json("rest", body)).unwrap_err();
        assert_eq!(err.kind(), "unexpected-format");
    }

    #[test]
    fn test_normalize_cli_text() {
        let output = "system version os-version 1.8.0-16036\n\
                      system version service-version 1.8.0-16036\n\
                      system version product F5OS-A";

        let fact = normalize(&RawResponse::text("cli-ssh", output)).unwrap();
        assert_eq!(fact.os_version, "1.8.0-16036");
        assert_eq!(fact.service_version, "1.8.0-16036");
        assert_eq!(fact.product, "F5OS-A");
        assert_eq!(fact.source_channel, "cli-ssh");
    }

    #[test]
    fn test_normalize_script_text() {
        let output = "os-version 1.8.0-16036\n\
                      service-version 1.8.0-16036\n\
                      product F5OS-A\n";

        let fact = normalize(&RawResponse::text("shell-script", output)).unwrap();
        assert_eq!(fact.os_version, "1.8.0-16036");
        assert_eq!(fact.product, "F5OS-A");
    }

    #[test]
    fn test_truncated_text_is_rejected() {
        let output = "system version os-version 1.8.0-16036";

        let err = normalize(&RawResponse::text("cli-ssh", output)).unwrap_err();
        assert_eq!(err.kind(), "unexpected-format");
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_empty_line_is_rejected() {
        let output = "os-version 1.8.0-16036\n\n product F5OS-A";

        let err = normalize(&RawResponse::text("cli-ssh", output)).unwrap_err();
        assert_eq!(err.kind(), "unexpected-format");
    }

    #[test]
    fn test_same_values_ignores_source() {
        let a = VersionFact {
            os_version: "1.8.0".into(),
            service_version: "1.8.0".into(),
            product: "F5OS-A".into(),
            source_channel: "rest".into(),
        };
        let mut b = a.clone();
        b.source_channel = "cli-ssh".into();
        assert!(a.same_values(&b));

        b.product = "F5OS-C".into();
        assert!(!a.same_values(&b));
    }
}
