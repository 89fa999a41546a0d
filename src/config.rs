use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Cut-offs used when turning classifier verdicts into a health report.
///
/// Record thresholds are exclusive: a message is flagged when its score is
/// strictly greater than `message_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub message_score: u8,
    pub email_score: u8,
    pub suspicious_connections: u32,
    pub low_battery_percent: u8,
    pub low_storage_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            message_score: 30,
            email_score: 40,
            suspicious_connections: 3,
            low_battery_percent: 20,
            low_storage_bytes: 1000 * 1024 * 1024,
        }
    }
}

impl Thresholds {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let thresholds: Thresholds = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(?thresholds, path = %path.display(), "loaded thresholds");
        Ok(thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_scanner_constants() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.message_score, 30);
        assert_eq!(thresholds.email_score, 40);
        assert_eq!(thresholds.suspicious_connections, 3);
        assert_eq!(thresholds.low_battery_percent, 20);
        assert_eq!(thresholds.low_storage_bytes, 1_048_576_000);
    }

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(Thresholds::load(None).unwrap(), Thresholds::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"email_score": 50}}"#).unwrap();

        let thresholds = Thresholds::load(Some(file.path())).unwrap();
        assert_eq!(thresholds.email_score, 50);
        assert_eq!(thresholds.message_score, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Thresholds::load(Some(file.path())).is_err());
    }
}
