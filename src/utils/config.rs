//! Configuration and constants for ingestion.

use crate::extract::{EventPolicy, PolicyTable};
use crate::utils::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current JSON report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Separator between event name and field in a series key
pub const KEY_SEPARATOR: char = ':';

/// Suffix marking a first-element projection
pub const PARTIAL_SUFFIX: &str = "partial";

/// JSON-SEQ (RFC 7464) record separator some qlog writers prefix lines with
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Rows printed per table in the text summary
pub const DEFAULT_MAX_ROWS: usize = 20;

/// What to do with a body line that fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Fail the whole ingestion on the first malformed line
    #[default]
    Abort,
    /// Skip and count malformed lines
    Skip,
}

/// Everything one ingestion run needs
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub on_decode_error: DecodeErrorPolicy,
    pub policies: PolicyTable,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            on_decode_error: DecodeErrorPolicy::Abort,
            policies: PolicyTable::qlog_defaults(),
        }
    }
}

impl IngestConfig {
    pub fn with_decode_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.on_decode_error = policy;
        self
    }
}

/// On-disk config layout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub on_decode_error: Option<DecodeErrorPolicy>,

    /// Start from the built-in qlog policies
    #[serde(default = "default_true")]
    pub builtin_policies: bool,

    /// Policy for event names without an entry; flat when omitted
    #[serde(default)]
    pub default: Option<PolicyEntry>,

    #[serde(default)]
    pub events: BTreeMap<String, PolicyEntry>,
}

/// One `[events."<name>"]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEntry {
    /// Inferred from the field lists when omitted
    #[serde(default)]
    pub mode: Option<ModeName>,

    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(default)]
    pub first: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    Flat,
    Decompose,
}

fn default_true() -> bool {
    true
}

impl PolicyEntry {
    fn to_policy(&self, name: &str) -> Result<EventPolicy, ConfigError> {
        let has_fields = !self.fields.is_empty() || !self.first.is_empty();
        let mode = self.mode.unwrap_or(if has_fields {
            ModeName::Decompose
        } else {
            ModeName::Flat
        });

        match (mode, has_fields) {
            (ModeName::Flat, false) => Ok(EventPolicy::Flat),
            (ModeName::Flat, true) => Err(ConfigError::InvalidPolicy(format!(
                "{}: flat mode takes no fields",
                name
            ))),
            (ModeName::Decompose, false) => Err(ConfigError::InvalidPolicy(format!(
                "{}: decompose mode needs at least one field",
                name
            ))),
            (ModeName::Decompose, true) => Ok(EventPolicy::decompose(self.fields.iter().cloned())
                .with_first(self.first.iter().cloned())),
        }
    }
}

impl ConfigFile {
    /// Build the ingestion config this file describes
    pub fn into_config(self) -> Result<IngestConfig, ConfigError> {
        let mut policies = if self.builtin_policies {
            PolicyTable::qlog_defaults()
        } else {
            PolicyTable::new()
        };

        if let Some(entry) = &self.default {
            policies.set_default(entry.to_policy("default")?);
        }

        for (name, entry) in &self.events {
            policies.register(name.clone(), entry.to_policy(name)?);
        }

        Ok(IngestConfig {
            on_decode_error: self.on_decode_error.unwrap_or_default(),
            policies,
        })
    }
}

/// Parse a config from TOML text
pub fn parse_config(contents: &str) -> Result<IngestConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(contents)?;
    file.into_config()
}

/// Load a config from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Toml` - If TOML is invalid
/// * `ConfigError::InvalidPolicy` - If an event entry is inconsistent
pub fn load_config(path: impl AsRef<Path>) -> Result<IngestConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading config from: {}", path.display());
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldRule;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Abort);
        assert_eq!(config.policies.len(), 3);
    }

    #[test]
    fn test_parse_config() {
        let config = parse_config(
            r#"
            on_decode_error = "skip"
            builtin_policies = false

            [events."X"]
            fields = ["header", "frames"]
            first = ["frames"]

            [events."Y"]
            mode = "flat"
            "#,
        )
        .unwrap();

        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Skip);
        assert_eq!(config.policies.len(), 2);
        assert_eq!(
            config.policies.resolve("X"),
            &EventPolicy::Decompose(vec![
                FieldRule::Whole("header".to_string()),
                FieldRule::First("frames".to_string()),
            ])
        );
        assert_eq!(config.policies.resolve("Y"), &EventPolicy::Flat);
    }

    #[test]
    fn test_builtin_policies_kept_by_default() {
        let config = parse_config("[events.\"Z\"]\nfirst = [\"items\"]\n").unwrap();
        assert_eq!(config.policies.len(), 4);
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Abort);
    }

    #[test]
    fn test_invalid_policies() {
        assert!(matches!(
            parse_config("[events.\"X\"]\nmode = \"decompose\"\n"),
            Err(ConfigError::InvalidPolicy(_))
        ));
        assert!(matches!(
            parse_config("[events.\"X\"]\nmode = \"flat\"\nfields = [\"a\"]\n"),
            Err(ConfigError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_default_policy_entry() {
        let config = parse_config("[default]\nfields = [\"payload\"]\n").unwrap();
        assert_eq!(
            config.policies.resolve("unregistered"),
            &EventPolicy::decompose(["payload"])
        );
    }

    #[test]
    fn test_repeated_fields_yield_one_rule() {
        let config = parse_config("[events.\"X\"]\nfields = [\"h\", \"h\"]\n").unwrap();
        assert_eq!(
            config.policies.resolve("X"),
            &EventPolicy::Decompose(vec![FieldRule::Whole("h".to_string())])
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            parse_config("on_error = \"skip\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.toml");
        std::fs::write(&path, "on_decode_error = \"skip\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Skip);
    }
}
