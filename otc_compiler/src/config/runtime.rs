//! Runtime preferences, read from `OTC_*` environment variables
//!
//! Unlike the compile-time limits these only change behaviour, never
//! bounds. An unset or unparsable variable falls back to its default.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub mod env_vars {
    pub const GRAMMAR_STRICT_IDENTIFIERS: &str = "OTC_GRAMMAR_STRICT_IDENTIFIERS";
    pub const GRAMMAR_DEFAULT_NAMESPACE: &str = "OTC_GRAMMAR_DEFAULT_NAMESPACE";

    pub const RESOLUTION_CONTINUE_AFTER_ERROR: &str = "OTC_RESOLUTION_CONTINUE_AFTER_ERROR";
    pub const RESOLUTION_LOG_NODE_CREATION: &str = "OTC_RESOLUTION_LOG_NODE_CREATION";

    pub const INDEXER_DETECT_CYCLES: &str = "OTC_INDEXER_DETECT_CYCLES";
    pub const INDEXER_LOG_SKIPPED_CHAINS: &str = "OTC_INDEXER_LOG_SKIPPED_CHAINS";

    pub const LOGGING_USE_STRUCTURED: &str = "OTC_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "OTC_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "OTC_LOGGING_MIN_LEVEL";
    pub const LOGGING_CARGO_STYLE: &str = "OTC_LOGGING_CARGO_STYLE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "OTC_LOGGING_INCLUDE_FILE_CONTEXT";
}

fn from_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarPreferences {
    /// Reject chains whose segment names are not valid identifiers
    pub strict_identifiers: bool,
    /// Namespace for synthesized identifiers when a script has none
    pub default_namespace: String,
}

impl Default for GrammarPreferences {
    fn default() -> Self {
        Self {
            strict_identifiers: from_env(env_vars::GRAMMAR_STRICT_IDENTIFIERS, true),
            default_namespace: from_env(env_vars::GRAMMAR_DEFAULT_NAMESPACE, "otc".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionPreferences {
    /// Keep compiling the remaining chains of a script after a failure
    pub continue_after_chain_error: bool,
    pub log_node_creation: bool,
}

impl Default for ResolutionPreferences {
    fn default() -> Self {
        Self {
            continue_after_chain_error: from_env(env_vars::RESOLUTION_CONTINUE_AFTER_ERROR, true),
            log_node_creation: from_env(env_vars::RESOLUTION_LOG_NODE_CREATION, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerPreferences {
    /// Track object identities along the descent and reject cycles
    pub detect_cycles: bool,
    /// Log each chain skipped because an indexed chain already covers it
    pub log_skipped_chains: bool,
}

impl Default for IndexerPreferences {
    fn default() -> Self {
        Self {
            detect_cycles: from_env(env_vars::INDEXER_DETECT_CYCLES, true),
            log_skipped_chains: from_env(env_vars::INDEXER_LOG_SKIPPED_CHAINS, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// One JSON object per event
    pub use_structured_logging: bool,
    pub enable_console_logging: bool,
    /// Clamped by the compile-time floor
    pub min_log_level: LogLevel,
    pub enable_cargo_style_output: bool,
    /// Tag events with the script being compiled
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: from_env(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: from_env(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: from_env(env_vars::LOGGING_MIN_LEVEL, LogLevel::Info),
            enable_cargo_style_output: from_env(env_vars::LOGGING_CARGO_STYLE, true),
            include_file_context: from_env(env_vars::LOGGING_INCLUDE_FILE_CONTEXT, true),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub grammar: GrammarPreferences,
    pub resolution: ResolutionPreferences,
    pub indexer: IndexerPreferences,
    pub logging: LoggingPreferences,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_uses_default() {
        assert!(from_env("OTC_TEST_SURELY_UNSET_FLAG", true));
        assert_eq!(from_env("OTC_TEST_SURELY_UNSET_LEVEL", LogLevel::Warning), LogLevel::Warning);
    }

    #[test]
    fn test_preferences_roundtrip_through_toml() {
        let config = RuntimeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: RuntimeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.indexer.detect_cycles, config.indexer.detect_cycles);
        assert_eq!(parsed.logging.min_log_level, config.logging.min_log_level);
    }
}
