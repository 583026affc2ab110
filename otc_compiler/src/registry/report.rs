//! Per-chain compilation reports

use crate::command::{ChainError, Side};
use crate::logging::Code;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of compiling one chain, command or mapping
#[derive(Debug, Clone, Serialize)]
pub struct CompilationReport {
    pub success: bool,
    pub mapping_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CompilationReport {
    pub fn success(mapping_id: &str, message: &str) -> Self {
        Self {
            success: true,
            mapping_id: mapping_id.to_string(),
            command_id: None,
            side: None,
            chain: None,
            file: None,
            message: message.to_string(),
            cause: None,
            code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(mapping_id: &str, code: Code, message: &str) -> Self {
        Self {
            success: false,
            code: Some(code.as_str().to_string()),
            ..Self::success(mapping_id, message)
        }
    }

    /// Failure of one chain of a command
    pub fn chain_failure(
        mapping_id: &str,
        command_id: &str,
        side: Side,
        chain: &str,
        error: &ChainError,
    ) -> Self {
        let location = error
            .span()
            .map(|span| format!(" at {}", span))
            .unwrap_or_default();
        Self {
            command_id: Some(command_id.to_string()),
            side: Some(side),
            chain: Some(chain.to_string()),
            cause: Some(format!("{} error{}", error.stage(), location)),
            ..Self::failure(
                mapping_id,
                error.error_code(),
                &format!("{} chain of command '{}': {}", side.as_str(), command_id, error),
            )
        }
    }

    pub fn with_command(mut self, command_id: &str) -> Self {
        self.command_id = Some(command_id.to_string());
        self
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    /// One-line human readable form
    pub fn format(&self) -> String {
        let status = if self.success { "ok" } else { "error" };
        let mut line = format!("{} [{}]", status, self.mapping_id);
        if let Some(code) = &self.code {
            line = format!("{}[{}] [{}]", status, code, self.mapping_id);
        }
        if let Some(file) = &self.file {
            line.push_str(&format!(" {}", file));
        }
        if let Some(chain) = &self.chain {
            line.push_str(&format!(" `{}`", chain));
        }
        line.push_str(&format!(": {}", self.message));
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SemanticsError;
    use crate::utils::Span;

    #[test]
    fn test_chain_failure_report() {
        let error = ChainError::Semantics(SemanticsError::MissingKeyValueMarker {
            chain: "tags".to_string(),
            field: "tags".to_string(),
            span: Span::new(0, 4),
        });
        let report = CompilationReport::chain_failure("m", "c1", Side::Source, "tags", &error)
            .with_file("m.otc.toml");

        assert!(!report.success);
        assert_eq!(report.code.as_deref(), Some("E201"));
        assert_eq!(report.cause.as_deref(), Some("semantics error at cols 1-4"));
        assert!(report.format().starts_with("error[E201] [m] m.otc.toml `tags`"));
    }

    #[test]
    fn test_success_report_serializes_compactly() {
        let report = CompilationReport::success("m", "compiled");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("chain").is_none());
        assert!(json.get("timestamp").is_some());
    }
}
