//! Log events emitted by the compiler and the runtime indexer
//!
//! Besides free-form context pairs an event can carry the chain it concerns
//! and a span into that chain, so diagnostics can underline the offending
//! segment the way rustc underlines source.

use super::codes::Code;
use crate::utils::Span;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Saturates at `Debug`
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => LogLevel::Error,
            1 => LogLevel::Warning,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    /// Lowercase label used in cargo-style output
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Accepts names (`warn`, `WARNING`) and digits (`1`)
    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.to_ascii_lowercase().as_str() {
            "error" | "0" => Ok(LogLevel::Error),
            "warning" | "warn" | "1" => Ok(LogLevel::Warning),
            "info" | "2" => Ok(LogLevel::Info),
            "debug" | "3" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    /// Chain text the event is about
    pub chain: Option<String>,
    /// Byte range inside `chain`
    pub span: Option<Span>,
    pub context: BTreeMap<String, String>,
}

const UNCODED_WARNING: Code = Code::new("W000");
const UNCODED_INFO: Code = Code::new("I000");
const UNCODED_DEBUG: Code = Code::new("D000");

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: message.to_string(),
            chain: None,
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(error_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, error_code, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, UNCODED_WARNING, message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, UNCODED_INFO, message)
    }

    pub fn success(success_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, success_code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, UNCODED_DEBUG, message)
    }

    pub fn with_chain(mut self, chain: &str) -> Self {
        self.chain = Some(chain.to_string());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a context pair. The `chain` key is lifted into [`LogEvent::chain`].
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        if key == "chain" {
            return self.with_chain(value);
        }
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn category(&self) -> &'static str {
        self.code.category()
    }

    /// The offending chain segment, when the span lies inside the chain
    pub fn segment(&self) -> Option<&str> {
        let chain = self.chain.as_deref()?;
        let span = self.span?;
        chain.get(span.start..span.end.min(chain.len()))
    }

    /// Two-line rendering of the chain with the span underlined, or `None`
    /// when the event has no chain
    pub fn underline(&self) -> Option<String> {
        let chain = self.chain.as_deref()?;
        let marks = match self.span {
            Some(span) if span.start < chain.len() => {
                let width = span.len().max(1).min(chain.len() - span.start);
                format!("{}{}", " ".repeat(span.start), "^".repeat(width))
            }
            Some(_) => format!("{}^", " ".repeat(chain.len())),
            None => return Some(chain.to_string()),
        };
        Some(format!("{}\n{}", chain, marks))
    }

    pub fn format(&self) -> String {
        let mut line = format!(
            "[{}] {} - {}",
            self.level.as_str(),
            self.code.as_str(),
            self.message
        );
        if let Some(chain) = &self.chain {
            line.push_str(&format!(" in `{}`", chain));
        }
        if let Some(span) = &self.span {
            line.push_str(&format!(" at {}", span));
        }
        line
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": self.level.as_str(),
            "code": self.code.as_str(),
            "category": self.category(),
            "message": self.message,
        });

        if self.is_error() {
            json["recoverable"] = self.code.is_recoverable().into();
            json["help"] = self.code.help().into();
        }
        if let Some(chain) = &self.chain {
            json["chain"] = chain.as_str().into();
        }
        if let Some(span) = &self.span {
            json["span"] = serde_json::json!([span.start, span.end]);
        }
        if !self.context.is_empty() {
            json["context"] = serde_json::to_value(&self.context)?;
        }

        serde_json::to_string(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_chain_context_is_lifted() {
        let event = LogEvent::error(codes::semantics::MISSING_KEY_VALUE_MARKER, "tags is a map")
            .with_context("chain", "tags[*]")
            .with_context("mapping", "order-to-dto");

        assert_eq!(event.chain.as_deref(), Some("tags[*]"));
        assert!(!event.context.contains_key("chain"));
        assert_eq!(event.category(), "Semantics");
        assert_eq!(
            event.format(),
            "[ERROR] E201 - tags is a map in `tags[*]`"
        );
    }

    #[test]
    fn test_underline_marks_span() {
        let event = LogEvent::error(codes::grammar::UNBALANCED_BRACKET, "Unclosed '['")
            .with_chain("orders[*.sku")
            .with_span(Span::new(6, 9));

        assert_eq!(event.segment(), Some("[*."));
        assert_eq!(event.underline().unwrap(), "orders[*.sku\n      ^^^");
        assert!(event.format().ends_with("at cols 7-9"));
    }

    #[test]
    fn test_underline_past_end_points_after_chain() {
        let event = LogEvent::error(codes::grammar::EMPTY_SEGMENT, "Trailing '.'")
            .with_chain("owner.")
            .with_span(Span::at(6));

        assert_eq!(event.segment(), Some(""));
        assert_eq!(event.underline().unwrap(), "owner.\n      ^");
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("2".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::from_u8(9), LogLevel::Debug);
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::success(codes::success::OBJECT_INDEXED, "indexed")
            .with_context("nodes", "4");

        let json: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["code"], "I050");
        assert_eq!(json["context"]["nodes"], "4");
        assert!(json.get("help").is_none());
        assert!(json.get("chain").is_none());
    }
}
