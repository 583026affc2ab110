//! Log sinks and the level filter in front of them

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

pub struct LoggingService {
    sink: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(sink: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { sink, min_level }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.enabled(event.level) {
            self.sink.log(&event);
        }
    }
}

/// Plain lines. Errors and warnings go to stderr.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if event.level <= LogLevel::Warning {
            eprintln!("{}", event.format());
        } else {
            println!("{}", event.format());
        }
    }
}

/// Only errors, to stderr, with the chain underlined when known
pub struct StderrErrorLogger;

impl Logger for StderrErrorLogger {
    fn log(&self, event: &LogEvent) {
        if !event.is_error() {
            return;
        }
        eprintln!("{}", event.format());
        if let Some(underlined) = event.underline() {
            for line in underlined.lines() {
                eprintln!("    {}", line);
            }
        }
    }
}

/// One JSON object per line on stderr
pub struct StructuredLogger;

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        match event.format_json() {
            Ok(line) => eprintln!("{}", line),
            Err(_) => eprintln!("{}", event.format()),
        }
    }
}

/// Keeps the most recent events, up to the compile-time collection ceiling
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<VecDeque<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<LogEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.events().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn clear(&self) {
        self.events().clear();
    }

    pub fn contains_code(&self, code: Code) -> bool {
        self.events().iter().any(|e| e.code == code)
    }

    /// Events raised while handling `chain`
    pub fn for_chain(&self, chain: &str) -> Vec<LogEvent> {
        self.events()
            .iter()
            .filter(|e| e.chain.as_deref() == Some(chain))
            .cloned()
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let ceiling = config::get_max_error_collection().max(1);
        let mut events = self.events();
        while events.len() >= ceiling {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Sink chosen by the runtime preferences
pub fn create_configured_service() -> LoggingService {
    let sink: Arc<dyn Logger> = if config::use_structured_logging() {
        Arc::new(StructuredLogger)
    } else if config::use_console_logging() {
        Arc::new(ConsoleLogger)
    } else {
        Arc::new(StderrErrorLogger)
    };
    LoggingService::new(sink, config::get_min_log_level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_service_filters_by_level() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_event(LogEvent::error(codes::grammar::EMPTY_SEGMENT, "empty segment"));
        service.log_event(LogEvent::debug("tokenizing"));
        service.log_event(LogEvent::success(codes::success::CHAIN_RESOLVED, "resolved"));

        assert_eq!(memory.len(), 1);
        assert!(memory.contains_code(codes::grammar::EMPTY_SEGMENT));
        assert!(!memory.contains_code(codes::success::CHAIN_RESOLVED));
        assert!(!service.enabled(LogLevel::Info));
    }

    #[test]
    fn test_memory_logger_groups_by_chain() {
        let memory = MemoryLogger::new();
        memory.log(&LogEvent::warning("w").with_chain("orders[*]"));
        memory.log(&LogEvent::error(codes::indexing::FIELD_ACCESS, "read").with_chain("owner.name"));
        memory.log(&LogEvent::info("no chain"));

        assert_eq!(memory.for_chain("owner.name").len(), 1);
        assert_eq!(memory.snapshot().len(), 3);

        memory.clear();
        assert!(memory.is_empty());
    }
}
