//! Per-script diagnostics for batch compilation
//!
//! Each mapping script gets its own bucket of events. Buckets are rendered
//! after a batch in the layout rustc uses, with the failing chain quoted and
//! the span underlined.

use super::config;
use super::events::LogEvent;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Script currently being compiled on this thread
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
    pub start_time: Instant,
}

impl FileProcessingContext {
    pub fn new(file_path: PathBuf, file_id: usize) -> Self {
        Self {
            file_path,
            file_id,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Default)]
struct ScriptLog {
    events: Vec<LogEvent>,
    dropped: usize,
}

impl ScriptLog {
    fn errors(&self) -> usize {
        self.events.iter().filter(|e| e.is_error()).count()
    }

    fn warnings(&self) -> usize {
        self.events.iter().filter(|e| e.is_warning()).count()
    }
}

/// Totals over every script the collector has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub scripts: usize,
    pub failed_scripts: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Events discarded past the per-script ceiling
    pub dropped: usize,
}

impl ProcessingSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

pub struct ErrorCollector {
    scripts: Mutex<BTreeMap<PathBuf, ScriptLog>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(BTreeMap::new()),
        }
    }

    fn scripts(&self) -> MutexGuard<'_, BTreeMap<PathBuf, ScriptLog>> {
        self.scripts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a script so it counts in the summary even with no events
    pub fn record_file_context(&self, context: FileProcessingContext) {
        self.scripts().entry(context.file_path).or_default();
    }

    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let ceiling = config::get_max_log_events_per_file();
        let mut scripts = self.scripts();
        let log = scripts.entry(file_path.to_path_buf()).or_default();
        if log.events.len() < ceiling {
            log.events.push(event);
        } else {
            log.dropped += 1;
        }
    }

    pub fn get_file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        self.scripts()
            .get(file_path)
            .map(|log| log.events.clone())
            .unwrap_or_default()
    }

    pub fn get_summary(&self) -> ProcessingSummary {
        self.scripts()
            .values()
            .fold(ProcessingSummary::default(), |mut summary, log| {
                let errors = log.errors();
                summary.scripts += 1;
                summary.failed_scripts += usize::from(errors > 0);
                summary.errors += errors;
                summary.warnings += log.warnings();
                summary.dropped += log.dropped;
                summary
            })
    }

    pub fn clear(&self) {
        self.scripts().clear();
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn render_event(output: &mut String, file_path: &Path, event: &LogEvent) {
    output.push_str(&format!(
        "{}[{}]: {}\n",
        event.level.label(),
        event.code.as_str(),
        event.message
    ));

    let column = event
        .span
        .map(|span| format!(":{}", span.column()))
        .unwrap_or_default();
    output.push_str(&format!("  --> {}{}\n", file_path.display(), column));

    if let Some(underlined) = event.underline() {
        output.push_str("   |\n");
        for line in underlined.lines() {
            output.push_str(&format!("   | {}\n", line));
        }
    }

    for (key, value) in &event.context {
        if key != "file" {
            output.push_str(&format!("   = {}: {}\n", key, value));
        }
    }
    if event.is_error() {
        output.push_str(&format!("   = help: {}\n", event.code.help()));
    }
}

pub fn format_cargo_style_errors(collector: &ErrorCollector) -> String {
    let mut output = String::new();

    for (file_path, log) in collector.scripts().iter() {
        let reportable: Vec<&LogEvent> = log
            .events
            .iter()
            .filter(|e| e.is_error() || e.is_warning())
            .collect();
        if reportable.is_empty() && log.dropped == 0 {
            continue;
        }

        for event in reportable {
            render_event(&mut output, file_path, event);
            output.push('\n');
        }
        if log.dropped > 0 {
            output.push_str(&format!(
                "note: {} further event(s) for {} were not kept\n\n",
                log.dropped,
                file_path.display()
            ));
        }
    }

    let summary = collector.get_summary();
    output.push_str(&format!(
        "Compiled {} script(s): {} failed, {} error(s), {} warning(s)\n",
        summary.scripts, summary.failed_scripts, summary.errors, summary.warnings
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;
    use crate::utils::Span;

    #[test]
    fn test_summary_counts_scripts_and_events() {
        let collector = ErrorCollector::new();
        let good = PathBuf::from("good.otc.toml");
        let bad = PathBuf::from("bad.otc.toml");

        collector.record_file_context(FileProcessingContext::new(good, 0));
        collector.record_event(&bad, LogEvent::error(codes::grammar::EMPTY_SEGMENT, "empty"));
        collector.record_event(&bad, LogEvent::warning("deprecated key"));

        let summary = collector.get_summary();
        assert_eq!(summary.scripts, 2);
        assert_eq!(summary.failed_scripts, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert!(summary.has_errors());
    }

    #[test]
    fn test_events_past_ceiling_are_counted_not_kept() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("noisy.otc.toml");
        let ceiling = config::get_max_log_events_per_file();

        for _ in 0..ceiling + 5 {
            collector.record_event(&path, LogEvent::info("step"));
        }

        assert_eq!(collector.get_file_events(&path).len(), ceiling);
        assert_eq!(collector.get_summary().dropped, 5);
        assert!(format_cargo_style_errors(&collector).contains("5 further event(s)"));
    }

    #[test]
    fn test_cargo_style_output_underlines_chain() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("orders.otc.toml");
        collector.record_event(
            &path,
            LogEvent::error(codes::semantics::MISSING_KEY_VALUE_MARKER, "tags is a map")
                .with_chain("owner.tags[*]")
                .with_span(Span::new(6, 10))
                .with_context("mapping", "order-to-dto"),
        );

        let rendered = format_cargo_style_errors(&collector);
        assert!(rendered.contains("error[E201]: tags is a map"));
        assert!(rendered.contains("  --> orders.otc.toml:7"));
        assert!(rendered.contains("   | owner.tags[*]\n   |       ^^^^\n"));
        assert!(rendered.contains("   = mapping: order-to-dto"));
        assert!(rendered.contains("   = help:"));
        assert!(rendered.ends_with("Compiled 1 script(s): 1 failed, 1 error(s), 0 warning(s)\n"));
    }
}
