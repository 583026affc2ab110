//! Logging shared by the compiler and `otc_runtime`
//!
//! A process-wide [`LoggingService`] receives every event. While a mapping
//! script is being compiled, the current thread is bound to that script and
//! its warnings and errors are also filed under it in the [`ErrorCollector`],
//! which renders them once a batch is done.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use collector::{ErrorCollector, FileProcessingContext, ProcessingSummary};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();
static GLOBAL_ERROR_COLLECTOR: OnceLock<ErrorCollector> = OnceLock::new();

thread_local! {
    static CURRENT_SCRIPT: RefCell<Option<FileProcessingContext>> = const { RefCell::new(None) };
}

/// Install the service selected by the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    init_global_logging_with_service(Arc::new(service::create_configured_service()))?;

    // Codes raised on the hot paths must resolve to real metadata
    let undocumented: Vec<&str> = [
        codes::grammar::UNBALANCED_BRACKET,
        codes::semantics::MISSING_KEY_VALUE_MARKER,
        codes::indexing::CYCLIC_GRAPH,
        codes::system::INTERNAL_ERROR,
    ]
    .iter()
    .filter(|code| code.description().is_none())
    .map(Code::as_str)
    .collect();
    if !undocumented.is_empty() {
        return Err(format!("No metadata for code(s): {}", undocumented.join(", ")));
    }

    get_global_logger().log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Logging ready",
    ));
    Ok(())
}

/// Install a specific service, for embedders and tests
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())?;
    // A collector left over from an earlier call is reused
    let _ = GLOBAL_ERROR_COLLECTOR.set(ErrorCollector::new());
    Ok(())
}

/// Panics if `init_global_logging` was never called
pub fn get_global_logger() -> &'static LoggingService {
    GLOBAL_LOGGER
        .get()
        .expect("Global logger not initialized. Call init_global_logging() first.")
        .as_ref()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(Arc::as_ref)
}

pub fn try_get_global_error_collector() -> Option<&'static ErrorCollector> {
    GLOBAL_ERROR_COLLECTOR.get()
}

/// Binds the current thread to a script until dropped
pub struct ScriptScope {
    previous: Option<FileProcessingContext>,
}

impl Drop for ScriptScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_SCRIPT.with(|current| *current.borrow_mut() = previous);
    }
}

pub fn enter_script(file_path: PathBuf, file_id: usize) -> ScriptScope {
    let context = FileProcessingContext::new(file_path, file_id);
    if let Some(collector) = try_get_global_error_collector() {
        collector.record_file_context(context.clone());
    }
    let previous = CURRENT_SCRIPT.with(|current| current.borrow_mut().replace(context));
    ScriptScope { previous }
}

/// Run `f` with the current thread bound to `file_path`
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _scope = enter_script(file_path, file_id);
    f()
}

pub fn get_current_file_context() -> Option<FileProcessingContext> {
    CURRENT_SCRIPT.with(|current| current.borrow().clone())
}

fn decorate(mut event: LogEvent, context: Vec<(&str, String)>) -> LogEvent {
    event.message = config::clamp_message(&event.message).to_string();
    for (key, value) in context {
        event = event.with_context(key, &value);
    }
    if config::include_file_context() {
        if let Some(script) = get_current_file_context() {
            event = event.with_context("file", &script.file_path.display().to_string());
        }
    }
    event
}

fn dispatch(event: LogEvent) {
    let file_under_script = event.is_error() || event.is_warning();
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event.clone());
    }
    if !file_under_script {
        return;
    }
    match (get_current_file_context(), try_get_global_error_collector()) {
        (Some(script), Some(collector)) => collector.record_event(&script.file_path, event),
        (_, None) if try_get_global_logger().is_none() => eprintln!("{}", event.format()),
        _ => {}
    }
}

/// Backing function of `log_error!`
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, String)>,
) {
    let mut event = decorate(LogEvent::error(code, message), context);
    if let Some(span) = span {
        event = event.with_span(span);
    }
    dispatch(event);
}

/// Backing function of the non-error macros
pub fn log_at_level(event: LogEvent, context: Vec<(&str, String)>) {
    dispatch(decorate(event, context));
}

pub fn get_processing_summary() -> ProcessingSummary {
    try_get_global_error_collector()
        .map(ErrorCollector::get_summary)
        .unwrap_or_default()
}

pub fn print_cargo_style_summary() {
    if !config::use_cargo_style_output() {
        return;
    }
    if let Some(collector) = try_get_global_error_collector() {
        println!("{}", collector::format_cargo_style_errors(collector));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_scope_restores_outer_script() {
        let outer = enter_script(PathBuf::from("orders.otc.toml"), 1);
        {
            let _inner = enter_script(PathBuf::from("tags.otc.toml"), 2);
            assert_eq!(get_current_file_context().map(|s| s.file_id), Some(2));
        }
        assert_eq!(
            get_current_file_context().map(|s| s.file_path),
            Some(PathBuf::from("orders.otc.toml"))
        );
        drop(outer);
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_with_file_context_unbinds_after_call() {
        let id = with_file_context(PathBuf::from("tags.otc.toml"), 2, || {
            get_current_file_context().map(|s| s.file_id)
        });

        assert_eq!(id, Some(2));
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_decorate_lifts_chain_and_keeps_pairs() {
        let event = decorate(
            LogEvent::info("resolved"),
            crate::__log_pairs!("chain" => "orders[*].sku", "mapping" => "m1"),
        );
        assert_eq!(event.chain.as_deref(), Some("orders[*].sku"));
        assert_eq!(event.context.get("mapping").map(String::as_str), Some("m1"));
    }
}
