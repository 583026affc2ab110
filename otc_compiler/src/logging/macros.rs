//! Logging macros taking a `Code` and `"key" => value` context pairs.
//! Values only need `Display`. A `"chain"` pair becomes the event's chain,
//! and `log_error!` also accepts `span = ...` pointing into it.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_pairs {
    () => {
        ::std::vec::Vec::<(&str, ::std::string::String)>::new()
    };
    ($($key:expr => $value:expr),+) => {
        ::std::vec![$(($key, ::std::format!("{}", $value))),+]
    };
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            Some($span),
            $crate::__log_pairs!($($key => $value),*),
        )
    };

    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            None,
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_at_level(
            $crate::logging::LogEvent::success($code, $message),
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_at_level(
            $crate::logging::LogEvent::info($message),
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_at_level(
            $crate::logging::LogEvent::warning($message),
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

/// Context values are not formatted unless debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_at_level(
                $crate::logging::LogEvent::debug($message),
                $crate::__log_pairs!($($key => $value),*),
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;

    #[test]
    fn test_macros_do_not_panic_without_global_logger() {
        crate::log_error!(codes::grammar::EMPTY_SEGMENT, "empty segment");
        crate::log_error!(
            codes::grammar::UNBALANCED_BRACKET,
            "unbalanced",
            span = crate::utils::Span::at(3),
            "chain" => "a[*.b"
        );
        crate::log_success!(codes::success::CHAIN_RESOLVED, "resolved", "nodes" => 3);
        crate::log_info!("compiling", "mapping" => "m1");
        crate::log_warning!("overriding concrete type", "token" => "payload",);
        crate::log_debug!("cache hit", "chain" => "orders[*]");
    }

    #[test]
    fn test_pairs_format_display_values() {
        let pairs = crate::__log_pairs!("nodes" => 3, "chain" => "a.b");
        assert_eq!(pairs, vec![("nodes", "3".to_string()), ("chain", "a.b".to_string())]);
        assert!(crate::__log_pairs!().is_empty());
    }
}
