#![deny(missing_docs)]
//! Shared logging utilities for the bookgen workspace.
//!
//! This crate provides the `bookgen_*` logging macros used across the codebase,
//! a per-thread job context that prefixes log lines with the tracked job handle,
//! and a minimal test initializer for the global logger.

use std::cell::RefCell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Handle of the job currently tracked by this thread's dispatch loop.
    static JOB_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets (or clears) the job handle attached to log lines emitted on this thread.
/// The dispatch loop calls this whenever the tracked job changes.
pub fn set_job_context(handle: Option<&str>) {
    JOB_CONTEXT.with(|ctx| *ctx.borrow_mut() = handle.map(ToOwned::to_owned));
}

/// Returns the job handle attached to this thread, if any.
pub fn job_context() -> Option<String> {
    JOB_CONTEXT.with(|ctx| ctx.borrow().clone())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __bookgen_log {
    ($lvl:expr, $($arg:tt)*) => {{
        match $crate::job_context() {
            Some(job) => $crate::log::log!($lvl, "[job {}] {}", job, format_args!($($arg)*)),
            None => $crate::log::log!($lvl, $($arg)*),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! bookgen_trace {
    ($($arg:tt)*) => {{
        $crate::__bookgen_log!($crate::log::Level::Trace, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! bookgen_debug {
    ($($arg:tt)*) => {{
        $crate::__bookgen_log!($crate::log::Level::Debug, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! bookgen_info {
    ($($arg:tt)*) => {{
        $crate::__bookgen_log!($crate::log::Level::Info, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! bookgen_warn {
    ($($arg:tt)*) => {{
        $crate::__bookgen_log!($crate::log::Level::Warn, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! bookgen_error {
    ($($arg:tt)*) => {{
        $crate::__bookgen_log!($crate::log::Level::Error, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
