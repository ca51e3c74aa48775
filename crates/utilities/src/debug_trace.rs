//! Tracing of individual store operations, compiled away unless the
//! `rcterm_debug-trace` feature is enabled.

/// Prints a trace message when the `rcterm_debug-trace` feature is enabled.
/// Delegates to [log::trace!] in that case and expands to nothing otherwise, so
/// the arguments are not even evaluated on the hot paths of the store.
///
/// # Examples
///
/// ```
/// use rcterm_utilities::debug_trace;
///
/// let slot = 42;
/// debug_trace!("Reclaimed slot {}", slot);
/// ```
#[macro_export]
#[cfg(feature = "rcterm_debug-trace")]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        {
            log::trace!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "rcterm_debug-trace"))]
macro_rules! debug_trace {
    ($($arg:tt)*) => {{}};
}
