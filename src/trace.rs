//! Conditional tracing macros for extraction, scoring and store calls.
//!
//! With the `tracing` feature the macros emit spans and events through the
//! `tracing` crate. Without it they expand to nothing, or to a dummy guard
//! for spans, so call sites never need their own `cfg` attributes.

/// Opens an info-level span around one fingerprint operation.
///
/// With `tracing` enabled this is `tracing::info_span!`. Without it the
/// macro yields a [`NoopSpan`] and the field expressions are not evaluated,
/// so fields should not be the only use of a local binding.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Records the headline measurement of an operation (score, match rate).
///
/// With `tracing` enabled this calls `tracing::info!`. Without it the values
/// are still evaluated and then dropped, so they never trip unused warnings.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        // Evaluate and discard so the values still count as used.
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Reports a recoverable condition such as a strand length mismatch.
///
/// Same expansion rules as [`trace_event!`], at warn level.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Span guard used when the `tracing` feature is off.
///
/// Lets extraction and comparison code write
/// `let _span = trace_span!(...).entered();` unconditionally.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns `self`, standing in for `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
