//! Tracing-backed error sink.

use corral_core::ErrorSink;

/// Reports swallowed regeneration failures through the tracing
/// subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl ErrorSink for LoggingSink {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        tracing::error!(error = %error, "Recovered from regeneration failure");
    }
}

// ============================================================================
// TESTS
// ============================================================================
