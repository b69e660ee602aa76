//! Reporting seam for swallowed regeneration failures.
//!
//! When regeneration fails and a stale entry covers for it, the failure
//! never reaches the caller. It still has to reach operators, so the
//! cache hands it to whatever sink the deployment wires in.

use std::error::Error;

/// Receives failures the cache recovered from.
pub trait ErrorSink: Send + Sync {
    /// Record one recovered failure.
    fn report(&self, error: &(dyn Error + 'static));
}

/// Sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&self, _error: &(dyn Error + 'static)) {}
}
