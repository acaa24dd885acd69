//! Correlation ID and tracing context management
//!
//! Generates and carries a correlation id through one unit of work — an
//! HTTP request on the aggregator, or one producer/consumer cycle — so
//! every log line emitted while servicing it can be tied back together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{instrument, Instrument, Span};

/// Global counter for generating sequential correlation IDs.
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A correlation ID that uniquely identifies a request or a client cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new correlation ID from a timestamp and a counter.
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let counter = CORRELATION_COUNTER.fetch_add(1, Ordering::SeqCst);
        CorrelationId(format!("{timestamp}-{counter}"))
    }

    pub fn from_string(id: String) -> Self {
        CorrelationId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracing context that holds correlation and span information for one
/// request or one client cycle.
#[derive(Debug, Clone)]
pub struct TracingContext {
    pub correlation_id: CorrelationId,
    pub span: Span,
}

impl TracingContext {
    pub fn new(component: &'static str) -> Self {
        let correlation_id = CorrelationId::new();
        let span = tracing::info_span!(
            "unit_of_work",
            correlation_id = %correlation_id,
            component = component
        );
        Self { correlation_id, span }
    }

    /// Instrument an async function with this context's span, entering and
    /// exiting it around every poll rather than holding a guard across the
    /// `.await` (a held `Entered` guard is `!Send` and would make the
    /// surrounding handler future un-spawnable on a multi-threaded runtime).
    pub async fn with_span_async<F, R>(&self, f: F) -> R
    where
        F: std::future::Future<Output = R>,
    {
        f.instrument(self.span.clone()).await
    }
}

/// Create a new tracing context and execute a function within it.
#[instrument(skip_all)]
pub async fn with_tracing_context<F, R>(component: &'static str, f: F) -> R
where
    F: FnOnce(&TracingContext) -> R,
{
    let context = TracingContext::new(component);
    let _guard = context.span.enter();
    f(&context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_distinct() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn tracing_context_carries_its_correlation_id() {
        let context = TracingContext::new("aggregator");
        assert!(!context.correlation_id.as_str().is_empty());
    }
}
