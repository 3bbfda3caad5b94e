use tracing::{Span, field};

use super::TraceId;

/// Root span for one unit of work (a bar, a replay run).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        instrument = field::Empty
    )
}

/// Child span; inherits trace_id from the enclosing root span.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, instrument = field::Empty)
}

/// Record the instrument being worked on in the current span.
pub fn annotate_span(instrument: &str) {
    Span::current().record("instrument", field::display(instrument));
}
