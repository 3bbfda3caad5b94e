pub mod logger;

pub use logger::{TraceId, annotate_span, child_span, init_tracing, root_span};
