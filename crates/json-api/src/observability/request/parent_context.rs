//! Upstream trace context for request spans.
//!
//! Storefronts and the kitchen display send W3C `traceparent` headers so a checkout can be
//! followed from the browser into the order database.

use opentelemetry::{
    Context, global,
    propagation::{Extractor, TextMapPropagator},
    trace::TraceContextExt as _,
};
use salvo::http::{HeaderMap, HeaderName};

/// Trace context the caller sent, if it names a valid span.
pub(super) fn upstream_trace(headers: &HeaderMap) -> Option<Context> {
    global::get_text_map_propagator(|propagator| upstream_trace_with(propagator, headers))
}

fn upstream_trace_with(
    propagator: &dyn TextMapPropagator,
    headers: &HeaderMap,
) -> Option<Context> {
    // Start empty so a request without headers does not join whatever span is current.
    let context = propagator.extract_with_context(&Context::new(), &TraceHeaders(headers));

    context
        .span()
        .span_context()
        .is_valid()
        .then_some(context)
}

#[derive(Debug)]
struct TraceHeaders<'a>(&'a HeaderMap);

impl Extractor for TraceHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}
