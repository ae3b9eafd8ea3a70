//! HTTP span helpers.

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = route_for_path(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Replaces identifiers with their route parameter so metrics and span names stay low-cardinality.
fn route_for_path(path: &str) -> String {
    let mut route = String::new();
    let mut previous = "";

    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        route.push('/');

        match previous {
            "orders" => route.push_str("{reference}"),
            "items" => route.push_str("{item}"),
            _ => route.push_str(segment),
        }

        previous = segment;
    }

    if route.is_empty() {
        route.push('/');
    }

    route
}
