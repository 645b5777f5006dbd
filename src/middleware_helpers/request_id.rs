use crate::tracing::{log_slow_request, scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Accepts a client-supplied id only if it is short, printable ASCII.
fn incoming_request_id(request: &Request) -> Option<(RequestId, HeaderValue)> {
    let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty()
        || raw.len() > MAX_REQUEST_ID_LEN
        || !raw.chars().all(|c| c.is_ascii_graphic())
    {
        return None;
    }
    let value = HeaderValue::from_str(raw).ok()?;
    Some((RequestId::new(raw), value))
}

fn generated_request_id() -> (RequestId, HeaderValue) {
    let request_id = RequestId::default();
    // uuid text is always a valid header value
    let value = HeaderValue::from_str(request_id.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    (request_id, value)
}

/// Tags every request with an id: kept from `x-request-id` when sane,
/// generated otherwise. The id is inserted as a request extension, scoped
/// for error bodies and copied onto the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let (request_id, header_value) =
        incoming_request_id(&request).unwrap_or_else(generated_request_id);

    request.headers_mut().insert(
        HeaderName::from_static(REQUEST_ID_HEADER),
        header_value.clone(),
    );
    request.extensions_mut().insert(request_id.clone());

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = scope_request_id(request_id.clone(), next.run(request)).await;

    log_slow_request(&request_id, &method, &path, started.elapsed());
    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    response
}
