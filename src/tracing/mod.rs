use axum::http::Request;
use std::{cell::RefCell, fmt, future::Future, time::Duration};
use tower_http::{
    classify::{SharedClassifier, StatusInRangeAsFailures},
    trace::{
        DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse,
        MakeSpan, TraceLayer,
    },
};
use tracing::warn;
use uuid::Uuid;

/**
 * Request tracing
 *
 * Every request carries a [`RequestId`] (taken from `x-request-id` or
 * generated). It is attached to the HTTP span, stored in a task-local for
 * error bodies, and echoed back on the response.
 */

/// Requests slower than this are logged at warn level.
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(750);

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

/// Runs `future` with `request_id` visible to [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get(crate::middleware_helpers::request_id::REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::new)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// HTTP trace layer: 5xx responses are classified as failures.
pub fn configure_http_tracing() -> TraceLayer<
    SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DefaultOnFailure,
> {
    TraceLayer::new(SharedClassifier::new(StatusInRangeAsFailures::new(
        500..=599,
    )))
    .make_span_with(RequestSpanMaker)
    .on_request(DefaultOnRequest::default())
    .on_response(DefaultOnResponse::default())
    .on_body_chunk(DefaultOnBodyChunk::default())
    .on_eos(DefaultOnEos::default())
    .on_failure(DefaultOnFailure::default())
}

pub fn log_slow_request(request_id: &RequestId, method: &str, path: &str, duration: Duration) {
    if duration > SLOW_REQUEST_THRESHOLD {
        warn!(
            request_id = %request_id,
            method,
            path,
            duration_ms = %duration.as_millis(),
            threshold_ms = %SLOW_REQUEST_THRESHOLD.as_millis(),
            "Slow request detected"
        );
    }
}
