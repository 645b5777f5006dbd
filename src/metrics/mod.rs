/*!
 * # Metrics
 *
 * Prometheus counters for document workflow and stock operations, gathered
 * into one crate registry and exposed in text format at `/metrics`.
 */

use axum::{http::header, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new_custom(Some("tradedesk".into()), None)
        .expect("registry can be created");
    pub static ref DOCUMENTS_CREATED: IntCounterVec = register_counter_vec(
        "documents_created_total",
        "Documents created, by kind",
        &["kind"]
    );
    pub static ref DOCUMENT_ITEM_REPLACEMENTS: IntCounterVec = register_counter_vec(
        "document_item_replacements_total",
        "Committed line-item replacements, by kind",
        &["kind"]
    );
    pub static ref DOCUMENT_TRANSITIONS: IntCounterVec = register_counter_vec(
        "document_transitions_total",
        "Committed status transitions, by kind and action",
        &["kind", "action"]
    );
    pub static ref DOCUMENTS_DELETED: IntCounterVec = register_counter_vec(
        "documents_deleted_total",
        "Documents deleted, by kind",
        &["kind"]
    );
    pub static ref COMMAND_FAILURES: IntCounterVec = register_counter_vec(
        "command_failures_total",
        "Failed commands, by command and error type",
        &["command", "error_type"]
    );
    pub static ref STOCK_TRANSFERS: IntCounter = {
        let counter = IntCounter::new("stock_transfers_total", "Committed stock transfers")
            .expect("metric can be created");
        if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
            error!("failed to register stock_transfers_total: {}", e);
        }
        counter
    };
    pub static ref BRANCH_ACCESS_DENIALS: IntCounter = {
        let counter = IntCounter::new(
            "branch_access_denials_total",
            "Requests denied by the branch access policy",
        )
        .expect("metric can be created");
        if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
            error!("failed to register branch_access_denials_total: {}", e);
        }
        counter
    };
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels).expect("metric can be created");
    if let Err(e) = REGISTRY.register(Box::new(counter.clone())) {
        error!("failed to register {}: {}", name, e);
    }
    counter
}

/// Stable label for a failure, used on `command_failures_total`.
pub fn error_label(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::DatabaseError(_) => "db_error",
        ServiceError::NotFound(_) => "not_found",
        ServiceError::ValidationError(_)
        | ServiceError::InvalidFields(_)
        | ServiceError::InvalidInput(_) => "validation_error",
        ServiceError::InvalidStatus(_) => "invalid_status",
        ServiceError::Forbidden(_) | ServiceError::Unauthorized(_) => "access_denied",
        ServiceError::Conflict(_) | ServiceError::ConcurrentModification(_) => "conflict",
        ServiceError::InsufficientStock(_) => "insufficient_stock",
        ServiceError::EventError(_) => "event_error",
        ServiceError::InternalError(_) | ServiceError::Other(_) => "internal",
    }
}

pub fn record_failure(command: &str, err: &ServiceError) {
    COMMAND_FAILURES
        .with_label_values(&[command, error_label(err)])
        .inc();
}

/// Renders the registry in Prometheus text exposition format.
pub fn render() -> Result<String, ServiceError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding failed: {}", e)))
}

/// `GET /metrics`
pub async fn metrics_handler() -> Result<impl IntoResponse, ServiceError> {
    let body = render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        DOCUMENTS_CREATED.with_label_values(&["quotation"]).inc();
        record_failure("replace_items", &ServiceError::InvalidStatus("sent".into()));

        let text = render().unwrap();
        assert!(text.contains("tradedesk_documents_created_total"));
        assert!(text.contains("error_type=\"invalid_status\""));
    }
}
