//! Mapping of Cosmos DB REST responses to CosmosError kinds
//!
//! The data plane reports failures as JSON bodies of the form
//! `{"code": "...", "message": "..."}`; the message is extracted when
//! present and the HTTP status decides the error kind.

use reqwest::StatusCode;
use serde_json::Value;

use super::CosmosError;

/// Map a non-success query response to the appropriate error kind.
///
/// 404 means the database or container is absent; every other rejection is
/// a query error. Transport-level failures never reach this function.
pub(crate) fn map_query_error(status: StatusCode, body: &str) -> CosmosError {
    let detail = describe_failure(status, body);

    match status {
        StatusCode::NOT_FOUND => CosmosError::not_found(detail),
        _ => CosmosError::query(detail),
    }
}

/// Build a readable failure description from a status and response body.
fn describe_failure(status: StatusCode, body: &str) -> String {
    if let Some(message) = extract_error_message(body) {
        return format!("status {}: {}", status.as_u16(), message);
    }

    if body.trim().is_empty() {
        format!("status {}", status.as_u16())
    } else if body.len() > 200 {
        format!("status {}: {:.200}...", status.as_u16(), body)
    } else {
        format!("status {}: {}", status.as_u16(), body)
    }
}

/// Pull the `message` field out of a Cosmos error body, if there is one.
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .or_else(|| json.get("Message"))
        .and_then(|m| m.as_str())
        .map(|m| m.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found_kind() {
        let err = map_query_error(
            StatusCode::NOT_FOUND,
            r#"{"code": "NotFound", "message": "Resource Not Found"}"#,
        );
        assert!(matches!(err, CosmosError::NotFound(_)));
        assert!(err.to_string().contains("status 404"));
        assert!(err.to_string().contains("Resource Not Found"));
    }

    #[test]
    fn bad_request_maps_to_query_kind() {
        let err = map_query_error(
            StatusCode::BAD_REQUEST,
            r#"{"code": "BadRequest", "message": "Syntax error, incorrect syntax near 'FORM'."}"#,
        );
        assert!(matches!(err, CosmosError::Query(_)));
        assert!(err.to_string().contains("incorrect syntax"));
    }

    #[test]
    fn non_json_body_is_reported_verbatim() {
        let err = map_query_error(StatusCode::FORBIDDEN, "access denied");
        assert!(matches!(err, CosmosError::Query(_)));
        assert!(err.to_string().contains("status 403: access denied"));
    }

    #[test]
    fn empty_body_reports_status_only() {
        let err = map_query_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            err.to_string(),
            "Cosmos DB query error: status 500"
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let err = map_query_error(StatusCode::BAD_GATEWAY, &body);
        assert!(err.to_string().len() < 300);
        assert!(err.to_string().ends_with("..."));
    }
}
