// ABOUTME: API error types with SNAFU pattern and structured-body decoding.
// ABOUTME: Classifies backend failures for retry decisions and exit reporting.

use crate::types::PipelineId;
use serde::Deserialize;
use snafu::Snafu;
use std::collections::BTreeMap;

/// One entry of a structured error body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Errors from talking to the orchestration service.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("request to {url} failed: {source}"))]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// Non-2xx response whose body parsed as the structured error shape.
    #[snafu(display("{}", render_structured(*status, error_id, errors)))]
    Api {
        status: u16,
        error_id: String,
        errors: Vec<ApiErrorDetail>,
    },

    /// Non-2xx response without a recognizable error body.
    #[snafu(display("unexpected response from {url}: HTTP {status}: {body}"))]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[snafu(display("could not encode request body: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("could not decode response from {url}: {source}"))]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// Dedicated sentinel: the backend knows no pipeline with this id.
    #[snafu(display("no pipeline found with id {id}"))]
    PipelineNotFound { id: PipelineId },

    /// Pass-through cancellation, never wrapped into a domain error.
    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced a usable response.
    Transport,
    /// The backend rejected the request (4xx).
    Client,
    /// The backend failed (5xx).
    Server,
    /// Structured not-found condition.
    NotFound,
    /// A response arrived but could not be encoded/decoded.
    Codec,
    /// The caller cancelled the operation.
    Cancelled,
}

impl ApiError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Transport { .. } => ApiErrorKind::Transport,
            ApiError::Api { status, .. } | ApiError::Http { status, .. } => {
                if *status >= 500 {
                    ApiErrorKind::Server
                } else {
                    ApiErrorKind::Client
                }
            }
            ApiError::Encode { .. } | ApiError::Decode { .. } => ApiErrorKind::Codec,
            ApiError::PipelineNotFound { .. } => ApiErrorKind::NotFound,
            ApiError::Cancelled => ApiErrorKind::Cancelled,
        }
    }

    /// Whether the provisioning retry path may try again: only a 404 (the
    /// resource has not materialized yet) or a transport failure with no
    /// response at all. Everything else surfaces immediately.
    pub fn is_provisioning_retryable(&self) -> bool {
        match self {
            ApiError::Transport { source, .. } => source.status().is_none(),
            ApiError::Api { status, .. } | ApiError::Http { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Turn a non-2xx response body into the matching error: structured when the
/// body parses as the known error shape, raw status+body otherwise.
pub(crate) fn classify_error_body(url: String, status: u16, body: String) -> ApiError {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct StructuredBody {
        error_id: String,
        #[serde(default)]
        errors: Vec<ApiErrorDetail>,
    }

    match serde_json::from_str::<StructuredBody>(&body) {
        Ok(parsed) => ApiError::Api {
            status,
            error_id: parsed.error_id,
            errors: parsed.errors,
        },
        Err(_) => ApiError::Http { url, status, body },
    }
}

fn render_structured(status: u16, error_id: &str, errors: &[ApiErrorDetail]) -> String {
    let mut rendered =
        format!("deployment service rejected the request (HTTP {status}, error id {error_id})");
    for detail in errors {
        rendered.push_str("\n  ");
        rendered.push_str(&detail.message);
        for (key, value) in &detail.metadata {
            rendered.push_str(&format!("\n    {key}: {value}"));
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_becomes_api_error() {
        let body = r#"{"errorId":"pipelines.create.denied","errors":[{"message":"quota exceeded","metadata":{"limit":10}}]}"#;
        let err = classify_error_body("http://x/pipelines".into(), 403, body.into());
        let ApiError::Api {
            status,
            error_id,
            errors,
        } = &err
        else {
            panic!("expected structured error, got {err:?}");
        };
        assert_eq!(*status, 403);
        assert_eq!(error_id, "pipelines.create.denied");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "quota exceeded");

        let rendered = err.to_string();
        assert!(rendered.contains("error id pipelines.create.denied"));
        assert!(rendered.contains("quota exceeded"));
        assert!(rendered.contains("limit: 10"));
    }

    #[test]
    fn unstructured_body_keeps_status_and_text() {
        let err = classify_error_body("http://x/pipelines".into(), 502, "bad gateway".into());
        assert!(matches!(err, ApiError::Http { status: 502, .. }));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn retry_predicate_is_404_only() {
        let not_found = classify_error_body("u".into(), 404, "missing".into());
        assert!(not_found.is_provisioning_retryable());

        let server = classify_error_body("u".into(), 500, "boom".into());
        assert!(!server.is_provisioning_retryable());

        let client = classify_error_body("u".into(), 400, "nope".into());
        assert!(!client.is_provisioning_retryable());
    }

    #[test]
    fn kinds_split_by_status_class() {
        assert_eq!(
            classify_error_body("u".into(), 503, "x".into()).kind(),
            ApiErrorKind::Server
        );
        assert_eq!(
            classify_error_body("u".into(), 422, "x".into()).kind(),
            ApiErrorKind::Client
        );
        assert_eq!(ApiError::Cancelled.kind(), ApiErrorKind::Cancelled);
    }
}
