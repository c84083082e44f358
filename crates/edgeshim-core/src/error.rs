use anyhow::Error as AnyError;
use serde_json::json;
use thiserror::Error;

use crate::body::Body;
use crate::http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use crate::response::{response_with_body, IntoResponse};

pub const NOT_FOUND_BODY: &str = "404 Not Found";

/// Errors that terminate a request. Every variant knows how to render itself as a response.
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("no route matched path: {path}")]
    NotFound { path: String },
    #[error("{message}")]
    BadRequest { message: String },
    #[error("route already registered: {method} {path}")]
    RouteConflict { method: String, path: String },
    #[error("{message}")]
    HandlerFailed { message: String },
    #[error("internal error: {source}")]
    Internal {
        #[from]
        source: AnyError,
    },
}

impl ShimError {
    pub fn not_found(path: impl Into<String>) -> Self {
        ShimError::NotFound { path: path.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ShimError::BadRequest {
            message: message.into(),
        }
    }

    pub fn route_conflict(method: impl Into<String>, path: impl Into<String>) -> Self {
        ShimError::RouteConflict {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn handler_failed(message: impl Into<String>) -> Self {
        ShimError::HandlerFailed {
            message: message.into(),
        }
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        ShimError::Internal {
            source: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ShimError::NotFound { .. } => StatusCode::NOT_FOUND,
            ShimError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ShimError::RouteConflict { .. }
            | ShimError::HandlerFailed { .. }
            | ShimError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        if let ShimError::NotFound { .. } = self {
            return response_with_body(StatusCode::NOT_FOUND, Body::text(NOT_FOUND_BODY));
        }

        let status = self.status();
        let body = Body::json(&json!({ "error": self.message() }))
            .unwrap_or_else(|_| Body::text("internal error"));
        let mut response = response_with_body(status, body);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_string(response: Response) -> String {
        let bytes = response.body().as_bytes().expect("buffered").to_vec();
        String::from_utf8(bytes).expect("utf8")
    }

    #[test]
    fn not_found_renders_plain_text() {
        let response = ShimError::not_found("/missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_string(response), "404 Not Found");
    }

    #[test]
    fn handler_failure_renders_error_envelope() {
        let response = ShimError::handler_failed("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let payload: serde_json::Value =
            serde_json::from_str(&body_string(response)).expect("json");
        assert_eq!(payload, json!({ "error": "boom" }));
    }

    #[test]
    fn internal_wraps_source_error() {
        let err = ShimError::internal(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal error: disk on fire");
    }

    #[test]
    fn bad_request_keeps_message() {
        let err = ShimError::bad_request("invalid URI");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "invalid URI");
    }

    #[test]
    fn route_conflict_names_method_and_path() {
        let err = ShimError::route_conflict("GET", "/api/info");
        assert_eq!(err.message(), "route already registered: GET /api/info");
    }
}
