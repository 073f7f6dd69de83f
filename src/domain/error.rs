//! Engine error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use super::{HttpMethod, SchemaId};

/// Every failure the mock engine can report. All of them are configuration
/// defects or lookup misses; none are retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MockError {
    #[error("No endpoint matches {method} {path} in project '{project_id}'")]
    EndpointNotFound {
        project_id: String,
        method: HttpMethod,
        path: String,
    },

    #[error("Cyclic schema reference: {}", .cycle.join(" -> "))]
    CyclicSchema { cycle: Vec<SchemaId>, path: String },

    #[error("Schema nesting exceeds the maximum depth of {max_depth} at '{path}'")]
    MaxDepthExceeded { max_depth: usize, path: String },

    #[error("Dangling reference to '{missing}' from {referrer}")]
    DanglingReference {
        missing: String,
        referrer: String,
        path: Option<String>,
    },

    #[error("Unknown generator '{generator}' at '{path}'")]
    UnknownGenerator { generator: String, path: String },

    #[error("Invalid parameters for generator '{generator}' at '{path}': {reason}")]
    InvalidGeneratorParams {
        generator: String,
        reason: String,
        path: String,
    },

    #[error("Invalid item count at '{path}': min ({min}) must not exceed max ({max})")]
    InvalidArrayCount { min: usize, max: usize, path: String },

    #[error("Item count {count} at '{path}' exceeds the limit of {max_items}")]
    ArrayTooLarge {
        count: usize,
        max_items: usize,
        path: String,
    },

    #[error("Response wrapper '{wrapper_id}' is not valid JSON: {reason}")]
    InvalidWrapperTemplate { wrapper_id: String, reason: String },

    #[error("Response wrapper '{wrapper_id}' must contain placeholder '{placeholder}' exactly once, found {found}")]
    WrapperPlaceholder {
        wrapper_id: String,
        placeholder: String,
        found: usize,
    },
}

impl MockError {
    /// Stable kind string used in error bodies and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EndpointNotFound { .. } => "EndpointNotFoundError",
            Self::CyclicSchema { .. } => "CyclicSchemaError",
            Self::MaxDepthExceeded { .. } => "MaxDepthExceededError",
            Self::DanglingReference { .. } => "DanglingReferenceError",
            Self::UnknownGenerator { .. } => "UnknownGeneratorError",
            Self::InvalidGeneratorParams { .. } => "InvalidGeneratorParamsError",
            Self::InvalidArrayCount { .. } | Self::ArrayTooLarge { .. } => {
                "InvalidArrayCountError"
            }
            Self::InvalidWrapperTemplate { .. } => "InvalidWrapperTemplateError",
            Self::WrapperPlaceholder { .. } => "WrapperPlaceholderError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EndpointNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field path the error refers to, when it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::CyclicSchema { path, .. }
            | Self::MaxDepthExceeded { path, .. }
            | Self::UnknownGenerator { path, .. }
            | Self::InvalidGeneratorParams { path, .. }
            | Self::InvalidArrayCount { path, .. }
            | Self::ArrayTooLarge { path, .. } => {
                if path.is_empty() {
                    None
                } else {
                    Some(path)
                }
            }
            Self::DanglingReference { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    pub fn to_body(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(path) = self.path() {
            error["path"] = json!(path);
        }
        json!({ "error": error })
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
