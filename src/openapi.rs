use serde::{Deserialize, Serialize};
#[cfg(feature = "utoipa")]
use utoipa::OpenApi;

#[cfg(feature = "utoipa")]
use crate::{
    models,
    routes::{health, prompts},
};

#[cfg(feature = "utoipa")]
/// OpenAPI documentation for promptvault
#[derive(OpenApi)]
#[openapi(
    info(
        title = "promptvault API",
        version = "0.1.0",
        description = r#"**promptvault** stores reusable LLM prompts and organizes them with tags.

## Overview

- Prompts carry a title, an optional description and the full prompt text.
- Tags are shared between prompts and are created the first time a prompt names them.
- Listing and search results are ordered newest first and paginated with `skip` and `limit`.

## Search

`POST /prompts/search` matches a case-insensitive substring against the title,
description and full prompt. Tags listed in the request must all be attached to a
matching prompt; naming a tag that does not exist yields an empty page.

## Errors

Errors use a single envelope:

```json
{"error": {"type": "invalid_request_error", "message": "Prompt not found", "param": null, "code": "not_found"}}
```
"#,
    ),
    servers(
        (url = "/", description = "Default server")
    ),
    tags(
        (name = "prompts", description = "Create, read, update, delete, list and search prompts."),
        (name = "health", description = "Health check endpoints for monitoring and orchestrators. Use `/health` for detailed status, `/health/live` for liveness checks, and `/health/ready` for readiness checks.")
    ),
    paths(
        prompts::create,
        prompts::list,
        prompts::get,
        prompts::update,
        prompts::delete,
        prompts::search,
        health::health_check,
        health::liveness,
        health::readiness,
    ),
    components(schemas(
        models::Prompt,
        models::Tag,
        models::CreatePrompt,
        models::UpdatePrompt,
        models::PromptSearch,
        models::PromptPage,
        health::HealthStatus,
        health::ComponentStatus,
        ErrorResponse,
        ErrorInfo,
    ))
)]
pub struct ApiDoc;

#[cfg(feature = "utoipa")]
impl ApiDoc {
    /// Build the OpenAPI spec.
    pub fn build() -> utoipa::openapi::OpenApi {
        Self::openapi()
    }
}

/// Standard error response body
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
}

/// Error information.
///
/// Format: `{"error": {"type": "...", "message": "...", "param": ..., "code": ...}}`
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ErrorInfo {
    /// Error type classification ("invalid_request_error" or "internal_error")
    #[cfg_attr(feature = "utoipa", schema(example = "invalid_request_error"))]
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable error message
    #[cfg_attr(feature = "utoipa", schema(example = "Prompt not found"))]
    pub message: String,
    /// Parameter that caused the error (null if not applicable)
    #[cfg_attr(feature = "utoipa", schema(example = json!(null)))]
    pub param: Option<String>,
    /// Machine-readable error code
    #[cfg_attr(feature = "utoipa", schema(example = "not_found"))]
    pub code: Option<String>,
    /// Request ID for correlating errors with logs, filled in by the request ID middleware.
    #[cfg_attr(
        feature = "utoipa",
        schema(example = "550e8400-e29b-41d4-a716-446655440000")
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with the default "invalid_request_error" type.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_type("invalid_request_error", code, message)
    }

    /// Create a new error response with explicit error type.
    pub fn with_type(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                param: None,
                code: Some(code.into()),
                request_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("not_found", "Prompt not found")).unwrap();
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "Prompt not found");
        assert!(body["error"]["param"].is_null());
    }

    #[test]
    #[cfg(feature = "utoipa")]
    fn test_spec_lists_prompt_routes() {
        let spec = ApiDoc::build();
        assert!(spec.paths.paths.contains_key("/prompts"));
        assert!(spec.paths.paths.contains_key("/prompts/{id}"));
        assert!(spec.paths.paths.contains_key("/prompts/search"));
        assert!(spec.paths.paths.contains_key("/health/ready"));
    }
}
