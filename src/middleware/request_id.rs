//! Request ID middleware for log correlation.
//!
//! Every request runs inside a `request` span carrying its ID. The ID comes
//! from the caller's `X-Request-Id` header when that is usable, otherwise a
//! fresh UUID is generated. It is echoed on the response and copied into
//! JSON error bodies as `error.request_id`.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Longest caller-supplied ID that is accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| is_acceptable_id(id))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let response = next.run(req).instrument(span).await;
    let mut response = inject_request_id_into_error(response, &request_id).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn is_acceptable_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Add `request_id` to the `error` object of 4xx/5xx JSON responses.
async fn inject_request_id_into_error(response: Response, request_id: &str) -> Response {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return (parts, Body::empty()).into_response(),
    };

    let Ok(mut json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    let Some(error) = json.get_mut("error").and_then(|e| e.as_object_mut()) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    error.insert(
        "request_id".to_string(),
        serde_json::Value::String(request_id.to_string()),
    );

    match serde_json::to_vec(&json) {
        Ok(modified) => {
            // Body length changed
            parts.headers.remove(http::header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(modified))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/missing",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": {"type": "invalid_request_error", "message": "nope"}})),
                    )
                }),
            )
            .route(
                "/plain-error",
                get(|| async { (StatusCode::BAD_REQUEST, "bad request") }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn send(uri: &str, request_id: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn header(response: &Response) -> String {
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let response = send("/ok", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(Uuid::parse_str(&header(&response)).is_ok());
    }

    #[tokio::test]
    async fn test_propagates_caller_id() {
        let response = send("/ok", Some("trace-abc-123")).await;
        assert_eq!(header(&response), "trace-abc-123");
    }

    #[tokio::test]
    async fn test_replaces_oversized_caller_id() {
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let response = send("/ok", Some(&long)).await;
        assert_ne!(header(&response), long);
    }

    #[tokio::test]
    async fn test_injects_id_into_json_error() {
        let response = send("/missing", Some("req-42")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["request_id"], "req-42");
        assert_eq!(body["error"]["message"], "nope");
    }

    #[tokio::test]
    async fn test_leaves_non_json_errors_alone() {
        let response = send("/plain-error", Some("req-43")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response), "req-43");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"bad request");
    }
}
