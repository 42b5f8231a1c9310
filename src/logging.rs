//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The request body fields whose values must never reach the logs.
const REDACTED_FIELDS: [&str; 3] = ["secret", "access_token", "public_token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged at the `debug` level.
///
/// Credential fields in JSON request bodies (Plaid secrets and tokens) are
/// redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.headers.get(CONTENT_TYPE) == Some(&"application/json".parse().unwrap()) {
        log_request(&headers, &redact_credentials(&body_text));
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the values of credential fields in a JSON body with asterisks,
/// wherever they appear in the document.
///
/// Bodies that are not valid JSON are returned unchanged.
fn redact_credentials(body_text: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(body_text) else {
        return body_text.to_string();
    };

    redact_value(&mut value);

    value.to_string()
}

fn redact_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *entry = serde_json::Value::String("********".to_string());
                } else {
                    redact_value(entry);
                }
            }
        }
        serde_json::Value::Array(entries) => {
            for entry in entries {
                redact_value(entry);
            }
        }
        _ => {}
    }
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

/// The maximum number of body bytes logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redaction_tests {
    use serde_json::json;

    use super::redact_credentials;

    #[test]
    fn credential_fields_are_redacted_wherever_nested() {
        let body = json!({
            "access_token": "access-sandbox-123",
            "start_date": "2024-01-01",
            "credentials": {
                "client_id": "client_123",
                "secret": "shh",
                "environment": "sandbox",
            },
        })
        .to_string();

        let redacted = redact_credentials(&body);

        assert!(!redacted.contains("access-sandbox-123"));
        assert!(!redacted.contains("shh"));
        assert!(redacted.contains("********"));
        // Non-credential fields are left alone.
        assert!(redacted.contains("client_123"));
        assert!(redacted.contains("2024-01-01"));
    }

    #[test]
    fn public_token_is_redacted() {
        let body = json!({ "public_token": "public-sandbox-456" }).to_string();

        let redacted = redact_credentials(&body);

        assert!(!redacted.contains("public-sandbox-456"));
    }

    #[test]
    fn non_json_bodies_are_returned_unchanged() {
        let body = "not json at all";

        assert_eq!(redact_credentials(body), body);
    }
}
