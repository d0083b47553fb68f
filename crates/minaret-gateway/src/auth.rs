use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

/// Verify a static bearer token in the `Authorization: Bearer <token>`
/// header. `None` expected means the deployment opted out of the guard.
pub fn verify_bearer_token(headers: &HeaderMap, expected: Option<&str>) -> Result<(), String> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing Authorization header".to_string())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| "Authorization header must use Bearer scheme".to_string())?;

    if token == expected {
        Ok(())
    } else {
        Err("bearer token mismatch".to_string())
    }
}

pub fn auth_error(reason: &str) -> (StatusCode, Json<Value>) {
    warn!(reason = %reason, "request authentication failed");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "authentication failed", "reason": reason})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = value {
            h.insert("authorization", HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn unguarded_when_no_token_configured() {
        assert!(verify_bearer_token(&headers(None), None).is_ok());
        assert!(verify_bearer_token(&headers(Some("Bearer x")), None).is_ok());
    }

    #[test]
    fn matching_token_passes() {
        let h = headers(Some("Bearer sesame"));
        assert!(verify_bearer_token(&h, Some("sesame")).is_ok());
    }

    #[test]
    fn missing_header_fails() {
        assert!(verify_bearer_token(&headers(None), Some("sesame")).is_err());
    }

    #[test]
    fn wrong_scheme_fails() {
        let h = headers(Some("Basic sesame"));
        assert!(verify_bearer_token(&h, Some("sesame")).is_err());
    }

    #[test]
    fn mismatched_token_fails() {
        let h = headers(Some("Bearer open"));
        assert!(verify_bearer_token(&h, Some("sesame")).is_err());
    }
}
