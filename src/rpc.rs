//! Outline RPC client.
//!
//! Every Outline operation is a `POST /api/<method>` with a JSON body and a
//! bearer token. Successful responses arrive wrapped in an envelope
//! (`{"ok": true, "data": ..., "pagination": ...}`); [`OutlineClient::call`]
//! unwraps it and hands back `data` alone. Failures are mapped onto
//! [`RpcError`] by status code. There is no retry loop: the first failure is
//! the one the caller sees.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::contract::{Credential, HttpResponse, HttpTransport, Rpc};
use crate::error::RpcError;
use crate::transport::ReqwestTransport;

const MAX_RAW_MESSAGE: usize = 200;

pub struct OutlineClient<T = ReqwestTransport> {
    credential: Credential,
    transport: T,
}

impl OutlineClient<ReqwestTransport> {
    pub fn new(credential: Credential) -> Self {
        Self::with_transport(credential, ReqwestTransport::new())
    }
}

impl<T: HttpTransport> OutlineClient<T> {
    pub fn with_transport(credential: Credential, transport: T) -> Self {
        Self {
            credential,
            transport,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

#[async_trait]
impl<T: HttpTransport> Rpc for OutlineClient<T> {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        let url = self.credential.endpoint(method);
        info!(method = %method, "[RPC] Calling Outline");
        debug!(method = %method, params = %body, "[RPC] Request body");

        let resp = self
            .transport
            .post_json(&url, self.credential.api_key(), &body)
            .await
            .map_err(|e| {
                error!(method = %method, error = %e, "[RPC][ERROR] Transport failure");
                RpcError::Transport(e)
            })?;

        let result = decode_response(method, resp);
        if let Err(e) = &result {
            error!(method = %method, error = %e, "[RPC][ERROR] Call failed");
        }
        result
    }
}

/// Unwraps an Outline envelope or maps the failure by status code.
pub(crate) fn decode_response(method: &str, resp: HttpResponse) -> Result<Value, RpcError> {
    let HttpResponse { status, body } = resp;
    let envelope: Option<Value> = serde_json::from_str(&body).ok();

    if (200..300).contains(&status) {
        let Some(mut envelope) = envelope else {
            return Err(RpcError::InvalidResponse {
                method: method.to_string(),
                reason: "response body is not JSON".to_string(),
            });
        };
        if envelope.get("ok") == Some(&Value::Bool(false)) {
            return Err(RpcError::Remote {
                status,
                message: error_message(Some(&envelope), &body, status),
            });
        }
        return match envelope.as_object_mut().and_then(|o| o.remove("data")) {
            Some(data) => Ok(data),
            None => Err(RpcError::InvalidResponse {
                method: method.to_string(),
                reason: "envelope has no data field".to_string(),
            }),
        };
    }

    let message = error_message(envelope.as_ref(), &body, status);
    Err(match status {
        401 | 403 => RpcError::Auth { status, message },
        404 => RpcError::NotFound { message },
        _ => RpcError::Remote { status, message },
    })
}

fn error_message(envelope: Option<&Value>, raw: &str, status: u16) -> String {
    let field = |name: &str| {
        envelope
            .and_then(|e| e.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    if let Some(msg) = field("message").or_else(|| field("error")) {
        return msg;
    }
    let raw = raw.trim();
    if !raw.is_empty() && envelope.is_none() {
        return raw.chars().take(MAX_RAW_MESSAGE).collect();
    }
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resp(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn success_returns_data_not_envelope() {
        let data = decode_response(
            "documents.list",
            resp(200, r#"{"ok":true,"data":[{"id":"A"}],"pagination":{"limit":25}}"#),
        )
        .unwrap();
        assert_eq!(data, json!([{"id": "A"}]));
    }

    #[test]
    fn ok_false_is_a_remote_error() {
        let err = decode_response("auth.info", resp(200, r#"{"ok":false,"error":"nope"}"#))
            .unwrap_err();
        match err {
            RpcError::Remote { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_data_is_invalid_response() {
        let err = decode_response("auth.info", resp(200, r#"{"ok":true}"#)).unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse { .. }));
        let err = decode_response("auth.info", resp(200, "<html>")).unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse { .. }));
    }

    #[test]
    fn auth_statuses_map_to_auth_error() {
        for status in [401, 403] {
            let err = decode_response(
                "auth.info",
                resp(status, r#"{"ok":false,"error":"authentication_required","message":"Authentication required"}"#),
            )
            .unwrap_err();
            match err {
                RpcError::Auth { status: s, message } => {
                    assert_eq!(s, status);
                    assert_eq!(message, "Authentication required");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let err = decode_response("documents.info", resp(404, r#"{"ok":false,"error":"not_found"}"#))
            .unwrap_err();
        assert!(matches!(err, RpcError::NotFound { ref message } if message == "not_found"));
    }

    #[test]
    fn other_status_falls_back_to_raw_body_then_reason() {
        let err = decode_response("documents.list", resp(502, "Bad gateway from proxy")).unwrap_err();
        assert!(
            matches!(err, RpcError::Remote { status: 502, ref message } if message == "Bad gateway from proxy")
        );

        let err = decode_response("documents.list", resp(500, "")).unwrap_err();
        assert!(
            matches!(err, RpcError::Remote { status: 500, ref message } if message == "Internal Server Error")
        );
    }
}
