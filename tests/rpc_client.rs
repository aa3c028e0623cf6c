use outline_datasource::contract::{Credential, HttpResponse, MockHttpTransport, Rpc};
use outline_datasource::rpc::OutlineClient;
use outline_datasource::RpcError;
use serde_json::{json, Value};

fn credential() -> Credential {
    Credential::new("ol_api_test", "https://team.test/").expect("valid credential")
}

fn respond(status: u16, body: Value) -> Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

fn client_returning(status: u16, body: Value) -> OutlineClient<MockHttpTransport> {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_post_json()
        .times(1)
        .returning(move |_, _, _| respond(status, body.clone()));
    OutlineClient::with_transport(credential(), transport)
}

#[tokio::test]
async fn call_posts_to_method_path_with_bearer_key_and_returns_data() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_post_json()
        .withf(|url, api_key, body| {
            url == "https://team.test/api/documents.info"
                && api_key == "ol_api_test"
                && *body == json!({ "id": "A" })
        })
        .times(1)
        .returning(|_, _, _| {
            respond(
                200,
                json!({
                    "ok": true,
                    "status": 200,
                    "data": { "id": "A", "title": "Alpha", "text": "Hello" },
                    "policies": []
                }),
            )
        });
    let client = OutlineClient::with_transport(credential(), transport);

    let data = client
        .call("documents.info", json!({ "id": "A" }))
        .await
        .expect("call should succeed");

    assert_eq!(data, json!({ "id": "A", "title": "Alpha", "text": "Hello" }));
    assert!(data.get("ok").is_none(), "envelope must not leak to the caller");
}

#[tokio::test]
async fn null_params_are_sent_as_empty_object() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_post_json()
        .withf(|url, _, body| url.ends_with("/api/auth.info") && *body == json!({}))
        .times(1)
        .returning(|_, _, _| respond(200, json!({ "ok": true, "data": { "team": {} } })));
    let client = OutlineClient::with_transport(credential(), transport);

    client
        .call("auth.info", Value::Null)
        .await
        .expect("call should succeed");
}

#[tokio::test]
async fn unauthorized_and_forbidden_raise_auth_error() {
    for status in [401u16, 403] {
        let client = client_returning(
            status,
            json!({ "ok": false, "error": "authentication_required", "status": status }),
        );
        let err = client.call("auth.info", json!({})).await.unwrap_err();
        match err {
            RpcError::Auth { status: s, message } => {
                assert_eq!(s, status);
                assert_eq!(message, "authentication_required");
            }
            other => panic!("expected Auth for {status}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn missing_document_raises_not_found() {
    let client = client_returning(
        404,
        json!({ "ok": false, "error": "not_found", "message": "Document not found" }),
    );
    let err = client
        .call("documents.info", json!({ "id": "missing" }))
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::NotFound { ref message } if message == "Document not found"));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn other_failures_raise_remote_error_with_status() {
    let client = client_returning(
        429,
        json!({ "ok": false, "error": "rate_limit_exceeded" }),
    );
    let err = client.call("documents.list", json!({})).await.unwrap_err();
    assert!(
        matches!(err, RpcError::Remote { status: 429, ref message } if message == "rate_limit_exceeded"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn network_failure_raises_transport_error() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_post_json()
        .times(1)
        .returning(|_, _, _| Err("connection refused".into()));
    let client = OutlineClient::with_transport(credential(), transport);

    let err = client.call("collections.list", json!({})).await.unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn failures_are_not_retried() {
    // times(1) makes the mock panic on a second attempt.
    let client = client_returning(503, json!({ "ok": false, "error": "unavailable" }));
    let err = client.call("documents.list", json!({})).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}
