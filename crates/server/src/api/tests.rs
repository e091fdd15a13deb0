// Router tests against a mock identity provider

use super::create_router;
use crate::config::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use employee_mcp_core::auth::discovery::http_client;
use employee_mcp_core::auth::{Discovery, KeyResolver, TokenValidator, ValidationPolicy};
use employee_mcp_core::{Directory, SessionManager};
use employee_mcp_protocol::tools::directory_registry;
use employee_mcp_protocol::McpHandler;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DISCOVERY_PATH: &str = "/oauth2/employee-mcp-server/.well-known/oauth-authorization-server";
const JWKS_PATH: &str = "/oauth2/employee-mcp-server/v1/keys";

async fn identity_provider() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": format!("{}/oauth2/employee-mcp-server", server.uri()),
            "jwks_uri": format!("{}{}", server.uri(), JWKS_PATH),
        })))
        .mount(&server)
        .await;

    let key: Value = serde_json::from_str(include_str!(
        "../../../core/tests/fixtures/rsa_public.jwk.json"
    ))
    .unwrap();
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [key] })))
        .mount(&server)
        .await;

    server
}

fn token(scope: &str) -> String {
    let key = EncodingKey::from_rsa_pem(include_bytes!(
        "../../../core/tests/fixtures/rsa_private.pem"
    ))
    .unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("test-key-1".to_string());
    let claims = json!({
        "sub": "user@example.com",
        "aud": "api://employees",
        "scope": scope,
        "exp": Utc::now().timestamp() + 3600,
    });
    jsonwebtoken::encode(&header, &claims, &key).unwrap()
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _idp: MockServer,
}

async fn app() -> TestApp {
    app_with_policy(ValidationPolicy::default()).await
}

async fn app_with_policy(policy: ValidationPolicy) -> TestApp {
    let idp = identity_provider().await;
    let url = Url::parse(&format!("{}{}", idp.uri(), DISCOVERY_PATH)).unwrap();
    let discovery = Arc::new(Discovery::new(url, http_client().unwrap()));
    let keys = KeyResolver::new(discovery.clone());
    let validator = TokenValidator::from_parts(discovery, keys, policy);

    let registry = directory_registry(Arc::new(Directory::fixture()));
    let state = Arc::new(AppState::from_parts(
        Arc::new(validator),
        Arc::new(SessionManager::new()),
        McpHandler::new(Arc::new(registry)),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        _idp: idp,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_mcp(&self, body: Value, headers: &[(&str, &str)]) -> Response {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "clientInfo": {"name": "test-client", "version": "0.1"}
        }
    })
}

fn session_id(response: &Response) -> String {
    response
        .headers()
        .get("mcp-session-id")
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "employee-mcp-server");
}

#[tokio::test]
async fn test_initialize_without_auth_creates_session() {
    let app = app().await;
    let response = app.post_mcp(initialize_request(), &[]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let session = session_id(&response);
    assert!(app.state.sessions.validate(&session));

    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(body["result"]["capabilities"]["tools"]["listChanged"], false);
}

#[tokio::test]
async fn test_tools_call_without_token_is_unauthorized() {
    let app = app().await;
    let response = app
        .post_mcp(
            json!({
                "jsonrpc": "2.0",
                "id": "call-1",
                "method": "tools/call",
                "params": {"name": "list_employees", "arguments": {}}
            }),
            &[],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["id"], "call-1");
}

#[tokio::test]
async fn test_tools_call_in_session_without_token_is_unauthorized() {
    let app = app().await;
    let session = session_id(&app.post_mcp(initialize_request(), &[]).await);

    let response = app
        .post_mcp(
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "list_employees", "arguments": {}}
            }),
            &[("mcp-session-id", session.as_str())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("mcp-session-id").is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_initialize_notification_creates_no_session() {
    let app = app().await;
    let response = app
        .post_mcp(json!({"jsonrpc": "2.0", "method": "initialize", "params": {}}), &[])
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().get("mcp-session-id").is_none());
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_required_scopes_list_active_employees() {
    let app = app_with_policy(ValidationPolicy::default().with_required_scopes(["mcp:read"])).await;
    let session = session_id(&app.post_mcp(initialize_request(), &[]).await);
    let list_active = json!({
        "jsonrpc": "2.0",
        "id": 8,
        "method": "tools/call",
        "params": {"name": "list_employees", "arguments": {"status_filter": "Active"}}
    });

    // Signed and unexpired, but without the required scope
    let auth = format!("Bearer {}", token("openid"));
    let response = app
        .post_mcp(list_active.clone(), &[("authorization", auth.as_str()), ("mcp-session-id", session.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let auth = format!("Bearer {}", token("mcp:read"));
    let response = app
        .post_mcp(list_active, &[("authorization", auth.as_str()), ("mcp-session-id", session.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let active = Directory::fixture().list_employees("Active").len();
    let body = body_json(response).await;
    assert_eq!(body["result"]["status_filter"], "Active");
    assert_eq!(body["result"]["total_count"], active);
    assert_eq!(body["result"]["employees"].as_array().unwrap().len(), active);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = app().await;
    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            &[("authorization", "Bearer not.a.token")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_flow() {
    let app = app().await;
    let auth = format!("Bearer {}", token("mcp:read"));

    let response = app.post_mcp(initialize_request(), &[]).await;
    let session = session_id(&response);

    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            &[("authorization", auth.as_str()), ("mcp-session-id", session.as_str())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .post_mcp(
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "list_employees", "arguments": {"status_filter": "All"}}
            }),
            &[
                ("authorization", auth.as_str()),
                ("mcp-session-id", session.as_str()),
                ("mcp-protocol-version", "2025-06-18"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session_id(&response), session);

    let body = body_json(response).await;
    assert_eq!(body["id"], 3);
    assert_eq!(body["result"]["total_count"], 15);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app().await;
    let auth = format!("Bearer {}", token("mcp:read"));

    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/list"}),
            &[("authorization", auth.as_str()), ("mcp-session-id", "no-such-session")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_delete_terminates_session() {
    let app = app().await;
    let auth = format!("Bearer {}", token("mcp:read"));
    let session = session_id(&app.post_mcp(initialize_request(), &[]).await);

    let delete = |id: Option<&str>| {
        let mut request = Request::builder().method(Method::DELETE).uri("/mcp");
        if let Some(id) = id {
            request = request.header("mcp-session-id", id);
        }
        request.body(Body::empty()).unwrap()
    };

    let response = app.send(delete(None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Mcp-Session-Id header required");

    let response = app.send(delete(Some(session.as_str()))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "terminated");
    assert!(app.state.sessions.is_empty());

    // Terminating twice is harmless
    let response = app.send(delete(Some(session.as_str()))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/list"}),
            &[("authorization", auth.as_str()), ("mcp-session-id", session.as_str())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protocol_version_mismatch() {
    let app = app().await;
    let response = app
        .post_mcp(initialize_request(), &[("mcp-protocol-version", "2024-11-05")])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_invalid_json_and_invalid_message() {
    let app = app().await;

    let response = app
        .send(
            Request::post("/mcp")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32700);

    let response = app.post_mcp(json!({"id": 9, "method": 42}), &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 9);
}

#[tokio::test]
async fn test_tool_call_without_name_is_bad_request() {
    let app = app().await;
    let auth = format!("Bearer {}", token("mcp:read"));

    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {}}),
            &[("authorization", auth.as_str())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32602);
}

#[tokio::test]
async fn test_unknown_method_is_rpc_error() {
    let app = app().await;
    let auth = format!("Bearer {}", token("mcp:read"));

    let response = app
        .post_mcp(
            json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"}),
            &[("authorization", auth.as_str())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["message"], "Unknown method: resources/list");
}

#[tokio::test]
async fn test_get_mcp_not_supported() {
    let app = app().await;
    let response = app
        .send(Request::get("/mcp").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await["error"],
        "SSE streaming not currently supported"
    );
}

#[tokio::test]
async fn test_rest_list_tools() {
    let app = app().await;

    let response = app
        .send(Request::get("/tools").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body_json(response).await["error"], "Invalid or missing token");

    let response = app
        .send(
            Request::get("/tools")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("mcp:read openid")))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 6);
    assert_eq!(body["tools"][0]["name"], "list_employees");
    assert_eq!(body["token_info"]["sub"], "user@example.com");
    assert_eq!(body["token_info"]["scope"], "mcp:read openid");
}

#[tokio::test]
async fn test_rest_call_tool() {
    let app = app().await;
    let response = app
        .send(
            Request::post("/call_tool")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("read_data")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"tool_name": "get_employee_info", "arguments": {"employee_identifier": "EMP001"}})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["employee"]["employee_id"], "EMP001");
    assert_eq!(body["token_info"]["aud"], "api://employees");
}

#[tokio::test]
async fn test_rest_tool_by_name() {
    let app = app().await;
    let call = |name: &str, scope: &str, body: &'static str| {
        Request::post(format!("/tools/{}", name))
            .header(header::AUTHORIZATION, format!("Bearer {}", token(scope)))
            .body(Body::from(body))
            .unwrap()
    };

    // Ungated tool with no body
    let response = app.send(call("get_benefits_info", "openid", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"]["total_employees"], 15);

    // Gated tool without a read scope
    let response = app.send(call("get_salary_info", "openid", "{}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["result"]["error"],
        "insufficient_permissions"
    );

    let response = app
        .send(call("list_employees", "mcp:read", r#"{"status_filter": 5}"#))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(call("no_such_tool", "mcp:read", "{}")).await;
    assert_eq!(
        body_json(response).await["result"]["error"],
        "Unknown tool: no_such_tool"
    );
}
