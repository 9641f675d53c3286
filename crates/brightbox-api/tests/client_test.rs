#![allow(clippy::unwrap_used)]
// Integration tests for the Brightbox API client using wiremock.

use brightbox_api::{
    ApiError, Client, CloudIpOptions, FirewallRuleOptions, Grant, Listener, LoadBalancerOptions,
    NodeRef, ServerOptions,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(account: Option<&str>) -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::with_token(
        reqwest::Client::new(),
        &server.uri(),
        SecretString::from("test-token".to_string()),
        account.map(str::to_string),
    );
    (server, client)
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_client_credentials_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_json(json!({ "grant_type": "client_credentials" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "issued", "expires_in": 7200 })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/1.0/servers/srv-12345"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "srv-12345" })))
        .mount(&server)
        .await;

    let client = Client::authenticate(
        reqwest::Client::new(),
        &server.uri(),
        "cli-12345",
        &secret("client-secret"),
        &Grant::ClientCredentials,
        None,
    )
    .await
    .unwrap();

    let srv = client.server("srv-12345").await.unwrap();
    assert_eq!(srv.id, "srv-12345");
}

#[tokio::test]
async fn test_password_grant_sends_user_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_json(json!({
            "grant_type": "password",
            "username": "jason@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "user" })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = Grant::Password {
        username: "jason@example.com".to_string(),
        password: secret("hunter2"),
    };
    let client = Client::authenticate(
        reqwest::Client::new(),
        &server.uri(),
        "app-12345",
        &secret("app-secret"),
        &grant,
        Some("acc-12345".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(client.account(), Some("acc-12345"));
}

#[tokio::test]
async fn test_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed"
        })))
        .mount(&server)
        .await;

    let result = Client::authenticate(
        reqwest::Client::new(),
        &server.uri(),
        "cli-12345",
        &secret("wrong"),
        &Grant::ClientCredentials,
        None,
    )
    .await;

    match result {
        Err(ApiError::Authentication(message)) => {
            assert_eq!(message, "Client authentication failed")
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Servers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_server_posts_options() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path("/1.0/servers"))
        .and(body_json(json!({
            "image": "img-12345",
            "name": "web-1",
            "server_groups": ["grp-12345"]
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "srv-12345",
            "name": "web-1",
            "status": "creating",
            "image": { "id": "img-12345", "username": "ubuntu" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ServerOptions {
        image: Some("img-12345".to_string()),
        name: Some("web-1".to_string()),
        server_groups: Some(vec!["grp-12345".to_string()]),
        ..Default::default()
    };
    let created = client.create_server(&options).await.unwrap();

    assert_eq!(created.id, "srv-12345");
    assert_eq!(created.status, "creating");
    assert_eq!(created.image.username.as_deref(), Some("ubuntu"));
}

#[tokio::test]
async fn test_account_scoped_requests() {
    let (server, client) = setup(Some("acc-12345")).await;

    Mock::given(method("GET"))
        .and(path("/1.0/servers/srv-12345"))
        .and(query_param("account_id", "acc-12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "srv-12345" })))
        .expect(1)
        .mount(&server)
        .await;

    client.server("srv-12345").await.unwrap();
}

#[tokio::test]
async fn test_missing_server_is_not_found() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/1.0/servers/srv-gone1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_name": "missing_resource",
            "errors": ["Resource not found"]
        })))
        .mount(&server)
        .await;

    let err = client.server("srv-gone1").await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    assert_eq!(
        err.to_string(),
        "API error (HTTP 404): missing_resource: Resource not found"
    );
}

#[tokio::test]
async fn test_destroy_server_accepts_body() {
    let (server, client) = setup(None).await;

    Mock::given(method("DELETE"))
        .and(path("/1.0/servers/srv-12345"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(json!({ "id": "srv-12345", "status": "deleting" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.destroy_server("srv-12345").await.unwrap();
}

// ── Cloud IPs ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_cloud_ip_map_and_update() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path("/1.0/cloud_ips/cip-12345/map"))
        .and(body_json(json!({ "destination": "int-12345" })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "cip-12345",
            "status": "mapped",
            "interface": { "id": "int-12345" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/1.0/cloud_ips/cip-12345"))
        .and(body_json(json!({ "reverse_dns": "web.example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cip-12345",
            "reverse_dns": "web.example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mapped = client.map_cloud_ip("cip-12345", "int-12345").await.unwrap();
    assert_eq!(mapped.target(), Some("int-12345"));

    let options = CloudIpOptions {
        reverse_dns: Some("web.example.com".to_string()),
        ..Default::default()
    };
    let updated = client.update_cloud_ip("cip-12345", &options).await.unwrap();
    assert_eq!(updated.reverse_dns.as_deref(), Some("web.example.com"));
}

// ── Firewall ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_firewall_policy_apply_and_rule_create() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path("/1.0/firewall_policies/fwp-12345/apply_to"))
        .and(body_json(json!({ "server_group": "grp-12345" })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "fwp-12345",
            "server_group": { "id": "grp-12345" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1.0/firewall_rules"))
        .and(body_json(json!({
            "firewall_policy": "fwp-12345",
            "protocol": "tcp",
            "destination_port": "22"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "fwr-12345",
            "protocol": "tcp",
            "destination_port": "22",
            "firewall_policy": { "id": "fwp-12345" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let policy = client
        .apply_firewall_policy("fwp-12345", "grp-12345")
        .await
        .unwrap();
    assert_eq!(policy.server_group.unwrap().id, "grp-12345");

    let options = FirewallRuleOptions {
        firewall_policy: Some("fwp-12345".to_string()),
        protocol: Some("tcp".to_string()),
        destination_port: Some("22".to_string()),
        ..Default::default()
    };
    let rule = client.create_firewall_rule(&options).await.unwrap();
    assert_eq!(rule.firewall_policy.id, "fwp-12345");
}

// ── Load balancers ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_load_balancer() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path("/1.0/load_balancers"))
        .and(body_json(json!({
            "name": "lb",
            "listeners": [{ "protocol": "http", "in": 80, "out": 8080 }],
            "nodes": [{ "node": "srv-12345" }]
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "lba-12345",
            "status": "creating",
            "listeners": [{ "protocol": "http", "in": 80, "out": 8080, "timeout": 50000 }],
            "healthcheck": { "type": "http", "port": 8080, "request": "/" },
            "nodes": [{ "id": "srv-12345" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = LoadBalancerOptions {
        name: Some("lb".to_string()),
        listeners: Some(vec![Listener {
            protocol: "http".to_string(),
            in_port: 80,
            out: 8080,
            timeout: None,
            proxy_protocol: None,
        }]),
        nodes: Some(vec![NodeRef {
            node: "srv-12345".to_string(),
        }]),
        ..Default::default()
    };
    let lb = client.create_load_balancer(&options).await.unwrap();

    assert_eq!(lb.status, "creating");
    assert_eq!(lb.listeners[0].timeout, Some(50000));
    assert_eq!(lb.healthcheck.kind, "http");
    assert_eq!(lb.nodes[0].id, "srv-12345");
}
