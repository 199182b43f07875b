use codespaces_proxy::{CodespacesClient, UpstreamError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> CodespacesClient {
    CodespacesClient::with_base_url(None, &server.uri()).unwrap()
}

#[tokio::test]
async fn test_requests_carry_version_agent_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/codespaces"))
        .and(header(
            "accept",
            "application/vnd.github+json;apiVersion=2022-11-28",
        ))
        .and(header("user-agent", "codespaces-proxy/upstream-client"))
        .and(header("authorization", "token ghp_test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"total_count":0,"codespaces":[]}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client_for(&server)
        .await
        .list_codespaces("ghp_test")
        .await
        .unwrap();

    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(&resp.body[..], br#"{"total_count":0,"codespaces":[]}"#);
    assert_eq!(resp.headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_empty_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/codespaces"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let resp = client_for(&server).await.list_codespaces("").await.unwrap();
    assert_eq!(resp.status.as_u16(), 401);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert!(!requests[0].headers.contains_key("content-type"));
}

#[tokio::test]
async fn test_named_actions_hit_expected_paths() {
    let server = MockServer::start().await;
    for (verb, route) in [
        ("GET", "/user/codespaces/my-cs"),
        ("DELETE", "/user/codespaces/my-cs"),
        ("POST", "/user/codespaces/my-cs/start"),
        ("POST", "/user/codespaces/my-cs/stop"),
    ] {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server).await;
    assert_eq!(client.get_codespace("t", "my-cs").await.unwrap().status.as_u16(), 202);
    assert_eq!(client.delete_codespace("t", "my-cs").await.unwrap().status.as_u16(), 202);
    assert_eq!(client.start_codespace("t", "my-cs").await.unwrap().status.as_u16(), 202);
    assert_eq!(client.stop_codespace("t", "my-cs").await.unwrap().status.as_u16(), 202);
}

#[tokio::test]
async fn test_name_is_escaped_as_single_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/codespaces/a%2Fb"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client_for(&server)
        .await
        .get_codespace("t", "a/b")
        .await
        .unwrap();
    assert_eq!(resp.status.as_u16(), 200);
}

#[tokio::test]
async fn test_names_needing_escape_are_encoded_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.start_codespace("t", "my cs").await.unwrap();
    client.stop_codespace("t", "x%2Fy").await.unwrap();

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/user/codespaces/my%20cs/start".to_string(),
            "/user/codespaces/x%252Fy/stop".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_create_sends_json_body() {
    let server = MockServer::start().await;
    let payload = json!({"repository_id": 42, "ref": "main", "machine": "basicLinux32gb"});
    Mock::given(method("POST"))
        .and(path("/user/codespaces"))
        .and(header("content-type", "application/json"))
        .and(body_json(&payload))
        .respond_with(
            ResponseTemplate::new(201).set_body_raw(r#"{"name":"new-cs"}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client_for(&server)
        .await
        .create_codespace("t", Some(&payload))
        .await
        .unwrap();
    assert_eq!(resp.status.as_u16(), 201);
    assert_eq!(&resp.body[..], br#"{"name":"new-cs"}"#);
}

#[tokio::test]
async fn test_token_scopes_parsed_from_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "token ghp_test"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-oauth-scopes", "repo, codespaces , gist"),
        )
        .mount(&server)
        .await;

    let scopes = client_for(&server)
        .await
        .get_token_scopes("ghp_test")
        .await
        .unwrap();
    assert_eq!(scopes, vec!["repo", "codespaces", "gist"]);
}

#[tokio::test]
async fn test_token_scopes_absent_header_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let scopes = client_for(&server)
        .await
        .get_token_scopes("ghp_fine_grained")
        .await
        .unwrap();
    assert!(scopes.is_empty());
}

#[tokio::test]
async fn test_token_scopes_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(401).insert_header("x-oauth-scopes", "codespaces"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .get_token_scopes("bad")
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::Status(401)));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let client = CodespacesClient::with_base_url(None, "http://127.0.0.1:1").unwrap();
    let err = client.list_codespaces("t").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Transport(_)));
}
