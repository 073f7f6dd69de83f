use super::common;

use common::test_server::{sample_definitions, TestServer};
use mockshape::domain::{FakerType, Schema, SchemaField};
use serde_json::Value;

#[tokio::test]
async fn test_wrapped_list_endpoint() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/mock/users"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-mock-endpoint"], "list-users");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["meta"]["source"], "mockshape");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    for user in items {
        assert!(user["email"].as_str().unwrap().contains('@'));
        let zip = user["address"]["zip"].as_str().unwrap();
        assert_eq!(zip.len(), 5);
        assert!(zip.chars().all(|c| c.is_ascii_digit()));
    }
}

#[tokio::test]
async fn test_seeded_requests_are_reproducible() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let fetch = |seed: &'static str| {
        let request = client
            .get(server.url("/api/mock/users/42"))
            .header("X-Mock-Seed", seed);
        async move { request.send().await.unwrap().json::<Value>().await.unwrap() }
    };

    let first = fetch("1234").await;
    let second = fetch("1234").await;
    let other = fetch("4321").await;
    assert_eq!(first, second);
    assert_ne!(first, other);

    let via_query: Value = client
        .get(server.url("/api/mock/users/42?seed=1234"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, via_query);
}

#[tokio::test]
async fn test_custom_status_code() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/mock/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_error_responses() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(server.url("/api/mock/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "EndpointNotFoundError");

    let response = client
        .get(server.url("/api/mock/loop"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "CyclicSchemaError");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("left -> right -> left"));

    let response = client
        .get(server.url("/api/mock/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "DanglingReferenceError");
}

#[tokio::test]
async fn test_projects_are_isolated() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/mock/users"))
        .header("X-Project-Id", "someone-else")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_reload_changes_payload_shape() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let before: Value = client
        .get(server.url("/api/mock/users/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(before.get("email").is_some());

    let mut definitions = sample_definitions();
    definitions.schemas[0] = Schema::new(
        "user",
        vec![SchemaField::primitive("nickname", FakerType::new("username"))],
    );
    server.ctx.reload(definitions).await;

    let after: Value = client
        .get(server.url("/api/mock/users/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(after.get("email").is_none());
    assert!(after["nickname"].is_string());
}

#[tokio::test]
async fn test_generator_listing() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/api/generators"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = body["generators"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"uuid"));
    assert!(ids.contains(&"email"));
    assert!(ids.contains(&"pattern"));
}
