//! Mock tests for the query path
//!
//! A WireMock server stands in for the Cosmos data plane; the client is
//! connected with a locally generated master key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::CosmosCredential;
use crate::client::{CosmosQueryClient, QuerySpec};
use crate::error::CosmosError;

fn test_master_key() -> String {
    BASE64.encode(b"integration-test-master-key")
}

async fn connected_client(server: &MockServer) -> CosmosQueryClient {
    let mut client = CosmosQueryClient::new().expect("Failed to build client");
    client
        .connect(&server.uri(), CosmosCredential::MasterKey(test_master_key()))
        .await
        .expect("Failed to connect");
    client
}

#[tokio::test]
async fn query_container_returns_pretty_printed_documents() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .and(header("x-ms-documentdb-isquery", "true"))
        .and(header("x-ms-documentdb-query-enablecrosspartition", "true"))
        .and(header("x-ms-version", "2018-12-31"))
        .and(header("content-type", "application/query+json"))
        .and(header_exists("authorization"))
        .and(header_exists("x-ms-date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_rid": "mock",
            "Documents": [
                {"id": "1", "status": "error"},
                {"id": "2", "status": "error"}
            ],
            "_count": 2
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c WHERE c.status = 'error'");

    let output = client.query_container(&spec).await.unwrap();
    assert!(output.contains('\n'), "expected pretty-printed output");

    let documents: Vec<Value> = serde_json::from_str(&output).unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["id"], "1");
    assert_eq!(documents[1]["id"], "2");
}

#[tokio::test]
async fn bind_parameters_are_forwarded_positionally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .and(body_partial_json(json!({
            "query": "SELECT * FROM c WHERE c.id = @id",
            "parameters": [{"name": "@id", "value": "123"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [{"id": "123"}]
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c WHERE c.id = @id")
        .with_parameters(r#"{"@id": "123"}"#);

    let items = client.query_items(&spec).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "123");
}

#[tokio::test]
async fn continuation_pages_are_drained() {
    let server = MockServer::start().await;

    // Second page: only matches once the continuation token is echoed back.
    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .and(header("x-ms-continuation", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [{"id": "3"}]
        })))
        .mount(&server)
        .await;

    // First page: answered once, pointing at the second page.
    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "Documents": [{"id": "1"}, {"id": "2"}]
                }))
                .insert_header("x-ms-continuation", "page-2"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c");

    let items = client.query_items(&spec).await.unwrap();
    assert_eq!(items.len(), 3);
    let ids: Vec<&str> = items.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn missing_container_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/absent/docs"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NotFound",
            "message": "Resource Not Found"
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "absent", "SELECT * FROM c");

    let err = client.query_items(&spec).await.unwrap_err();
    assert!(matches!(err, CosmosError::NotFound(_)));
    assert!(err.to_string().starts_with("Resource not found:"));
}

#[tokio::test]
async fn rejected_query_maps_to_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "BadRequest",
            "message": "Syntax error, incorrect syntax near 'FORM'."
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FORM c");

    let err = client.query_items(&spec).await.unwrap_err();
    assert!(matches!(err, CosmosError::Query(_)));
    assert!(err.to_string().contains("incorrect syntax"));
}

#[tokio::test]
async fn query_without_connect_fails_fast() {
    let client = CosmosQueryClient::new().unwrap();
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c");

    let err = client.query_items(&spec).await.unwrap_err();
    assert!(matches!(err, CosmosError::NotConnected));

    let err = client.count_query_results(&spec).await.unwrap_err();
    assert!(matches!(err, CosmosError::NotConnected));
}

#[tokio::test]
async fn malformed_parameters_surface_as_generic_failure() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    let spec = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c").with_parameters("{not json");
    let err = client.query_items(&spec).await.unwrap_err();

    assert!(matches!(err, CosmosError::Other(_)));
    assert!(err.to_string().starts_with("Failed to query container:"));
}

#[tokio::test]
async fn count_handles_aggregate_and_plain_queries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .and(body_partial_json(json!({
            "query": "SELECT VALUE COUNT(1) FROM c"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [5]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .and(body_partial_json(json!({
            "query": "SELECT * FROM c"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [{"id": "1"}, {"id": "2"}]
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;

    let aggregate = QuerySpec::new("mydb", "mycoll", "SELECT VALUE COUNT(1) FROM c");
    assert_eq!(client.count_query_results(&aggregate).await.unwrap(), 5);

    let plain = QuerySpec::new("mydb", "mycoll", "SELECT * FROM c");
    assert_eq!(client.count_query_results(&plain).await.unwrap(), 2);
}

#[tokio::test]
async fn count_wraps_query_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/mydb/colls/mycoll/docs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "bad query"
        })))
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let spec = QuerySpec::new("mydb", "mycoll", "SELECT COUNT(1) FROM c");

    let err = client.count_query_results(&spec).await.unwrap_err();
    assert!(matches!(err, CosmosError::Other(_)));
    assert!(err.to_string().starts_with("Failed to count query results:"));
    assert!(err.to_string().contains("bad query"));
}
