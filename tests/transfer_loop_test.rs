//! Integration tests for the transfer loop against a mock transfer service.

mod common;

use std::path::Path;
use std::time::Duration;

use nanglobus::auth::{AccessTokenAuthorizer, Authorizer};
use nanglobus::transfer::{
    TaskStatus, TransferApiClient, TransferApiError, TransferDriver, TransferError, WaitOutcome,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_client(server: &MockServer) -> TransferApiClient {
    let authorizer = Authorizer::AccessToken(AccessTokenAuthorizer::new("test-token"));
    TransferApiClient::with_base_url(authorizer, server.uri())
}

fn driver_for(server: &MockServer, poll_secs: u64) -> TransferDriver {
    let config = common::test_config(Path::new("tokens.txt"), poll_secs);
    TransferDriver::new(api_client(server), &config)
}

async fn mount_ls_ok(server: &MockServer, endpoint: &str, folder: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/operation/endpoint/{endpoint}/ls")))
        .and(query_param("path", folder))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DATA_TYPE": "file_list",
            "path": folder,
            "DATA": []
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn unauthorized_activation_maps_to_expired_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/endpoint/{}/autoactivate",
            common::SOURCE_ENDPOINT
        )))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "AuthenticationFailed",
            "message": "Token is not active",
            "request_id": "abc123"
        })))
        .mount(&server)
        .await;

    let mut driver = driver_for(&server, 60);
    let err = driver.activate_endpoints().await.unwrap_err();

    assert!(matches!(&err, TransferError::RefreshTokenExpired { .. }));
    // The operator is told which file to delete.
    assert!(err.to_string().contains("tokens.txt"));
}

#[tokio::test]
async fn other_activation_failures_are_reraised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/endpoint/{}/autoactivate",
            common::SOURCE_ENDPOINT
        )))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "code": "ServiceUnavailable",
            "message": "backend restarting"
        })))
        .mount(&server)
        .await;

    let mut driver = driver_for(&server, 60);
    match driver.activate_endpoints().await.unwrap_err() {
        TransferError::Api(TransferApiError::Api { status, code, .. }) => {
            assert_eq!(status, 502);
            assert_eq!(code, "ServiceUnavailable");
        }
        other => panic!("expected the API error to pass through, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_failure_names_endpoint_and_remote_message() {
    let server = MockServer::start().await;
    mount_ls_ok(&server, common::SOURCE_ENDPOINT, common::SOURCE_FOLDER).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/operation/endpoint/{}/ls",
            common::DEST_ENDPOINT
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "ClientError.NotFound",
            "message": "No such directory"
        })))
        .mount(&server)
        .await;

    let mut driver = driver_for(&server, 60);
    let err = driver.run_once().await.unwrap_err();

    assert!(matches!(&err, TransferError::EndpointCheck { .. }));
    let message = err.to_string();
    assert!(message.contains(common::DEST_ENDPOINT));
    assert!(message.contains("No such directory"));
}

#[tokio::test]
async fn loop_submits_one_labeled_job_per_iteration() {
    let server = MockServer::start().await;
    mount_ls_ok(&server, common::SOURCE_ENDPOINT, common::SOURCE_FOLDER).await;
    mount_ls_ok(&server, common::DEST_ENDPOINT, common::DEST_FOLDER).await;

    Mock::given(method("GET"))
        .and(path("/submission_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "sub-1" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/transfer"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "source_endpoint": common::SOURCE_ENDPOINT,
            "destination_endpoint": common::DEST_ENDPOINT,
            "label": common::TRANSFER_LABEL,
            "sync_level": 3,
            "DATA": [{
                "source_path": common::SOURCE_FOLDER,
                "destination_path": common::DEST_FOLDER,
                "recursive": true
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "task-1",
            "code": "Accepted",
            "message": "The transfer has been accepted"
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/task/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "task-1",
            "status": "SUCCEEDED"
        })))
        .mount(&server)
        .await;

    // Poll time 2 s: submit at t=0, sleep, submit at t=2, cut at t=3.
    // Exactly two submissions means one sleep followed each iteration.
    let mut driver = driver_for(&server, 2);
    let outcome = tokio::time::timeout(Duration::from_secs(3), driver.run()).await;
    assert!(outcome.is_err(), "run() must not return on its own");

    server.verify().await;
}

#[tokio::test]
async fn bounded_wait_distinguishes_timeout_from_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/task/busy-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "busy-task",
            "status": "ACTIVE"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/task/done-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "done-task",
            "status": "SUCCEEDED",
            "files": 4,
            "files_transferred": 4
        })))
        .mount(&server)
        .await;

    let mut client = api_client(&server);

    let outcome = client
        .task_wait("busy-task", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(matches!(outcome, WaitOutcome::TimedOut));

    match client
        .task_wait("done-task", Duration::from_secs(1))
        .await
        .unwrap()
    {
        WaitOutcome::Done(task) => assert_eq!(task.status, TaskStatus::Succeeded),
        WaitOutcome::TimedOut => panic!("finished task reported as timed out"),
    }
}
