use std::sync::Arc;

use coursework::apper::{
    ApperConfig, ApperHttpClient, DeleteParams, FetchParams, RecordClient, RecordsParams, WhereClause,
};
use coursework::error::AppError;
use coursework::services::{CoursesService, GradesService};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

fn client_for(server: &MockServer) -> ApperHttpClient {
    // trailing slash must not produce `//tables`
    let config = ApperConfig::new("proj-1", "pk-1").with_base_url(format!("{}/", server.base_url()));
    ApperHttpClient::new(config).expect("Failed to build client")
}

#[tokio::test]
async fn test_fetch_records_sends_selection_and_filter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tables/grade_c/fetch")
                .header("x-apper-project-id", "proj-1")
                .header("x-apper-public-key", "pk-1")
                .json_body(json!({
                    "fields": [
                        { "field": { "Name": "Name" } },
                        { "field": { "Name": "course_id_c" } }
                    ],
                    "where": [
                        { "FieldName": "course_id_c", "Operator": "EqualTo", "Values": [3] }
                    ]
                }));
            then.status(200).json_body(json!({
                "success": true,
                "data": [{ "Id": 1, "Name": "Grade for Course 3", "course_id_c": 3 }]
            }));
        })
        .await;

    let params = FetchParams::select(["Name", "course_id_c"])
        .filter(WhereClause::equal_to("course_id_c", 3));
    let response = client_for(&server)
        .fetch_records("grade_c", &params)
        .await
        .expect("fetch failed");

    mock.assert_async().await;
    assert!(response.success);
    let rows = response.data.expect("missing data");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Id"], json!(1));
}

#[tokio::test]
async fn test_get_record_by_id_uses_record_path() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/tables/course_c/records/14");
            then.status(200).json_body(json!({ "success": true, "data": null }));
        })
        .await;

    let response = client_for(&server)
        .get_record_by_id("course_c", 14, &FetchParams::select(["Name"]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.success);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_create_update_delete_verbs() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tables/course_c/records")
                .json_body(json!({ "records": [{ "Name": "Physics" }] }));
            then.status(200).json_body(json!({
                "success": true,
                "results": [{ "success": true, "data": { "Id": 5, "Name": "Physics" } }]
            }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/tables/course_c/records")
                .json_body(json!({ "records": [{ "Id": 5, "color_c": "#00ff00" }] }));
            then.status(200).json_body(json!({
                "success": true,
                "results": [{
                    "success": false,
                    "errors": [{ "fieldLabel": "Color", "message": "must be a hex value" }]
                }]
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/tables/course_c/records")
                .json_body(json!({ "RecordIds": [5] }));
            then.status(200).json_body(json!({
                "success": true,
                "results": [{ "success": true }]
            }));
        })
        .await;

    let client = client_for(&server);

    let created = client
        .create_record(
            "course_c",
            &RecordsParams {
                records: vec![json!({ "Name": "Physics" }).as_object().cloned().unwrap()],
            },
        )
        .await
        .unwrap();
    let results = created.results.unwrap();
    assert!(results[0].success);

    let updated = client
        .update_record(
            "course_c",
            &RecordsParams {
                records: vec![json!({ "Id": 5, "color_c": "#00ff00" }).as_object().cloned().unwrap()],
            },
        )
        .await
        .unwrap();
    let errors = updated.results.unwrap()[0].errors.clone().unwrap();
    assert_eq!(errors[0].field_label, "Color");
    assert_eq!(errors[0].message, "must be a hex value");

    let deleted = client
        .delete_record("course_c", &DeleteParams { record_ids: vec![5] })
        .await
        .unwrap();
    assert!(deleted.success);

    create.assert_async().await;
    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_error_status_extracts_nested_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tables/course_c/fetch");
            then.status(401)
                .json_body(json!({ "data": { "message": "Invalid public key" } }));
        })
        .await;

    let service = CoursesService::new(Arc::new(client_for(&server)));
    let err = service.get_all().await.unwrap_err();

    assert!(matches!(err, AppError::Transport(_)));
    assert_eq!(err.to_string(), "Invalid public key");
}

#[tokio::test]
async fn test_error_status_without_message_keeps_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tables/grade_c/fetch");
            then.status(502).body("upstream down");
        })
        .await;

    let service = GradesService::new(Arc::new(client_for(&server)));
    let err = service.get_by_id(3).await.unwrap_err();

    assert!(matches!(err, AppError::Transport(_)));
    let message = err.to_string();
    assert!(message.contains("502"), "unexpected message: {}", message);
    assert!(message.contains("upstream down"), "unexpected message: {}", message);
}

#[tokio::test]
async fn test_course_service_over_http_decodes_json_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tables/course_c/records/2");
            then.status(200).json_body(json!({
                "success": true,
                "data": {
                    "Id": 2,
                    "Name": "Physics",
                    "credits_c": "4",
                    "schedule_c": "{\"days\":[\"Mon\",\"Wed\"]}",
                    "grade_categories_c": ""
                }
            }));
        })
        .await;

    let service = CoursesService::new(Arc::new(client_for(&server)));
    let course = service.get_by_id(2).await.unwrap();

    assert_eq!(course.name.as_deref(), Some("Physics"));
    assert_eq!(course.credits, Some(4.0));
    assert_eq!(course.schedule, Some(json!({ "days": ["Mon", "Wed"] })));
    assert_eq!(course.grade_categories, None);
}

#[tokio::test]
async fn test_truncated_success_body_reports_transport_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // promises 200 bytes, sends 12, then hangs up
        let response = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"success\":t";
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    let config = ApperConfig::new("proj-1", "pk-1").with_base_url(format!("http://{}", addr));
    let client = ApperHttpClient::new(config).unwrap();
    let err = client
        .fetch_records("course_c", &FetchParams::select(["Name"]))
        .await
        .unwrap_err();

    server.await.unwrap();
    assert!(matches!(err, AppError::Transport(_)));
    let message = err.to_string();
    assert!(
        !message.starts_with("Failed to parse Apper response"),
        "body read failure was reported as a parse error: {}",
        message
    );
}
