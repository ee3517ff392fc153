// Tests for the Todoist REST client against a local mock server.
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;
use todosched_core::integrations::{TaskApi, TodoistClient};
use todosched_core::task::{NewTask, TaskUpdate};
use todosched_core::{ApiError, Importer, ImportRequest};

const TOKEN: &str = "t0ken";

fn client(url: &str) -> TodoistClient {
    TodoistClient::new(TOKEN, url, Duration::from_secs(5)).unwrap()
}

fn task_body(id: &str, content: &str, project_id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "content": content,
        "description": "",
        "project_id": project_id,
        "section_id": null,
        "labels": [],
        "priority": 1,
        "due": null,
        "duration": null,
        "url": format!("https://todoist.com/showTask?id={id}")
    })
}

#[tokio::test]
async fn test_list_projects_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/projects")
        .match_header("authorization", "Bearer t0ken")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"id": "p1", "name": "Timetable", "color": "red"}]).to_string())
        .create_async()
        .await;

    let projects = client(&server.url()).list_projects().await.unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Timetable");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_tasks_filters_by_project() {
    let mut server = Server::new_async().await;
    let body = json!([{
        "id": "t1",
        "content": "Further Math",
        "project_id": "p1",
        "labels": ["FMath"],
        "priority": 3,
        "due": {
            "date": "2025-11-18",
            "string": "2025-11-18 09:05",
            "is_recurring": false,
            "datetime": "2025-11-18T01:05:00Z",
            "timezone": "Asia/Singapore"
        },
        "duration": {"amount": 90, "unit": "minute"}
    }]);
    let mock = server
        .mock("GET", "/tasks")
        .match_query(Matcher::UrlEncoded("project_id".into(), "p1".into()))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let tasks = client(&server.url()).list_tasks(Some("p1")).await.unwrap();

    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.labels, vec!["FMath"]);
    assert_eq!(task.duration.unwrap().in_minutes(), 90);
    let (start, end) = task.occupied(chrono_tz::UTC).unwrap();
    assert_eq!(start.to_rfc3339(), "2025-11-18T01:05:00+00:00");
    assert_eq!(end.to_rfc3339(), "2025-11-18T02:35:00+00:00");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_task_posts_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks")
        .match_header("authorization", "Bearer t0ken")
        .match_body(Matcher::PartialJson(json!({
            "content": "Physics",
            "project_id": "p1",
            "labels": ["Phy2"],
            "priority": 2,
            "due_datetime": "2025-11-18T03:00:00Z",
            "duration": 60,
            "duration_unit": "minute"
        })))
        .with_status(200)
        .with_body(task_body("t9", "Physics", "p1").to_string())
        .create_async()
        .await;

    let payload = NewTask {
        content: "Physics".into(),
        project_id: Some("p1".into()),
        labels: vec!["Phy2".into()],
        priority: 2,
        due_datetime: Some("2025-11-18T03:00:00Z".into()),
        duration: Some(60),
        duration_unit: Some(todosched_core::task::DurationUnit::Minute),
        ..NewTask::default()
    };
    let created = client(&server.url()).create_task(&payload).await.unwrap();

    assert_eq!(created.id, "t9");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_task_sends_only_given_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks/t1")
        .match_body(Matcher::Json(json!({"content": "Renamed", "priority": 4})))
        .with_status(200)
        .with_body(task_body("t1", "Renamed", "p1").to_string())
        .create_async()
        .await;

    let update = TaskUpdate {
        content: Some("Renamed".into()),
        priority: Some(4),
        ..TaskUpdate::default()
    };
    let task = client(&server.url()).update_task("t1", &update).await.unwrap();

    assert_eq!(task.content, "Renamed");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_task_accepts_empty_204() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/tasks/t1")
        .with_status(204)
        .create_async()
        .await;

    client(&server.url()).delete_task("t1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_carries_body_excerpt() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/labels")
        .with_status(403)
        .with_body("Forbidden: invalid token")
        .create_async()
        .await;

    let err = client(&server.url()).list_labels().await.unwrap_err();

    match err {
        ApiError::Status {
            status,
            endpoint,
            body,
        } => {
            assert_eq!(status, 403);
            assert_eq!(endpoint, "/labels");
            assert_eq!(body, "Forbidden: invalid token");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/projects")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server.url()).list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[test]
fn test_blank_token_rejected() {
    let result = TodoistClient::new("  ", "http://localhost", Duration::from_secs(1));
    assert!(matches!(result, Err(ApiError::MissingToken)));
}

#[tokio::test]
async fn test_import_creates_missing_project_then_task() {
    let mut server = Server::new_async().await;
    let list_projects = server
        .mock("GET", "/projects")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let list_labels = server
        .mock("GET", "/labels")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let create_project = server
        .mock("POST", "/projects")
        .match_body(Matcher::Json(json!({"name": "Timetable"})))
        .with_status(200)
        .with_body(json!({"id": "p7", "name": "Timetable"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let create_task = server
        .mock("POST", "/tasks")
        .match_body(Matcher::PartialJson(json!({"project_id": "p7"})))
        .with_status(200)
        .with_body(task_body("t1", "Math", "p7").to_string())
        .expect(2)
        .create_async()
        .await;

    let api = client(&server.url());
    let request: ImportRequest = serde_json::from_value(json!({
        "items": [
            {"title": "Math", "project_name": "Timetable"},
            {"title": "Math", "project_name": "Timetable"}
        ]
    }))
    .unwrap();
    let response = Importer::new(&api, chrono_tz::UTC)
        .run(request)
        .await
        .unwrap();

    assert_eq!(response.created.len(), 2);
    assert!(response.errors.is_empty());
    list_projects.assert_async().await;
    list_labels.assert_async().await;
    create_project.assert_async().await;
    create_task.assert_async().await;
}
