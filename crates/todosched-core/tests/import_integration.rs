//! Integration tests for schedule import.
//!
//! These run whole import requests against the in-memory task service and
//! check both the response and the calls the importer issued.

use chrono_tz::Tz;
use serde_json::json;
use todosched_core::integrations::{ApiCall, MemoryTaskApi};
use todosched_core::schedule::{ErrorKind, ImportMode, ImportOptions, ImportRequest, DRY_RUN_TASK_ID};
use todosched_core::task::{Due, TaskRecord};
use todosched_core::{CoreError, Importer};

fn sgt() -> Tz {
    "Asia/Singapore".parse().unwrap()
}

fn request(items: serde_json::Value, options: Option<ImportOptions>) -> ImportRequest {
    ImportRequest {
        items: items.as_array().cloned().unwrap(),
        options,
    }
}

fn existing_task(id: &str, project_id: &str) -> TaskRecord {
    TaskRecord {
        id: id.into(),
        content: format!("old {id}"),
        description: String::new(),
        project_id: Some(project_id.into()),
        section_id: None,
        labels: vec![],
        priority: 1,
        due: Some(Due::default()),
        duration: None,
        url: None,
    }
}

#[tokio::test]
async fn test_one_invalid_item_does_not_stop_the_batch() {
    let api = MemoryTaskApi::new();
    let items = json!([
        {"title": "Further Math", "start_datetime": "2025-11-18T09:00:00+08:00", "end_datetime": "2025-11-18T10:00:00+08:00"},
        {"title": "Physics", "start_datetime": "2025-11-18T11:00:00+08:00", "end_datetime": "2025-11-18T10:00:00+08:00"},
        {"title": "Chemistry", "due_string": "every tuesday at 14:00"},
        {"title": "Biology"}
    ]);

    let response = Importer::new(&api, sgt())
        .run(request(items, None))
        .await
        .unwrap();

    assert_eq!(response.created.len(), 3);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].index, 1);
    assert_eq!(response.errors[0].kind, ErrorKind::Validation);

    let indices: Vec<usize> = response.created.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 2, 3]);
    assert_eq!(api.tasks().len(), 3);
}

#[tokio::test]
async fn test_malformed_item_reported_by_index() {
    let api = MemoryTaskApi::new();
    let items = json!([
        {"title": "Physics"},
        {"description": "no title here"},
        {"title": "History", "priority": "urgent"}
    ]);

    let response = Importer::new(&api, sgt())
        .run(request(items, None))
        .await
        .unwrap();

    let failed: Vec<usize> = response.errors.iter().map(|e| e.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert!(response.errors[0].message.starts_with("Malformed item"));
    assert_eq!(response.created.len(), 1);
}

#[tokio::test]
async fn test_defaults_and_resolution() {
    let api = MemoryTaskApi::new();
    api.add_project("Timetable");
    api.add_label("school");

    let options = ImportOptions {
        default_project_name: Some("Timetable".into()),
        default_labels: vec!["school".into()],
        default_priority: Some(2),
        title_prefix: Some("[Class] ".into()),
        ..ImportOptions::default()
    };
    let items = json!([
        {"title": "Further Math", "labels": ["FMath"], "section_name": "Monday"},
        {"title": "Physics", "labels": ["Phy2", "FMath"], "section_name": "Monday", "priority": 4}
    ]);

    let response = Importer::new(&api, sgt())
        .run(request(items, Some(options)))
        .await
        .unwrap();
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let first = &response.created[0];
    assert_eq!(first.content, "[Class] Further Math");
    assert_eq!(first.labels, vec!["school", "FMath"]);
    assert_eq!(first.priority, 2);
    assert_eq!(response.created[1].priority, 4);
    assert_eq!(first.section_id, response.created[1].section_id);

    // Only the missing entities were created, each once.
    let writes = api.write_calls();
    let creates: Vec<&ApiCall> = writes
        .iter()
        .filter(|c| !matches!(c, ApiCall::CreateTask(_)))
        .collect();
    assert_eq!(creates.len(), 3, "{creates:?}");
    assert!(writes.contains(&ApiCall::CreateLabel("FMath".into())));
    assert!(writes.contains(&ApiCall::CreateLabel("Phy2".into())));
    assert!(writes
        .iter()
        .any(|c| matches!(c, ApiCall::CreateSection { name, .. } if name == "Monday")));
    assert_eq!(api.projects().len(), 1);
}

#[tokio::test]
async fn test_api_failure_is_per_item() {
    let api = MemoryTaskApi::new();
    api.fail_create_for("Physics");
    let items = json!([{"title": "Math"}, {"title": "Physics"}, {"title": "Art"}]);

    let response = Importer::new(&api, sgt())
        .run(request(items, None))
        .await
        .unwrap();

    assert_eq!(response.created.len(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].index, 1);
    assert_eq!(response.errors[0].kind, ErrorKind::Api);
    assert!(response.errors[0].message.contains("Todoist error"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing_and_keeps_shape() {
    let items = json!([
        {"title": "Further Math", "project_name": "New Project", "labels": ["FMath"]},
        {"title": "", "project_name": "New Project"}
    ]);
    let options = ImportOptions {
        dry_run: true,
        ..ImportOptions::default()
    };

    let dry_api = MemoryTaskApi::new();
    let dry = Importer::new(&dry_api, sgt())
        .run(request(items.clone(), Some(options)))
        .await
        .unwrap();

    assert!(dry_api.write_calls().is_empty());
    assert!(dry.dry_run);
    assert_eq!(dry.created.len(), 1);
    assert_eq!(dry.created[0].task_id, DRY_RUN_TASK_ID);
    assert!(dry.created[0].dry_run);
    assert_eq!(dry.created[0].project_id.as_deref(), Some("dry-run:New Project"));
    assert_eq!(dry.errors.len(), 1);

    let live_api = MemoryTaskApi::new();
    let live = Importer::new(&live_api, sgt())
        .run(request(items, None))
        .await
        .unwrap();

    let dry_json = serde_json::to_value(&dry).unwrap();
    let live_json = serde_json::to_value(&live).unwrap();
    let keys = |v: &serde_json::Value| -> Vec<String> {
        v.as_object().unwrap().keys().cloned().collect()
    };
    assert_eq!(keys(&dry_json), keys(&live_json));
    assert_eq!(
        keys(&dry_json["created"][0]),
        keys(&live_json["created"][0])
    );
    assert_eq!(dry.errors, live.errors);
}

#[tokio::test]
async fn test_replace_project_empties_target_first() {
    let api = MemoryTaskApi::new();
    let target = api.add_project("Timetable");
    let other = api.add_project("Personal");
    api.add_task(existing_task("old-1", &target.id));
    api.add_task(existing_task("old-2", &target.id));
    api.add_task(existing_task("keep", &other.id));

    let options = ImportOptions {
        mode: ImportMode::ReplaceProject,
        replace_project_name: Some("Timetable".into()),
        ..ImportOptions::default()
    };
    let items = json!([
        {"title": "Further Math", "project_name": "Personal"},
        {"title": "Physics"}
    ]);

    let response = Importer::new(&api, sgt())
        .run(request(items, Some(options)))
        .await
        .unwrap();

    assert_eq!(response.deleted, 2);
    assert_eq!(response.created.len(), 2);
    for created in &response.created {
        assert_eq!(created.project_id.as_deref(), Some(target.id.as_str()));
    }

    // Deletes happen before the first create.
    let writes = api.write_calls();
    let first_create = writes
        .iter()
        .position(|c| matches!(c, ApiCall::CreateTask(_)))
        .unwrap();
    let last_delete = writes
        .iter()
        .rposition(|c| matches!(c, ApiCall::DeleteTask(_)))
        .unwrap();
    assert!(last_delete < first_create);

    let remaining: Vec<String> = api.tasks().into_iter().map(|t| t.id).collect();
    assert!(remaining.contains(&"keep".to_string()));
    assert!(!remaining.contains(&"old-1".to_string()));
}

#[tokio::test]
async fn test_replace_project_delete_failure_aborts() {
    let api = MemoryTaskApi::new();
    let target = api.add_project("Timetable");
    api.add_task(existing_task("old-1", &target.id));
    api.fail_deletes();

    let options = ImportOptions {
        mode: ImportMode::ReplaceProject,
        replace_project_name: Some("Timetable".into()),
        ..ImportOptions::default()
    };
    let err = Importer::new(&api, sgt())
        .run(request(json!([{"title": "Physics"}]), Some(options)))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ReplaceAborted { ref project, .. } if project == "Timetable"));
    assert!(!api
        .write_calls()
        .iter()
        .any(|c| matches!(c, ApiCall::CreateTask(_))));
}

#[tokio::test]
async fn test_replace_project_dry_run_counts_without_deleting() {
    let api = MemoryTaskApi::new();
    let target = api.add_project("Timetable");
    api.add_task(existing_task("old-1", &target.id));
    api.add_task(existing_task("old-2", &target.id));

    let options = ImportOptions {
        mode: ImportMode::ReplaceProject,
        replace_project_name: Some("Timetable".into()),
        dry_run: true,
        ..ImportOptions::default()
    };
    let response = Importer::new(&api, sgt())
        .run(request(json!([{"title": "Physics"}]), Some(options)))
        .await
        .unwrap();

    assert_eq!(response.deleted, 2);
    assert_eq!(api.tasks().len(), 2);
    assert!(api.write_calls().is_empty());
}

#[tokio::test]
async fn test_created_time_block_is_stored_with_duration() {
    let api = MemoryTaskApi::new();
    let items = json!([{
        "title": "A2-1 Further Math",
        "description": "Room 204",
        "start_datetime": "2025-11-18T09:05",
        "end_datetime": "2025-11-18T10:35",
        "timezone": "Asia/Singapore"
    }]);
    Importer::new(&api, sgt())
        .run(request(items, None))
        .await
        .unwrap();

    let task = &api.tasks()[0];
    assert_eq!(task.duration.unwrap().in_minutes(), 90);
    assert_eq!(
        task.due.as_ref().unwrap().datetime.as_deref(),
        Some("2025-11-18T01:05:00Z")
    );
    assert!(task
        .description
        .contains("Time block: 2025-11-18T09:05:00+08:00 ~ 2025-11-18T10:35:00+08:00"));
}
