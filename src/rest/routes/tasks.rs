// rest/routes/tasks.rs — Task REST routes.
//
// Every failure maps to a 500 with a fixed plain-text message per endpoint.
// The underlying error goes to the log, never to the client.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::store::TaskRow;
use crate::AppContext;

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<TaskRow>>, (StatusCode, &'static str)> {
    match ctx.store.list_tasks().await {
        Ok(tasks) => Ok(Json(tasks)),
        Err(e) => {
            warn!(err = %e, "task list failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Couldn't retrieve tasks"))
        }
    }
}

/// Both fields are optional at the wire level so that a missing field
/// reaches store validation (and the fixed 500) instead of an extractor
/// rejection.
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<String, (StatusCode, &'static str)> {
    let title = body.title.unwrap_or_default();
    let content = body.content.unwrap_or_default();

    match ctx.store.create_task(&title, &content).await {
        Ok(id) => Ok(id),
        Err(e) => {
            warn!(err = %e, "task create failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Couldn't add task"))
        }
    }
}

#[derive(Deserialize)]
pub struct DeleteTaskQuery {
    #[serde(rename = "taskID", default)]
    pub task_id: Option<String>,
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<DeleteTaskQuery>,
) -> Result<&'static str, (StatusCode, &'static str)> {
    // Absent param falls through to id validation in the store.
    let id = q.task_id.unwrap_or_default();

    match ctx.store.delete_task(&id).await {
        Ok(()) => Ok("Task Deleted"),
        Err(e) => {
            warn!(err = %e, "task delete failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Couldn't delete task"))
        }
    }
}
