use crate::{
    auth::{policy, CurrentUser},
    error::AppError,
    models::{
        task::{fold_status_counts, is_completed},
        Task, TaskInput, TaskPatch, TaskWithCreator,
    },
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, assigned_to, created_by, created_at, deadline";

const TASK_COLUMNS_WITH_CREATOR: &str = "t.id, t.title, t.description, t.status, t.priority, \
     t.assigned_to, t.created_by, t.created_at, t.deadline, \
     u.name AS creator_name, u.email AS creator_email";

/// Creates a new task.
///
/// Any authenticated user may create tasks, not only admins. The status is
/// normalized to title case and defaults to `Pending`; priority defaults to
/// `Low`. `created_by` is always the caller's id regardless of the body, and
/// the assignee email is stored as-is with no existence check.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: If input validation fails (e.g. empty title).
/// - `500 Internal Server Error`: For database errors.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), caller.id);

    let sql = format!(
        "INSERT INTO tasks ({TASK_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {TASK_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Task>(&sql)
        .bind(task.id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.assigned_to)
        .bind(task.created_by)
        .bind(task.created_at)
        .bind(task.deadline)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Lists the tasks the caller created or is assigned to (by email), with the
/// creator's name and email joined in for display. Unsorted.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS_WITH_CREATOR}
         FROM tasks t LEFT JOIN users u ON u.id = t.created_by
         WHERE t.created_by = $1 OR t.assigned_to = $2"
    );
    let tasks = sqlx::query_as::<_, TaskWithCreator>(&sql)
        .bind(caller.id)
        .bind(&caller.email)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Lists only the tasks assigned to the caller's email.
#[get("/my-tasks")]
pub async fn my_tasks(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = $1");
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(&caller.email)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Alias of `my_tasks`: tasks assigned to the caller's email.
#[get("/assigned")]
pub async fn assigned_tasks(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = $1");
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(&caller.email)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct AllTasksQuery {
    /// Exact-match filter on the assignee email.
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
}

/// Admin: lists every task, optionally filtered by exact assignee email,
/// newest-created first, with creator name/email joined in.
#[get("/all")]
pub async fn all_tasks(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    query: web::Query<AllTasksQuery>,
) -> Result<impl Responder, AppError> {
    policy::require(&caller, policy::Capability::ViewAllTasks)?;

    let tasks = match &query.assigned_to {
        Some(assigned_to) => {
            let sql = format!(
                "SELECT {TASK_COLUMNS_WITH_CREATOR}
                 FROM tasks t LEFT JOIN users u ON u.id = t.created_by
                 WHERE t.assigned_to = $1
                 ORDER BY t.created_at DESC"
            );
            sqlx::query_as::<_, TaskWithCreator>(&sql)
                .bind(assigned_to)
                .fetch_all(&**pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {TASK_COLUMNS_WITH_CREATOR}
                 FROM tasks t LEFT JOIN users u ON u.id = t.created_by
                 ORDER BY t.created_at DESC"
            );
            sqlx::query_as::<_, TaskWithCreator>(&sql)
                .fetch_all(&**pool)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(tasks))
}

/// Updates a task.
///
/// Admin callers merge the whole patch into the task by id, any field
/// included. Owner/assignee callers may only change `status`, and not once
/// the task's current status is a completed spelling; for them an ownership
/// failure is indistinguishable from a missing task.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `400 Bad Request`: If the task is already completed (non-admin callers).
/// - `404 Not Found`: If the task does not exist or the caller has no access.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    task_id: web::Path<Uuid>,
    patch: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    let patch = patch.into_inner();

    if policy::allows(&caller, policy::Capability::ReplaceAnyTask) {
        // Admin path: unconditional merge-by-id, completion guard bypassed.
        let sql = format!(
            "UPDATE tasks SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 status = COALESCE($4, status),
                 priority = COALESCE($5, priority),
                 assigned_to = COALESCE($6, assigned_to),
                 created_by = COALESCE($7, created_by),
                 deadline = COALESCE($8, deadline)
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.status)
            .bind(patch.priority)
            .bind(patch.assigned_to)
            .bind(patch.created_by)
            .bind(patch.deadline)
            .fetch_optional(&**pool)
            .await?;

        return match updated {
            Some(task) => Ok(HttpResponse::Ok().json(task)),
            None => Err(AppError::NotFound("Task not found".into())),
        };
    }

    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE id = $1 AND (created_by = $2 OR assigned_to = $3)"
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id)
        .bind(caller.id)
        .bind(&caller.email)
        .fetch_optional(&**pool)
        .await?;

    let task = match task {
        Some(task) => task,
        None => return Err(AppError::NotFound("Task not found or access denied".into())),
    };

    if is_completed(&task.status) {
        return Err(AppError::BadRequest(
            "Cannot update a task that is already completed.".into(),
        ));
    }

    // Only the status field is applied for owner/assignee callers; every
    // other patch field is silently ignored.
    let status = match patch.status {
        Some(status) => status,
        None => return Ok(HttpResponse::Ok().json(task)),
    };

    let sql = format!("UPDATE tasks SET status = $2 WHERE id = $1 RETURNING {TASK_COLUMNS}");
    let updated = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id)
        .bind(status)
        .fetch_one(&**pool)
        .await
        .map_err(|e| {
            log::error!("Error updating task: {}", e);
            AppError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Admin: permanently deletes a task by id.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    policy::require(&caller, policy::Capability::DeleteAnyTask)?;

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deleted successfully"
    })))
}

/// Admin: per-status task counts over four fixed buckets.
///
/// Groups by the upper-cased trimmed status, zero-fills empty buckets, and
/// discards any spelling outside the four reported ones.
#[get("/stats")]
pub async fn stats(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    policy::require(&caller, policy::Capability::ViewStats)?;

    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT UPPER(TRIM(status)), COUNT(*) FROM tasks GROUP BY UPPER(TRIM(status))",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(fold_status_counts(&rows)))
}
