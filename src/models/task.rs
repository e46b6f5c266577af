use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    /// Low priority. The default when a task is created without one.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

/// Status a task is created with when none is supplied.
///
/// Status is stored as free text rather than a closed enum: the creation path
/// title-cases whatever string the client sends, and non-admin updates write
/// the patch's status verbatim, so values outside the canonical
/// `Pending`/`Working`/`Completed` set exist in real data.
pub const DEFAULT_STATUS: &str = "Pending";

/// The four fixed reporting buckets of the stats endpoint. Statuses grouped
/// under any other spelling are counted but not reported.
pub const STATS_BUCKETS: [&str; 4] = ["PENDING", "WORKING", "IN PROGRESS", "COMPLETED"];

/// Normalizes a client-supplied status to title case, word by word,
/// e.g. `"in progress"` becomes `"In Progress"`.
pub fn normalize_status(raw: &str) -> String {
    raw.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a status string marks the task as finished. The guard is
/// case-insensitive and accepts both historical spellings.
pub fn is_completed(status: &str) -> bool {
    let status = status.to_lowercase();
    status == "complete" || status == "completed"
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Required, between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description, at most 1000 characters.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Optional status; defaults to `Pending` and is normalized to title case.
    #[validate(length(max = 50))]
    pub status: Option<String>,

    /// Optional priority; defaults to `Low`.
    pub priority: Option<TaskPriority>,

    /// Email of the assignee. Stored as a raw string with no existence check
    /// against the user store; listing by assignee matches on it exactly.
    pub email: Option<String>,

    /// Optional deadline for the task.
    pub deadline: Option<DateTime<Utc>>,
}

/// Patch body for task updates.
///
/// For admin callers every present field is merged into the task, including
/// `created_by`. For owner/assignee callers only `status` is applied and the
/// rest is silently ignored.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    pub created_by: Option<Uuid>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Free-form status string, `Pending` by default.
    pub status: String,
    /// The priority of the task.
    pub priority: TaskPriority,
    /// Email of the assignee, if any. Not a reference into the user store.
    pub assigned_to: Option<String>,
    /// Identifier of the user who created the task.
    pub created_by: Option<Uuid>,
    /// Timestamp of when the task was created. Immutable.
    pub created_at: DateTime<Utc>,
    /// Optional deadline for the task.
    pub deadline: Option<DateTime<Utc>>,
}

/// A task row with the creator's name and email joined in for display,
/// used by the mine-listing and the admin listing.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskWithCreator {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: TaskPriority,
    pub assigned_to: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    /// Name of the creating user, if the ownership reference still resolves.
    pub creator_name: Option<String>,
    /// Email of the creating user, if the ownership reference still resolves.
    pub creator_email: Option<String>,
}

/// One entry of the stats report.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Folds grouped `(upper-cased trimmed status, count)` rows into the four
/// fixed reporting buckets, zero-filling buckets with no matching tasks.
/// Rows outside the buckets are dropped.
pub fn fold_status_counts(rows: &[(String, i64)]) -> Vec<StatusCount> {
    STATS_BUCKETS
        .iter()
        .map(|bucket| StatusCount {
            status: bucket.to_string(),
            count: rows
                .iter()
                .find(|(status, _)| status == bucket)
                .map(|(_, count)| *count)
                .unwrap_or(0),
        })
        .collect()
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the creator's id.
    /// Applies the status normalization and the `Pending`/`Low` defaults;
    /// `created_by` always comes from the authenticated caller, never the body.
    pub fn new(input: TaskInput, created_by: Uuid) -> Self {
        let status = match input.status.as_deref() {
            Some(raw) => normalize_status(raw),
            None => DEFAULT_STATUS.to_string(),
        };
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status,
            priority: input.priority.unwrap_or(TaskPriority::Low),
            assigned_to: input.email,
            created_by: Some(created_by),
            created_at: Utc::now(),
            deadline: input.deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(title: &str, status: Option<&str>) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: None,
            status: status.map(str::to_string),
            priority: None,
            email: None,
            deadline: None,
        }
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("in progress"), "In Progress");
        assert_eq!(normalize_status("PENDING"), "Pending");
        assert_eq!(normalize_status("completed"), "Completed");
        assert_eq!(normalize_status("Working"), "Working");
        assert_eq!(normalize_status(""), "");
    }

    #[test]
    fn test_task_defaults() {
        let creator = Uuid::new_v4();
        let task = Task::new(input("Write report", None), creator);
        assert_eq!(task.status, "Pending");
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.created_by, Some(creator));
        assert!(task.assigned_to.is_none());
    }

    #[test]
    fn test_task_new_normalizes_status() {
        let task = Task::new(input("Write report", Some("in progress")), Uuid::new_v4());
        assert_eq!(task.status, "In Progress");
    }

    #[test]
    fn test_is_completed() {
        assert!(is_completed("Completed"));
        assert!(is_completed("completed"));
        assert!(is_completed("COMPLETE"));
        assert!(is_completed("complete"));
        assert!(!is_completed("Working"));
        assert!(!is_completed("Pending"));
        assert!(!is_completed("In Progress"));
    }

    #[test]
    fn test_fold_status_counts_zero_fills_and_discards() {
        let rows = vec![
            ("PENDING".to_string(), 3),
            ("COMPLETED".to_string(), 1),
            ("BLOCKED".to_string(), 7), // not a reporting bucket
        ];
        let stats = fold_status_counts(&rows);
        assert_eq!(
            stats,
            vec![
                StatusCount { status: "PENDING".into(), count: 3 },
                StatusCount { status: "WORKING".into(), count: 0 },
                StatusCount { status: "IN PROGRESS".into(), count: 0 },
                StatusCount { status: "COMPLETED".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_task_input_validation() {
        use validator::Validate;

        assert!(input("Valid title", None).validate().is_ok());
        assert!(
            input("", None).validate().is_err(),
            "Validation should fail for empty title."
        );

        let long_title = "a".repeat(201);
        assert!(
            input(&long_title, None).validate().is_err(),
            "Validation should fail for overly long title."
        );

        let long_description = TaskInput {
            description: Some("b".repeat(1001)),
            ..input("Valid title", None)
        };
        assert!(
            long_description.validate().is_err(),
            "Validation should fail for overly long description."
        );
    }
}
