use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session-scoped handle for a task. Never persisted; reassigned on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Task {
    /// Handle used to follow the task while it is being edited
    #[serde(skip)]
    pub id: TaskId,
    /// Text of the task, never empty after trimming
    pub text: String,
    /// Whether the task has been checked off
    #[serde(default)]
    pub completed: bool,
    /// Free-form deadline as typed by the user
    #[serde(default, with = "deadline_field")]
    pub deadline: Option<String>,
}

impl Task {
    pub fn new(text: String, deadline: Option<String>) -> Self {
        Self {
            id: TaskId::new(),
            text,
            completed: false,
            deadline,
        }
    }
}

/// Absent deadlines are stored as an empty string.
mod deadline_field {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(deadline: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(deadline.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|value| !value.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_deadline_is_written_as_empty_string() {
        let task = Task::new(String::from("Buy milk"), None);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Buy milk", "completed": false, "deadline": ""})
        );
    }

    #[test]
    fn test_deadline_variants_load() {
        let json = r#"[
            {"text": "a", "completed": true, "deadline": "2024-01-01T12:00"},
            {"text": "b", "completed": false, "deadline": ""},
            {"text": "c", "completed": false, "deadline": null},
            {"text": "d"}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();

        assert_eq!(tasks[0].deadline.as_deref(), Some("2024-01-01T12:00"));
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].deadline, None);
        assert_eq!(tasks[2].deadline, None);
        assert_eq!(tasks[3].deadline, None);
        assert!(!tasks[3].completed);
    }

    #[test]
    fn test_loaded_tasks_get_distinct_ids() {
        let json = r#"[{"text": "a", "completed": false, "deadline": ""},
                       {"text": "a", "completed": false, "deadline": ""}]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_ne!(tasks[0].id, tasks[1].id);
    }
}
