use std::fmt;

use jiff::{SignedDuration, Timestamp};

use crate::models::task::TaskId;

/// How long a notification stays on screen after it is shown
pub const NOTIFICATION_TIMEOUT: SignedDuration = SignedDuration::from_secs(3);

/// Input form state: composing a new task, or editing an existing one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    target: Option<TaskId>,
    pub text: String,
    pub deadline: Option<String>,
}

impl EditSession {
    pub fn target(&self) -> Option<TaskId> {
        self.target
    }

    pub fn is_editing(&self) -> bool {
        self.target.is_some()
    }

    pub fn start(&mut self, target: TaskId, text: String, deadline: Option<String>) {
        self.target = Some(target);
        self.text = text;
        self.deadline = deadline;
    }

    /// Forgets the edit target but keeps whatever is staged in the buffers
    pub fn detach(&mut self) {
        self.target = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn primary_action_label(&self) -> &'static str {
        if self.is_editing() {
            "Edit Task"
        } else {
            "Add Task"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskAdded,
    TaskEdited,
    TaskDeleted,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            NotificationKind::TaskAdded => "Task added",
            NotificationKind::TaskEdited => "Task edited",
            NotificationKind::TaskDeleted => "Task deleted",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub shown_at: Timestamp,
}

impl Notification {
    pub fn new(kind: NotificationKind, shown_at: Timestamp) -> Self {
        Self { kind, shown_at }
    }

    pub fn is_visible_at(&self, now: Timestamp) -> bool {
        now.duration_since(self.shown_at) < NOTIFICATION_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_action_label_follows_session() {
        let mut session = EditSession::default();
        assert_eq!(session.primary_action_label(), "Add Task");

        session.start(TaskId::new(), String::from("a"), None);
        assert_eq!(session.primary_action_label(), "Edit Task");

        session.clear();
        assert_eq!(session.primary_action_label(), "Add Task");
        assert!(session.text.is_empty());
    }

    #[test]
    fn test_detach_keeps_buffers() {
        let mut session = EditSession::default();
        session.start(TaskId::new(), String::from("a"), Some(String::from("tomorrow")));

        session.detach();

        assert!(!session.is_editing());
        assert_eq!(session.text, "a");
        assert_eq!(session.deadline.as_deref(), Some("tomorrow"));
    }

    #[test]
    fn test_notification_expires_after_timeout() {
        let shown_at = Timestamp::from_second(1_700_000_000).unwrap();
        let notification = Notification::new(NotificationKind::TaskAdded, shown_at);

        assert!(notification.is_visible_at(shown_at));
        assert!(notification.is_visible_at(shown_at + SignedDuration::from_millis(2_999)));
        assert!(!notification.is_visible_at(shown_at + NOTIFICATION_TIMEOUT));
    }

    #[test]
    fn test_notification_messages() {
        assert_eq!(NotificationKind::TaskAdded.to_string(), "Task added");
        assert_eq!(NotificationKind::TaskEdited.to_string(), "Task edited");
        assert_eq!(NotificationKind::TaskDeleted.to_string(), "Task deleted");
    }
}
