use jiff::{Timestamp, Zoned};
use thiserror::Error;

use crate::{
    models::{
        collection::TaskCollection,
        selection::{Filter, Sort, ViewSelection},
        session::{EditSession, Notification, NotificationKind},
        task::Task,
    },
    services::{
        tasks::{
            AddTaskError, AddTaskParameters, DeleteTaskError, DeleteTaskParameters, EditTaskError,
            EditTaskParameters, ToggleTaskError, ToggleTaskParameters, add_task, delete_task,
            edit_task, toggle_task,
        },
        view::{TaskView, build_view},
    },
    storage::{Storage, load_tasks},
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Task #{} not found", .0 + 1)]
    TaskNotFound(usize),

    #[error("Task numbers start at 1")]
    InvalidTaskNumber,

    #[error(transparent)]
    Add(#[from] AddTaskError),

    #[error(transparent)]
    Edit(#[from] EditTaskError),

    #[error(transparent)]
    Delete(#[from] DeleteTaskError),

    #[error(transparent)]
    Toggle(#[from] ToggleTaskError),
}

/// What a commit of the input form did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Added,
    Edited,
    /// Blank text; nothing changed
    Ignored,
    /// The task being edited no longer exists; the buffers are kept
    Discarded,
}

/// Everything the interface shows, owned in one place
#[derive(Debug, Default)]
pub struct AppState {
    pub tasks: TaskCollection,
    pub selection: ViewSelection,
    pub session: EditSession,
    pub notification: Option<Notification>,
}

pub struct Controller<S: Storage> {
    storage: S,
    state: AppState,
}

impl<S: Storage> Controller<S> {
    /// Reads the stored collection once; anything unusable starts empty
    pub fn load(storage: S) -> Self {
        let tasks = load_tasks(&storage).unwrap_or_default();
        Self {
            storage,
            state: AppState {
                tasks: TaskCollection::from_tasks(tasks),
                ..AppState::default()
            },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn view(&self, now: &Zoned) -> TaskView<'_> {
        build_view(&self.state.tasks, self.state.selection, now)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.session.text = text.into();
    }

    pub fn set_deadline(&mut self, deadline: Option<String>) {
        self.state.session.deadline = deadline.filter(|d| !d.trim().is_empty());
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.state.selection.filter = filter;
    }

    pub fn set_sort(&mut self, sort: Sort) {
        self.state.selection.sort = sort;
    }

    /// Stages the task at `index` into the form and switches to editing it
    pub fn begin_edit(&mut self, index: usize) -> Result<(), ControllerError> {
        let task = self
            .state
            .tasks
            .get(index)
            .ok_or(ControllerError::TaskNotFound(index))?;
        self.state
            .session
            .start(task.id, task.text.clone(), task.deadline.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.state.session.clear();
    }

    /// Submits the form: edits the staged task if there is one, adds otherwise
    pub fn commit(&mut self, now: Timestamp) -> Result<CommitOutcome, ControllerError> {
        if self.state.session.text.trim().is_empty() {
            return Ok(CommitOutcome::Ignored);
        }

        let text = self.state.session.text.clone();
        let deadline = self.state.session.deadline.clone();

        let outcome = match self.state.session.target() {
            Some(id) => {
                let Some(index) = self.state.tasks.position_of(id) else {
                    tracing::warn!("Task being edited was deleted; dropping edit");
                    self.state.session.detach();
                    return Ok(CommitOutcome::Discarded);
                };
                edit_task(
                    &mut self.state.tasks,
                    &self.storage,
                    EditTaskParameters {
                        index,
                        text,
                        deadline,
                    },
                )?;
                CommitOutcome::Edited
            }
            None => {
                add_task(
                    &mut self.state.tasks,
                    &self.storage,
                    AddTaskParameters { text, deadline },
                )?;
                CommitOutcome::Added
            }
        };

        self.state.session.clear();
        let kind = match outcome {
            CommitOutcome::Edited => NotificationKind::TaskEdited,
            _ => NotificationKind::TaskAdded,
        };
        self.notify(kind, now);

        Ok(outcome)
    }

    pub fn remove(&mut self, index: usize, now: Timestamp) -> Result<Task, ControllerError> {
        let task = delete_task(
            &mut self.state.tasks,
            &self.storage,
            DeleteTaskParameters { index },
        )?;
        self.notify(NotificationKind::TaskDeleted, now);
        Ok(task)
    }

    pub fn toggle(&mut self, index: usize) -> Result<Task, ControllerError> {
        Ok(toggle_task(
            &mut self.state.tasks,
            &self.storage,
            ToggleTaskParameters { index },
        )?)
    }

    /// The current notification, if it has not timed out by `now`
    pub fn notification(&self, now: Timestamp) -> Option<&Notification> {
        self.state
            .notification
            .as_ref()
            .filter(|n| n.is_visible_at(now))
    }

    pub fn dismiss_notification(&mut self) {
        self.state.notification = None;
    }

    fn notify(&mut self, kind: NotificationKind, now: Timestamp) {
        self.state.notification = Some(Notification::new(kind, now));
    }
}
