use thiserror::Error;

use crate::{
    models::{collection::TaskCollection, task::Task},
    storage::{Storage, StorageError, save_tasks},
};

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Applies `change` to a copy of the collection and keeps the copy only once
/// it has been saved, so a failed write leaves memory as it was.
fn apply_and_save<T, E>(
    collection: &mut TaskCollection,
    storage: &impl Storage,
    change: impl FnOnce(&mut TaskCollection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StorageError>,
{
    let mut candidate = collection.clone();
    let result = change(&mut candidate)?;
    save_tasks(storage, candidate.tasks())?;
    *collection = candidate;
    Ok(result)
}

pub struct AddTaskParameters {
    pub text: String,
    pub deadline: Option<String>,
}

/// Appends a new task. Blank text is ignored and returns `Ok(None)`.
pub fn add_task(
    collection: &mut TaskCollection,
    storage: &impl Storage,
    parameters: AddTaskParameters,
) -> Result<Option<Task>, AddTaskError> {
    let text = parameters.text.trim();
    if text.is_empty() {
        tracing::debug!("Ignoring task with blank text");
        return Ok(None);
    }

    let task = apply_and_save(collection, storage, |candidate| {
        Ok::<_, AddTaskError>(
            candidate
                .push(Task::new(text.to_string(), parameters.deadline))
                .clone(),
        )
    })?;
    tracing::info!(index = collection.len() - 1, "Added task");

    Ok(Some(task))
}

#[derive(Debug, Error)]
pub enum EditTaskError {
    #[error("Task #{} not found", .0 + 1)]
    TaskNotFound(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct EditTaskParameters {
    pub index: usize,
    pub text: String,
    pub deadline: Option<String>,
}

/// Rewrites text and deadline in place. Blank text is ignored and returns `Ok(None)`.
pub fn edit_task(
    collection: &mut TaskCollection,
    storage: &impl Storage,
    parameters: EditTaskParameters,
) -> Result<Option<Task>, EditTaskError> {
    if collection.get(parameters.index).is_none() {
        return Err(EditTaskError::TaskNotFound(parameters.index));
    }

    let text = parameters.text.trim();
    if text.is_empty() {
        tracing::debug!(index = parameters.index, "Ignoring edit with blank text");
        return Ok(None);
    }

    let index = parameters.index;
    let task = apply_and_save(collection, storage, |candidate| {
        candidate
            .replace(index, text.to_string(), parameters.deadline)
            .cloned()
            .ok_or(EditTaskError::TaskNotFound(index))
    })?;
    tracing::info!(index = parameters.index, "Edited task");

    Ok(Some(task))
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error("Task #{} not found", .0 + 1)]
    TaskNotFound(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteTaskParameters {
    pub index: usize,
}

pub fn delete_task(
    collection: &mut TaskCollection,
    storage: &impl Storage,
    parameters: DeleteTaskParameters,
) -> Result<Task, DeleteTaskError> {
    let task = apply_and_save(collection, storage, |candidate| {
        candidate
            .remove(parameters.index)
            .ok_or(DeleteTaskError::TaskNotFound(parameters.index))
    })?;
    tracing::info!(index = parameters.index, "Deleted task");

    Ok(task)
}

#[derive(Debug, Error)]
pub enum ToggleTaskError {
    #[error("Task #{} not found", .0 + 1)]
    TaskNotFound(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ToggleTaskParameters {
    pub index: usize,
}

pub fn toggle_task(
    collection: &mut TaskCollection,
    storage: &impl Storage,
    parameters: ToggleTaskParameters,
) -> Result<Task, ToggleTaskError> {
    let task = apply_and_save(collection, storage, |candidate| {
        candidate
            .toggle(parameters.index)
            .cloned()
            .ok_or(ToggleTaskError::TaskNotFound(parameters.index))
    })?;
    tracing::info!(
        index = parameters.index,
        completed = task.completed,
        "Toggled task"
    );

    Ok(task)
}
