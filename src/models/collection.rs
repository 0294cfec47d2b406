use crate::models::task::{Task, TaskId};

/// Ordered task list. Position is display order when no sort is active.
#[derive(Debug, Default, Clone)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn position_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn push(&mut self, task: Task) -> &Task {
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    /// Replaces text and deadline, keeping completion and identity
    pub fn replace(
        &mut self,
        index: usize,
        text: String,
        deadline: Option<String>,
    ) -> Option<&Task> {
        let task = self.tasks.get_mut(index)?;
        task.text = text;
        task.deadline = deadline;
        Some(task)
    }

    pub fn remove(&mut self, index: usize) -> Option<Task> {
        if index < self.tasks.len() {
            Some(self.tasks.remove(index))
        } else {
            None
        }
    }

    pub fn toggle(&mut self, index: usize) -> Option<&Task> {
        let task = self.tasks.get_mut(index)?;
        task.completed = !task.completed;
        Some(task)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(texts: &[&str]) -> TaskCollection {
        TaskCollection::from_tasks(
            texts
                .iter()
                .map(|text| Task::new(text.to_string(), None))
                .collect(),
        )
    }

    #[test]
    fn test_replace_keeps_completion_and_id() {
        let mut tasks = collection(&["a", "b"]);
        tasks.toggle(1);
        let id = tasks.get(1).unwrap().id;

        tasks.replace(1, String::from("c"), Some(String::from("2024-01-01")));

        let task = tasks.get(1).unwrap();
        assert_eq!(task.text, "c");
        assert_eq!(task.deadline.as_deref(), Some("2024-01-01"));
        assert!(task.completed);
        assert_eq!(task.id, id);
    }

    #[test]
    fn test_remove_shifts_later_positions() {
        let mut tasks = collection(&["a", "b", "c"]);
        let c = tasks.get(2).unwrap().id;

        let removed = tasks.remove(0).unwrap();

        assert_eq!(removed.text, "a");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.position_of(c), Some(1));
    }

    #[test]
    fn test_out_of_range_operations_return_none() {
        let mut tasks = collection(&["a"]);
        assert!(tasks.remove(1).is_none());
        assert!(tasks.toggle(5).is_none());
        assert!(tasks.replace(1, String::from("x"), None).is_none());
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_completed_count() {
        let mut tasks = collection(&["a", "b", "c"]);
        tasks.toggle(0);
        tasks.toggle(2);
        assert_eq!(tasks.completed_count(), 2);
    }
}
