// src/task/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{JobRunnerError, Result};
use crate::task::{Task, TaskBuilder};

/// The complete set of tasks for one run, keyed by id.
///
/// A registry only exists once its builder has succeeded; it is never
/// exposed half-populated.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<dyn Task>>,
}

impl TaskRegistry {
    /// Build a registry from a [`TaskBuilder`].
    pub fn build(builder: &dyn TaskBuilder) -> Result<Self> {
        let tasks = builder.build()?;
        Self::from_tasks(tasks)
    }

    /// Build a registry from an explicit list of tasks, rejecting duplicate ids.
    pub fn from_tasks(tasks: Vec<Arc<dyn Task>>) -> Result<Self> {
        let mut map: HashMap<String, Arc<dyn Task>> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let id = task.id().to_string();
            if map.contains_key(&id) {
                return Err(JobRunnerError::DuplicateTask(id));
            }
            debug!(task = %id, deps = ?task.dependencies(), "registered task");
            map.insert(id, task);
        }

        Ok(Self { tasks: map })
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate all tasks. Order carries no meaning.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Task>> {
        self.tasks.values()
    }

    /// All task ids, sorted. Handy for stable display.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tasks.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::kinds::FileTask;
    use crate::task::ManualTaskBuilder;

    #[test]
    fn lookups_answer_membership() {
        let builder = ManualTaskBuilder::new()
            .with_task(FileTask::dummy("A", &[]))
            .with_task(FileTask::dummy("B", &["A"]));
        let registry = TaskRegistry::build(&builder).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.has_id("A"));
        assert!(!registry.has_id("C"));
        assert_eq!(registry.get("B").map(|t| t.dependencies().to_vec()), Some(vec!["A".to_string()]));
        assert_eq!(registry.sorted_ids(), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_ids_fail_the_build() {
        let builder = ManualTaskBuilder::new()
            .with_task(FileTask::dummy("A", &[]))
            .with_task(FileTask::dummy("A", &[]));

        match TaskRegistry::build(&builder) {
            Err(JobRunnerError::DuplicateTask(id)) => assert_eq!(id, "A"),
            other => panic!("expected DuplicateTask, got {other:?}"),
        }
    }
}
