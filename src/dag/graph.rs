// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{JobRunnerError, Result};
use crate::task::TaskRegistry;
use crate::types::TaskId;

/// Immediate deps and dependents of one task.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Tasks that must be terminal before this one can start.
    deps: Vec<TaskId>,
    /// Tasks that list this one as a dependency.
    dependents: Vec<TaskId>,
}

/// Validated dependency graph for one run, keyed by task id.
///
/// Construction fails on self-dependencies, dangling references and cycles,
/// so every graph that exists is a DAG over the registry's ids.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: HashMap<TaskId, DagNode>,
    roots: Vec<TaskId>,
}

impl DependencyGraph {
    pub fn build(registry: &TaskRegistry) -> Result<Self> {
        let mut nodes: HashMap<TaskId, DagNode> = registry
            .iter()
            .map(|t| (t.id().to_string(), DagNode::default()))
            .collect();

        // Sorted so the first reported error is stable across runs.
        for id in registry.sorted_ids() {
            let Some(task) = registry.get(id) else {
                continue;
            };
            for dep in task.dependencies() {
                if dep == id {
                    return Err(JobRunnerError::SelfDependency {
                        task: id.to_string(),
                    });
                }
                if !registry.has_id(dep) {
                    return Err(JobRunnerError::MissingDependency {
                        task: id.to_string(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        for task in registry.iter() {
            let id = task.id();
            for dep in task.dependencies() {
                if let Some(node) = nodes.get_mut(id) {
                    if !node.deps.contains(dep) {
                        node.deps.push(dep.clone());
                    }
                }
                if let Some(dep_node) = nodes.get_mut(dep.as_str()) {
                    if !dep_node.dependents.iter().any(|d| d == id) {
                        dep_node.dependents.push(id.to_string());
                    }
                }
            }
        }

        ensure_acyclic(&nodes)?;

        let mut roots: Vec<TaskId> = nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        roots.sort_unstable();

        debug!(tasks = nodes.len(), roots = ?roots, "built dependency graph");
        Ok(Self { nodes, roots })
    }

    /// All task ids. Order carries no meaning.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Tasks with no dependencies, sorted by id.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks grouped into waves: every task's dependencies sit in earlier
    /// waves. Each wave is sorted by id. Used for dry-run output.
    pub fn levels(&self) -> Vec<Vec<TaskId>> {
        let mut remaining: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, n)| (id.as_str(), n.deps.len()))
            .collect();
        let mut current: Vec<TaskId> = self.roots.clone();
        let mut levels = Vec::new();

        while !current.is_empty() {
            let mut next: Vec<TaskId> = Vec::new();
            for id in &current {
                for dependent in self.dependents_of(id) {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }
            next.sort_unstable();
            levels.push(std::mem::replace(&mut current, next));
        }
        levels
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Edge direction is dep -> task; a topological sort fails on any cycle.
fn ensure_acyclic(nodes: &HashMap<TaskId, DagNode>) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for id in nodes.keys() {
        graph.add_node(id.as_str());
    }
    for (id, node) in nodes.iter() {
        for dep in node.deps.iter() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => Err(JobRunnerError::DependencyCycle(format!(
            "cycle involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{FileTask, ManualTaskBuilder};

    fn registry(specs: &[(&str, &[&str])]) -> TaskRegistry {
        let builder = specs.iter().fold(ManualTaskBuilder::new(), |b, (id, deps)| {
            b.with_task(FileTask::dummy(id, deps))
        });
        TaskRegistry::build(&builder).unwrap()
    }

    #[test]
    fn diamond_has_expected_adjacency() {
        let g = DependencyGraph::build(&registry(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("D", &["B", "C"]),
        ]))
        .unwrap();

        assert_eq!(g.len(), 4);
        assert_eq!(g.roots(), ["A".to_string()]);
        let mut a_dependents = g.dependents_of("A").to_vec();
        a_dependents.sort();
        assert_eq!(a_dependents, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(g.dependencies_of("D"), ["B".to_string(), "C".to_string()]);
        assert!(g.dependents_of("D").is_empty());
        assert!(g.dependencies_of("unknown").is_empty());
    }

    #[test]
    fn levels_group_tasks_by_depth() {
        let g = DependencyGraph::build(&registry(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("D", &["B", "C"]),
            ("E", &[]),
        ]))
        .unwrap();

        let levels = g.levels();
        assert_eq!(
            levels,
            vec![
                vec!["A".to_string(), "E".to_string()],
                vec!["B".to_string(), "C".to_string()],
                vec!["D".to_string()],
            ]
        );
    }

    #[test]
    fn self_dependency_is_rejected() {
        let err = DependencyGraph::build(&registry(&[("A", &["A"])])).unwrap_err();
        assert_eq!(err.to_string(), "A - a task cannot be dependent on itself");
    }

    #[test]
    fn missing_dependency_is_rejected() {
        let err = DependencyGraph::build(&registry(&[("A", &["Z"])])).unwrap_err();
        assert_eq!(err.to_string(), "A - there is no task with an id of: Z");
    }

    #[test]
    fn indirect_cycle_is_rejected() {
        let err = DependencyGraph::build(&registry(&[
            ("A", &["C"]),
            ("B", &["A"]),
            ("C", &["B"]),
            ("D", &[]),
        ]))
        .unwrap_err();
        assert!(matches!(err, JobRunnerError::DependencyCycle(_)));
    }

    #[test]
    fn duplicate_dependency_entries_collapse() {
        let g = DependencyGraph::build(&registry(&[("A", &[]), ("B", &["A", "A"])])).unwrap();
        assert_eq!(g.dependencies_of("B"), ["A".to_string()]);
        assert_eq!(g.dependents_of("A"), ["B".to_string()]);
    }
}
