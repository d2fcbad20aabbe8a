// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, trace};

use crate::dag::task::{Task, TaskId};
use crate::errors::{DagError, Result};
use crate::report::SharedReporter;

/// DFS colouring used by cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// In-memory dependency graph keyed by task id.
///
/// Insertion never validates: a graph may reference unknown tasks or contain
/// cycles until [`TaskGraph::validate`] is called. Once validated the graph
/// is treated as immutable and only borrowed by the scheduler.
///
/// Tasks are kept in a `BTreeMap`, so every traversal visits ids in sorted
/// order and error messages are stable between runs.
#[derive(Clone)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskId, Task>,
    reporter: SharedReporter,
}

impl fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl TaskGraph {
    pub fn new(reporter: SharedReporter) -> Self {
        Self {
            tasks: BTreeMap::new(),
            reporter,
        }
    }

    /// Build a graph by inserting every task in order (last write wins).
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>, reporter: SharedReporter) -> Self {
        let mut graph = Self::new(reporter);
        for task in tasks {
            graph.add_task(task);
        }
        graph
    }

    /// Insert a task, replacing any existing task with the same id.
    pub fn add_task(&mut self, task: Task) {
        if let Some(previous) = self.tasks.insert(task.id.clone(), task) {
            debug!(task = %previous.id, "task id already present; overwriting");
        }
    }

    pub fn get_task(&self, id: &str) -> Result<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| DagError::TaskNotFound(id.to_string()))
    }

    pub fn get_all_tasks(&self) -> &BTreeMap<TaskId, Task> {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Immediate dependencies of a task; empty for unknown ids.
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.tasks
            .get(id)
            .map(|t| t.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks that list `id` among their dependencies, in id order.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.tasks
            .values()
            .filter(|t| t.dependencies.iter().any(|d| d == id))
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Reverse adjacency for every task, one entry per declared edge.
    ///
    /// Dependencies that name unknown tasks still get an entry, so callers
    /// that count edges stay consistent with `dependencies_of`.
    pub fn dependents_index(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in self.tasks.values() {
            for dep in &task.dependencies {
                index.entry(dep.as_str()).or_default().push(task.id.as_str());
            }
        }
        index
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Check structural integrity:
    ///
    /// 1. every dependency names an existing task;
    /// 2. the dependency relation has no cycle.
    ///
    /// Reports a confirmation line on success only.
    pub fn validate(&self) -> Result<()> {
        self.check_dependencies_exist()?;
        self.check_acyclic()?;

        debug!(tasks = self.tasks.len(), "dependency graph validated");
        self.reporter
            .info("Dependency graph validated. No missing dependencies or cycles found.");
        Ok(())
    }

    fn check_dependencies_exist(&self) -> Result<()> {
        for task in self.tasks.values() {
            if let Some(missing) = task
                .dependencies
                .iter()
                .find(|dep| !self.tasks.contains_key(dep.as_str()))
            {
                return Err(DagError::UnknownDependency {
                    task: task.id.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        Ok(())
    }

    /// Iterative three-colour DFS, restarted from every unvisited id.
    ///
    /// Each stack frame holds a node and the index of the next dependency to
    /// explore. Reaching a node that is still `OnPath` closes a cycle; that
    /// node is the one named in the error. Every node is finished at most
    /// once, so the whole pass is O(V + E).
    fn check_acyclic(&self) -> Result<()> {
        let mut marks: HashMap<&str, Mark> = self
            .tasks
            .keys()
            .map(|id| (id.as_str(), Mark::Unvisited))
            .collect();

        for root in self.tasks.keys() {
            if marks.get(root.as_str()) != Some(&Mark::Unvisited) {
                continue;
            }

            marks.insert(root.as_str(), Mark::OnPath);
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];

            while let Some(&(node, next)) = stack.last() {
                match self.dependencies_of(node).get(next) {
                    Some(dep) => {
                        if let Some(top) = stack.last_mut() {
                            top.1 += 1;
                        }
                        match marks.get(dep.as_str()).copied() {
                            Some(Mark::OnPath) => {
                                trace!(from = node, to = %dep, "back edge found");
                                return Err(DagError::CycleDetected(dep.clone()));
                            }
                            Some(Mark::Unvisited) => {
                                marks.insert(dep.as_str(), Mark::OnPath);
                                stack.push((dep.as_str(), 0));
                            }
                            Some(Mark::Done) | None => {}
                        }
                    }
                    None => {
                        marks.insert(node, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }

        Ok(())
    }
}
