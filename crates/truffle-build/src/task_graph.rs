//! Task ordering using topological sort
use crate::error::{BuildError, BuildResult};
use crate::targets::Task;
use std::collections::{HashMap, HashSet, VecDeque};

/// Tasks and their `depends_on` edges
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Tasks by name
    tasks: HashMap<String, Task>,
    /// Registration order, used to break ties
    order: Vec<String>,
}

impl TaskGraph {
    /// Create a new empty task graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task
    pub fn add_task(&mut self, task: Task) -> BuildResult<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(BuildError::DuplicateTask { task: task.name });
        }
        self.order.push(task.name.clone());
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    /// Task names in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Get task count
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check every dependency names a registered task
    pub fn validate(&self) -> BuildResult<()> {
        for task in self.tasks() {
            for dep in &task.depends_on {
                if !self.tasks.contains_key(dep) {
                    return Err(BuildError::task_not_found(format!(
                        "{} (required by {})",
                        dep, task.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Order every task so that dependencies come first (Kahn's algorithm)
    pub fn execution_order(&self) -> BuildResult<Vec<String>> {
        self.validate()?;
        self.sort(&self.order)
    }

    /// The tasks needed to run `target`, dependencies first, `target` last
    pub fn execution_plan(&self, target: &str) -> BuildResult<Vec<String>> {
        if !self.tasks.contains_key(target) {
            return Err(BuildError::task_not_found(target));
        }

        let mut needed = HashSet::new();
        let mut stack = vec![target.to_string()];
        while let Some(name) = stack.pop() {
            if !needed.insert(name.clone()) {
                continue;
            }
            let task = self.tasks.get(&name).ok_or_else(|| {
                BuildError::task_not_found(format!("{} (required by {})", name, target))
            })?;
            stack.extend(task.depends_on.iter().cloned());
        }

        let subset: Vec<String> = self
            .order
            .iter()
            .filter(|name| needed.contains(*name))
            .cloned()
            .collect();
        self.sort(&subset)
    }

    fn sort(&self, names: &[String]) -> BuildResult<Vec<String>> {
        let included: HashSet<&str> = names.iter().map(String::as_str).collect();

        // In-degree = number of dependencies inside the subset
        let mut in_degree: HashMap<&str, usize> = names
            .iter()
            .map(|name| {
                let degree = self.tasks[name]
                    .depends_on
                    .iter()
                    .filter(|d| included.contains(d.as_str()))
                    .count();
                (name.as_str(), degree)
            })
            .collect();

        let mut queue: VecDeque<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| in_degree[name] == 0)
            .collect();
        let mut result = Vec::new();

        while let Some(name) = queue.pop_front() {
            result.push(name.to_string());

            // For each task that depends on the current task
            for dependent in names {
                let task = &self.tasks[dependent];
                if task.depends_on.iter().any(|d| d == name) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent.as_str());
                        }
                    }
                }
            }
        }

        if result.len() != names.len() {
            return Err(BuildError::TaskCycle(self.find_cycle()));
        }

        Ok(result)
    }

    /// Find a cycle in the graph (for error reporting)
    fn find_cycle(&self) -> String {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for name in &self.order {
            if let Some(cycle) =
                self.dfs_find_cycle(name, &mut visited, &mut rec_stack, &mut path)
            {
                return cycle;
            }
        }

        "unknown cycle".to_string()
    }

    fn dfs_find_cycle(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Option<String> {
        if rec_stack.contains(name) {
            path.push(name.to_string());
            let start = path.iter().position(|t| t == name).unwrap_or(0);
            return Some(path[start..].join(" -> "));
        }

        if visited.contains(name) {
            return None;
        }

        visited.insert(name.to_string());
        rec_stack.insert(name.to_string());
        path.push(name.to_string());

        if let Some(task) = self.tasks.get(name) {
            for dep in &task.depends_on {
                if let Some(cycle) = self.dfs_find_cycle(dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        rec_stack.remove(name);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::TaskKind;

    fn task(name: &str, deps: &[&str]) -> Task {
        let mut task = Task::new(name, TaskKind::PrepareCompiler);
        for dep in deps {
            task.depend_on(*dep);
        }
        task
    }

    #[test]
    fn test_empty_graph() {
        let graph = TaskGraph::new();
        assert!(graph.execution_order().unwrap().is_empty());
    }

    #[test]
    fn test_linear_order() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("installDist", &["startScripts"])).unwrap();
        graph.add_task(task("startScripts", &["prepareCompiler"])).unwrap();
        graph.add_task(task("prepareCompiler", &[])).unwrap();

        assert_eq!(
            graph.execution_order().unwrap(),
            vec!["prepareCompiler", "startScripts", "installDist"]
        );
    }

    #[test]
    fn test_plan_only_includes_needed_tasks() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("prepareCompiler", &[])).unwrap();
        graph.add_task(task("run", &["prepareCompiler"])).unwrap();
        graph.add_task(task("graalComponent", &[])).unwrap();

        assert_eq!(
            graph.execution_plan("run").unwrap(),
            vec!["prepareCompiler", "run"]
        );
    }

    #[test]
    fn test_duplicate_task() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("a", &[])).unwrap();
        assert!(matches!(
            graph.add_task(task("a", &[])),
            Err(BuildError::DuplicateTask { .. })
        ));
    }

    #[test]
    fn test_missing_dependency() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("a", &["ghost"])).unwrap();
        assert!(matches!(
            graph.execution_order(),
            Err(BuildError::TaskNotFound { .. })
        ));
        assert!(matches!(
            graph.execution_plan("a"),
            Err(BuildError::TaskNotFound { .. })
        ));
        assert!(matches!(
            graph.execution_plan("nope"),
            Err(BuildError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = TaskGraph::new();
        graph.add_task(task("a", &["b"])).unwrap();
        graph.add_task(task("b", &["c"])).unwrap();
        graph.add_task(task("c", &["a"])).unwrap();

        match graph.execution_order() {
            Err(BuildError::TaskCycle(cycle)) => assert_eq!(cycle, "a -> b -> c -> a"),
            other => panic!("Expected TaskCycle, got {:?}", other),
        }
    }
}
