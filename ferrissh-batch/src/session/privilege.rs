//! Privilege level management with graph-based navigation.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::Regex;

use crate::error::DriverError;
use crate::platform::PrivilegeLevel;

/// Tracks the session's privilege level and finds paths between levels.
///
/// Levels form a bidirectional graph where each level connects to its
/// parent (previous_priv).
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    graph: HashMap<String, HashSet<String>>,
    current: Option<String>,
}

impl PrivilegeManager {
    /// Create a new privilege manager from privilege level definitions.
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let graph = Self::build_graph(&levels);
        Self {
            levels,
            graph,
            current: None,
        }
    }

    fn build_graph(levels: &IndexMap<String, PrivilegeLevel>) -> HashMap<String, HashSet<String>> {
        let mut graph: HashMap<String, HashSet<String>> = HashMap::new();

        for (name, level) in levels {
            graph.entry(name.clone()).or_default();

            if let Some(ref parent) = level.previous_priv {
                graph.entry(name.clone()).or_default().insert(parent.clone());
                graph.entry(parent.clone()).or_default().insert(name.clone());
            }
        }

        graph
    }

    /// Determine the privilege level a prompt belongs to.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel, DriverError> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| DriverError::UnknownPrivilege {
                prompt: prompt.to_string(),
            })
    }

    /// Update the current level from a prompt. Unknown prompts leave the
    /// current level unchanged.
    pub fn observe_prompt(&mut self, prompt: &str) -> Option<&str> {
        if let Ok(level) = self.determine_from_prompt(prompt) {
            self.current = Some(level.name.clone());
        }
        self.current.as_deref()
    }

    /// Current privilege level name.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether the session is currently at `name`.
    pub fn is_at(&self, name: &str) -> bool {
        self.current.as_deref() == Some(name)
    }

    /// Find the shortest path from one privilege level to another.
    ///
    /// Returns the level names to traverse, including both ends.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>, DriverError> {
        if from == to {
            return Ok(vec![from.to_string()]);
        }

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<String, String> = HashMap::new();

        queue.push_back(from.to_string());
        visited.insert(from.to_string());

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to.to_string()];
                let mut node = to.to_string();
                while let Some(prev) = parent.get(&node) {
                    path.push(prev.clone());
                    node = prev.clone();
                }
                path.reverse();
                return Ok(path);
            }

            if let Some(neighbors) = self.graph.get(&current) {
                for neighbor in neighbors {
                    if visited.insert(neighbor.clone()) {
                        parent.insert(neighbor.clone(), current.clone());
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }

        Err(DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Get the transition from one level to an adjacent level.
    pub fn get_transition(&self, from: &str, to: &str) -> Option<TransitionInfo> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        if to_level.previous_priv.as_deref() == Some(from) {
            return Some(TransitionInfo {
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.auth_prompt.clone(),
                confirm: None,
            });
        }

        if from_level.previous_priv.as_deref() == Some(to) {
            return Some(TransitionInfo {
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
                confirm: from_level.deescalate_confirm.clone(),
            });
        }

        None
    }
}

/// Information about a privilege level transition.
#[derive(Debug, Clone)]
pub struct TransitionInfo {
    /// Command to execute for the transition.
    pub command: String,

    /// Password prompt the transition may show.
    pub auth_prompt: Option<Regex>,

    /// Question the transition may ask, and its answer.
    pub confirm: Option<(Regex, String)>,
}
