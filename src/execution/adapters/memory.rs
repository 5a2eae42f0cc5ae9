//! Bounded in-memory execution registry.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::execution::{
    domain::{Execution, ExecutionId},
    ports::{ExecutionRegistry, ExecutionRegistryError, ExecutionRegistryResult},
};
use crate::tracker::domain::IssueId;

/// Default maximum number of executions held at once.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-memory execution registry with a capacity bound.
///
/// When full, storing a new execution evicts the oldest terminal one. If
/// every held execution is still live the store fails with
/// [`ExecutionRegistryError::CapacityExhausted`] rather than dropping an
/// in-flight record. Updates against a record that has already reached a
/// terminal state are rejected, so a stale running snapshot can never
/// resurrect a cancelled or finished execution.
#[derive(Debug, Clone)]
pub struct InMemoryExecutionRegistry {
    state: Arc<RwLock<InMemoryExecutionState>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct InMemoryExecutionState {
    executions: HashMap<ExecutionId, Execution>,
    insertion_order: VecDeque<ExecutionId>,
    issue_index: HashMap<IssueId, Vec<ExecutionId>>,
}

impl Default for InMemoryExecutionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(err: impl std::fmt::Display) -> ExecutionRegistryError {
    ExecutionRegistryError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryExecutionRegistry {
    /// Creates a registry with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a registry bounded to `capacity` executions.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryExecutionState::default())),
            capacity: capacity.max(1),
        }
    }

    /// Evicts the oldest terminal execution, if any.
    fn evict_oldest_terminal(state: &mut InMemoryExecutionState) -> bool {
        let victim = state
            .insertion_order
            .iter()
            .copied()
            .find(|id| {
                state
                    .executions
                    .get(id)
                    .is_some_and(|execution| execution.status().is_terminal())
            });
        let Some(victim_id) = victim else {
            return false;
        };

        state.insertion_order.retain(|id| *id != victim_id);
        if let Some(execution) = state.executions.remove(&victim_id) {
            if let Some(ids) = state.issue_index.get_mut(&execution.issue_id()) {
                ids.retain(|id| *id != victim_id);
                if ids.is_empty() {
                    state.issue_index.remove(&execution.issue_id());
                }
            }
        }
        true
    }
}

#[async_trait]
impl ExecutionRegistry for InMemoryExecutionRegistry {
    async fn store(&self, execution: &Execution) -> ExecutionRegistryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.executions.contains_key(&execution.id()) {
            return Err(ExecutionRegistryError::DuplicateExecution(execution.id()));
        }
        if state.executions.len() >= self.capacity && !Self::evict_oldest_terminal(&mut state) {
            return Err(ExecutionRegistryError::CapacityExhausted(self.capacity));
        }

        state.insertion_order.push_back(execution.id());
        state
            .issue_index
            .entry(execution.issue_id())
            .or_default()
            .push(execution.id());
        state.executions.insert(execution.id(), execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> ExecutionRegistryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let Some(stored) = state.executions.get(&execution.id()) else {
            return Err(ExecutionRegistryError::NotFound(execution.id()));
        };
        if stored.status().is_terminal() {
            return Err(ExecutionRegistryError::AlreadyTerminal(execution.id()));
        }
        state.executions.insert(execution.id(), execution.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ExecutionId) -> ExecutionRegistryResult<Option<Execution>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.executions.get(&id).cloned())
    }

    async fn find_by_issue(&self, issue_id: IssueId) -> ExecutionRegistryResult<Vec<Execution>> {
        let state = self.state.read().map_err(poisoned)?;
        let executions = state
            .issue_index
            .get(&issue_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.executions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(executions)
    }
}
