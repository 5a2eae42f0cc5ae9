//! Thread-safe in-memory issue repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::tracker::{
    domain::{Issue, IssueCode, IssueId, ProjectId},
    ports::{IssueRepository, IssueRepositoryError, IssueRepositoryResult},
};

/// In-memory issue repository backed by hash maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueRepository {
    state: Arc<RwLock<InMemoryIssueState>>,
}

#[derive(Debug, Default)]
struct InMemoryIssueState {
    issues: HashMap<IssueId, Issue>,
    code_index: HashMap<IssueCode, IssueId>,
    project_counters: HashMap<ProjectId, u64>,
}

impl InMemoryIssueRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> IssueRepositoryError {
    IssueRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn store(&self, issue: &Issue) -> IssueRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.issues.contains_key(&issue.id()) {
            return Err(IssueRepositoryError::DuplicateIssue(issue.id()));
        }
        if state.code_index.contains_key(issue.code()) {
            return Err(IssueRepositoryError::DuplicateCode(issue.code().clone()));
        }

        state.code_index.insert(issue.code().clone(), issue.id());
        *state.project_counters.entry(issue.project_id()).or_insert(0) += 1;
        state.issues.insert(issue.id(), issue.clone());
        Ok(())
    }

    async fn update(&self, issue: &Issue) -> IssueRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.issues.contains_key(&issue.id()) {
            return Err(IssueRepositoryError::NotFound(issue.id()));
        }
        state.issues.insert(issue.id(), issue.clone());
        Ok(())
    }

    async fn delete(&self, id: IssueId) -> IssueRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let Some(issue) = state.issues.remove(&id) else {
            return Err(IssueRepositoryError::NotFound(id));
        };
        state.code_index.remove(issue.code());
        // The project counter is monotone; removals never free a code.
        Ok(())
    }

    async fn find_by_id(&self, id: IssueId) -> IssueRepositoryResult<Option<Issue>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.issues.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &IssueCode) -> IssueRepositoryResult<Option<Issue>> {
        let state = self.state.read().map_err(poisoned)?;
        let issue = state
            .code_index
            .get(code)
            .and_then(|issue_id| state.issues.get(issue_id))
            .cloned();
        Ok(issue)
    }

    async fn list_by_project(&self, project_id: ProjectId) -> IssueRepositoryResult<Vec<Issue>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut issues: Vec<Issue> = state
            .issues
            .values()
            .filter(|issue| issue.project_id() == project_id)
            .cloned()
            .collect();
        issues.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(issues)
    }

    async fn count_by_project(&self, project_id: ProjectId) -> IssueRepositoryResult<u64> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.project_counters.get(&project_id).copied().unwrap_or(0))
    }
}
