//! Deletion modes and the pipeline phases each mode runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::facade::{CascadeAction, CascadeContext, CascadeFacade};
use crate::error::OrchestrationResult;
use crate::flow::{Flow, FlowData};

/// How a deletion treats dependents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    /// Dependents are asked first and any of them may veto
    #[default]
    Permissive,
    /// No check round; dependents are force-deleted
    Enforced,
}

impl fmt::Display for DeletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => write!(f, "permissive"),
            Self::Enforced => write!(f, "enforced"),
        }
    }
}

/// One phase of a deletion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPhase {
    /// Broadcast `DeletionCheck`
    Check,
    /// Move the resource to `PendingDelete`; rolled back on a later failure
    MarkPendingDelete,
    /// Broadcast `DeletionDelete`
    Delete,
    /// Broadcast `DeletionForceDelete`
    ForceDelete,
    /// Driver delete hook, delete extension hooks, untrack and record removal
    DeleteSelf,
}

impl DeletionPhase {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Check => "deletion-check",
            Self::MarkPendingDelete => "mark-pending-delete",
            Self::Delete => "deletion-delete",
            Self::ForceDelete => "deletion-force-delete",
            Self::DeleteSelf => "delete-self",
        }
    }
}

impl DeletionMode {
    /// Phases run inside the pipeline, in order. Cleanup is dispatched after
    /// completion and is not part of the pipeline.
    pub fn phases(&self) -> &'static [DeletionPhase] {
        match self {
            Self::Permissive => &[
                DeletionPhase::Check,
                DeletionPhase::MarkPendingDelete,
                DeletionPhase::Delete,
                DeletionPhase::DeleteSelf,
            ],
            Self::Enforced => &[
                DeletionPhase::MarkPendingDelete,
                DeletionPhase::ForceDelete,
                DeletionPhase::DeleteSelf,
            ],
        }
    }
}

/// Pipeline step that broadcasts one cascade action to every dependent
pub struct CascadeFlow {
    name: &'static str,
    action: CascadeAction,
    facade: Arc<CascadeFacade>,
    ctx: CascadeContext,
}

impl CascadeFlow {
    pub fn new(phase: DeletionPhase, action: CascadeAction, facade: Arc<CascadeFacade>, ctx: CascadeContext) -> Self {
        Self {
            name: phase.step_name(),
            action,
            facade,
            ctx,
        }
    }
}

#[async_trait]
impl Flow for CascadeFlow {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, data: &mut FlowData) -> OrchestrationResult<()> {
        self.facade.async_cascade(self.action, &self.ctx).await?;
        data.insert(
            format!("cascade.{}", self.action.code()),
            serde_json::Value::Bool(true),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_checks_before_any_mutation() {
        let phases = DeletionMode::Permissive.phases();
        assert_eq!(phases.first(), Some(&DeletionPhase::Check));
        assert!(!phases.contains(&DeletionPhase::ForceDelete));
        assert_eq!(phases.last(), Some(&DeletionPhase::DeleteSelf));
    }

    #[test]
    fn test_enforced_skips_check() {
        let phases = DeletionMode::Enforced.phases();
        assert!(!phases.contains(&DeletionPhase::Check));
        assert!(!phases.contains(&DeletionPhase::Delete));
        assert!(phases.contains(&DeletionPhase::ForceDelete));
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::to_string(&DeletionMode::Enforced).unwrap(),
            "\"enforced\""
        );
        assert_eq!(DeletionMode::default(), DeletionMode::Permissive);
    }
}
