//! Issue-type workflow dispatch and prompt derivation.
//!
//! Each issue type maps to a fixed sequence of named actions an agent works
//! through. The table is static: handlers are data, not behaviour, and the
//! engine treats every workflow identically.

use crate::tracker::domain::{Issue, IssueType};

/// One named action in an issue type's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
    /// Action identifier, stable across releases.
    pub name: &'static str,
}

const fn step(name: &'static str) -> WorkflowStep {
    WorkflowStep { name }
}

const TASK_WORKFLOW: &[WorkflowStep] = &[
    step("analyze_requirements"),
    step("generate_implementation_plan"),
    step("execute_task"),
    step("verify_completion"),
];

const BUG_WORKFLOW: &[WorkflowStep] = &[
    step("reproduce_bug"),
    step("find_root_cause"),
    step("implement_fix"),
    step("create_regression_test"),
    step("run_tests"),
];

const FEATURE_WORKFLOW: &[WorkflowStep] = &[
    step("create_design_doc"),
    step("create_subtasks"),
    step("implement_feature"),
    step("write_tests"),
    step("generate_documentation"),
    step("validate_checklist"),
];

const HOTFIX_WORKFLOW: &[WorkflowStep] = &[
    step("quick_analysis"),
    step("apply_hotfix"),
    step("run_critical_tests"),
    step("prepare_deployment"),
];

const IMPROVEMENT_WORKFLOW: &[WorkflowStep] = &[
    step("analyze_code_quality"),
    step("suggest_improvements"),
    step("apply_refactoring"),
    step("run_benchmarks"),
];

const EPIC_WORKFLOW: &[WorkflowStep] = &[step("create_stories"), step("create_roadmap")];

/// Returns the workflow for an issue type.
///
/// Stories share the feature workflow at a smaller scope; sub-tasks share
/// the task workflow with parent context.
#[must_use]
pub const fn workflow_for(issue_type: IssueType) -> &'static [WorkflowStep] {
    match issue_type {
        IssueType::Task | IssueType::SubTask => TASK_WORKFLOW,
        IssueType::Bug => BUG_WORKFLOW,
        IssueType::Feature | IssueType::Story => FEATURE_WORKFLOW,
        IssueType::Hotfix => HOTFIX_WORKFLOW,
        IssueType::Improvement => IMPROVEMENT_WORKFLOW,
        IssueType::Epic => EPIC_WORKFLOW,
    }
}

/// Derives the execution prompt for an issue.
#[must_use]
pub fn prompt_for(issue: &Issue) -> String {
    format!("Process issue: {}", issue.title())
}
