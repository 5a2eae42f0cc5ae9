//! Unit tests for execution lifecycle transition validation.

use crate::execution::domain::ExecutionStatus;
use rstest::rstest;

#[rstest]
#[case(ExecutionStatus::Pending, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Running, true)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Completed, false)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Failed, false)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Cancelled, false)]
#[case(ExecutionStatus::Running, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Running, ExecutionStatus::Running, false)]
#[case(ExecutionStatus::Running, ExecutionStatus::Completed, true)]
#[case(ExecutionStatus::Running, ExecutionStatus::Failed, true)]
#[case(ExecutionStatus::Running, ExecutionStatus::Cancelled, true)]
#[case(ExecutionStatus::Completed, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Completed, ExecutionStatus::Running, false)]
#[case(ExecutionStatus::Completed, ExecutionStatus::Completed, false)]
#[case(ExecutionStatus::Completed, ExecutionStatus::Failed, false)]
#[case(ExecutionStatus::Completed, ExecutionStatus::Cancelled, false)]
#[case(ExecutionStatus::Failed, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Failed, ExecutionStatus::Running, false)]
#[case(ExecutionStatus::Failed, ExecutionStatus::Completed, false)]
#[case(ExecutionStatus::Failed, ExecutionStatus::Failed, false)]
#[case(ExecutionStatus::Failed, ExecutionStatus::Cancelled, false)]
#[case(ExecutionStatus::Cancelled, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Cancelled, ExecutionStatus::Running, false)]
#[case(ExecutionStatus::Cancelled, ExecutionStatus::Completed, false)]
#[case(ExecutionStatus::Cancelled, ExecutionStatus::Failed, false)]
#[case(ExecutionStatus::Cancelled, ExecutionStatus::Cancelled, false)]
fn can_transition_to_returns_expected(
    #[case] from: ExecutionStatus,
    #[case] to: ExecutionStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Running, false)]
#[case(ExecutionStatus::Completed, true)]
#[case(ExecutionStatus::Failed, true)]
#[case(ExecutionStatus::Cancelled, true)]
fn is_terminal_returns_expected(#[case] status: ExecutionStatus, #[case] expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[rstest]
#[case("pending", ExecutionStatus::Pending)]
#[case("RUNNING", ExecutionStatus::Running)]
#[case(" completed ", ExecutionStatus::Completed)]
#[case("failed", ExecutionStatus::Failed)]
#[case("cancelled", ExecutionStatus::Cancelled)]
fn parse_accepts_known_statuses(#[case] raw: &str, #[case] expected: ExecutionStatus) {
    assert_eq!(ExecutionStatus::try_from(raw), Ok(expected));
}

#[rstest]
fn parse_rejects_unknown_status() {
    assert!(ExecutionStatus::try_from("paused").is_err());
}

#[rstest]
#[case(ExecutionStatus::Pending, "pending")]
#[case(ExecutionStatus::Running, "running")]
#[case(ExecutionStatus::Completed, "completed")]
#[case(ExecutionStatus::Failed, "failed")]
#[case(ExecutionStatus::Cancelled, "cancelled")]
fn display_matches_storage_form(#[case] status: ExecutionStatus, #[case] expected: &str) {
    assert_eq!(status.to_string(), expected);
}
