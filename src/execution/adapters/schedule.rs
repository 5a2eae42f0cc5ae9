//! Timer-driven progress source with a fixed step schedule.

use crate::execution::domain::RunReport;
use crate::execution::ports::{ProgressSource, StepFailure, StepReport};
use async_trait::async_trait;
use std::time::Duration;

/// Reference schedule: ten steps of 10% each.
pub const DEFAULT_STEPS: u32 = 10;

/// Reference delay between steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Progress source that advances on a fixed timer.
///
/// Models a long-running unit of work as `steps` equal slices separated by
/// a fixed delay. A production deployment replaces this with a source fed
/// by real agent callbacks; the engine contract is identical either way.
#[derive(Debug, Clone)]
pub struct FixedScheduleSource {
    steps: u32,
    step_delay: Duration,
    report: RunReport,
}

impl Default for FixedScheduleSource {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS, DEFAULT_STEP_DELAY)
    }
}

impl FixedScheduleSource {
    /// Creates a schedule of `steps` slices separated by `step_delay`.
    ///
    /// A step count of zero is treated as one.
    #[must_use]
    pub fn new(steps: u32, step_delay: Duration) -> Self {
        Self {
            steps: steps.max(1),
            step_delay,
            report: RunReport {
                files_modified: vec!["src/main.rs".to_owned(), "src/lib.rs".to_owned()],
                tests_run: 5,
                coverage: Some(85),
            },
        }
    }

    /// Overrides the result payload attached on completion.
    #[must_use]
    pub fn with_report(mut self, report: RunReport) -> Self {
        self.report = report;
        self
    }

    /// Progress percentage after `step` of `total` slices.
    #[must_use]
    pub fn progress_for(step: u32, total: u32) -> u8 {
        #[expect(
            clippy::integer_division,
            reason = "percentage bucketing intentionally truncates"
        )]
        let percent = (u64::from(step) * 100) / u64::from(total.max(1));
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

#[async_trait]
impl ProgressSource for FixedScheduleSource {
    fn total_steps(&self) -> u32 {
        self.steps
    }

    async fn await_step(&self, step: u32) -> Result<StepReport, StepFailure> {
        tokio::time::sleep(self.step_delay).await;
        Ok(StepReport {
            progress: Self::progress_for(step, self.steps),
            log: format!("Step {step} completed"),
        })
    }

    fn final_report(&self) -> RunReport {
        self.report.clone()
    }
}
