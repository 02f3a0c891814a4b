use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::{DeploymentTarget, StepOutcome, StepResult};

/// Per-run audit trail. Steps are append-only for the lifetime of the run
/// and are never persisted; the summary printer and `--json` read them at
/// process exit.
#[derive(Debug, Serialize)]
pub struct RunState {
    pub app_dir: String,
    pub site: String,
    pub mode: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
}

impl RunState {
    pub fn new(target: &DeploymentTarget, run_id: String) -> Self {
        Self {
            app_dir: target.app_dir.display().to_string(),
            site: target.site_name.clone(),
            mode: target.ssl_mode.as_str().to_string(),
            run_id,
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    /// Awaits one step, records its outcome, and hands the error back to the
    /// caller so the remaining sequence short-circuits.
    pub async fn run_step<T, E, F>(&mut self, name: &str, step: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        tracing::info!("step started: {}", name);
        match step.await {
            Ok(value) => {
                tracing::info!("step completed: {}", name);
                self.steps.push(StepResult {
                    name: name.to_string(),
                    outcome: StepOutcome::Success,
                    detail: "completed".to_string(),
                });
                Ok(value)
            }
            Err(err) => {
                tracing::error!("step failed: {}: {}", name, err);
                self.steps.push(StepResult {
                    name: name.to_string(),
                    outcome: StepOutcome::Failed,
                    detail: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn record_skipped(&mut self, name: &str, detail: &str) {
        tracing::info!("step skipped: {}: {}", name, detail);
        self.steps.push(StepResult {
            name: name.to_string(),
            outcome: StepOutcome::Skipped,
            detail: detail.to_string(),
        });
    }

    pub fn all_succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.outcome != StepOutcome::Failed)
    }

    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|s| s.outcome == StepOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SslMode;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn target() -> DeploymentTarget {
        DeploymentTarget::new(
            PathBuf::from("/srv/app"),
            "notes".to_string(),
            SslMode::None,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_step_records_success() {
        let mut state = RunState::new(&target(), "run_test_1".to_string());
        let out: Result<u32, std::io::Error> =
            state.run_step("preflight", async { Ok(7) }).await;
        assert_eq!(out.unwrap(), 7);
        assert_eq!(state.steps.len(), 1);
        assert_eq!(state.steps[0].outcome, StepOutcome::Success);
        assert!(state.all_succeeded());
    }

    #[tokio::test]
    async fn test_run_step_records_failure_detail() {
        let mut state = RunState::new(&target(), "run_test_2".to_string());
        let out: Result<(), String> = state
            .run_step("provision", async { Err("boom".to_string()) })
            .await;
        assert!(out.is_err());
        assert_eq!(state.steps[0].outcome, StepOutcome::Failed);
        assert_eq!(state.steps[0].detail, "boom");
        assert_eq!(state.failed_step().unwrap().name, "provision");
        assert!(!state.all_succeeded());
    }

    #[tokio::test]
    async fn test_skipped_steps_do_not_fail_the_run() {
        let mut state = RunState::new(&target(), "run_test_3".to_string());
        state.record_skipped("provision", "no certificate requested");
        assert_eq!(state.steps[0].outcome, StepOutcome::Skipped);
        assert!(state.all_succeeded());
    }
}
