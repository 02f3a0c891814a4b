use std::fmt;

use crate::config::GlobalConfig;
use crate::core::errors::ReconcileError;
use crate::executors::command::{run_tool, CommandOutput, CommandRunner};

/// Per-run progress through the reconciliation sequence. Failure is
/// terminal from any non-terminal phase; the phase then names the last
/// completed gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    ModulesEnabled,
    SiteSwitched,
    Validated,
    Restarted,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcilePhase::Idle => "idle",
            ReconcilePhase::ModulesEnabled => "modules-enabled",
            ReconcilePhase::SiteSwitched => "site-switched",
            ReconcilePhase::Validated => "validated",
            ReconcilePhase::Restarted => "restarted",
        };
        write!(f, "{}", name)
    }
}

pub struct Reconciler<'a> {
    config: &'a GlobalConfig,
    runner: &'a dyn CommandRunner,
    phase: ReconcilePhase,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a GlobalConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            phase: ReconcilePhase::Idle,
        }
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    fn advance(&mut self, phase: ReconcilePhase) {
        tracing::debug!("reconcile phase: {}", phase);
        self.phase = phase;
    }

    /// Each step gates the next: modules, site switch, syntax validation,
    /// and only then the restart. A validation failure never reaches the
    /// service; a restart failure leaves the site enabled for the operator.
    pub async fn apply(
        &mut self,
        site: &str,
        previous_site: Option<&str>,
        modules: &[String],
    ) -> Result<(), ReconcileError> {
        for module in modules {
            self.enable_module(module).await?;
        }
        self.advance(ReconcilePhase::ModulesEnabled);

        if let Some(previous) = previous_site {
            self.disable_site(previous).await?;
        }
        self.enable_site(site).await?;
        self.advance(ReconcilePhase::SiteSwitched);

        self.validate().await?;
        self.advance(ReconcilePhase::Validated);

        self.restart().await?;
        self.advance(ReconcilePhase::Restarted);

        Ok(())
    }

    async fn enable_module(&self, module: &str) -> Result<(), ReconcileError> {
        let output = self
            .run_step_tool(&self.config.tools.enable_module, &[module])
            .await
            .map_err(|e| command_failed(format!("a2enmod {}", module), e))?;

        if !output.success() {
            return Err(ReconcileError::CommandFailed {
                step: format!("a2enmod {}", module),
                output: output.combined(),
            });
        }
        Ok(())
    }

    async fn disable_site(&self, site: &str) -> Result<(), ReconcileError> {
        let output = self
            .run_step_tool(&self.config.tools.disable_site, &[site])
            .await
            .map_err(|e| command_failed(format!("a2dissite {}", site), e))?;

        if !output.success() {
            // An absent or already-disabled site is the desired end state.
            if site_already_absent(&output) {
                tracing::debug!("Site {} already disabled or absent", site);
                return Ok(());
            }
            return Err(ReconcileError::CommandFailed {
                step: format!("a2dissite {}", site),
                output: output.combined(),
            });
        }
        Ok(())
    }

    async fn enable_site(&self, site: &str) -> Result<(), ReconcileError> {
        let output = self
            .run_step_tool(&self.config.tools.enable_site, &[site])
            .await
            .map_err(|e| command_failed(format!("a2ensite {}", site), e))?;

        if !output.success() {
            return Err(ReconcileError::CommandFailed {
                step: format!("a2ensite {}", site),
                output: output.combined(),
            });
        }
        Ok(())
    }

    async fn validate(&self) -> Result<(), ReconcileError> {
        let output = self
            .run_step_tool(&self.config.tools.apachectl, &["configtest"])
            .await
            .map_err(|e| command_failed("configtest".to_string(), e))?;

        if !output.success() {
            // The validator's raw output goes to the operator untouched.
            return Err(ReconcileError::ValidationFailed {
                output: output.combined(),
            });
        }
        Ok(())
    }

    async fn restart(&self) -> Result<(), ReconcileError> {
        let unit = self.config.tools.service_unit.as_str();
        let output = self
            .run_step_tool(&self.config.tools.systemctl, &["restart", unit])
            .await
            .map_err(|e| ReconcileError::RestartFailed {
                output: format!("{:#}", e),
            })?;

        if !output.success() {
            return Err(ReconcileError::RestartFailed {
                output: output.stderr_tail(10),
            });
        }
        Ok(())
    }

    async fn run_step_tool(
        &self,
        command: &str,
        args: &[&str],
    ) -> anyhow::Result<CommandOutput> {
        run_tool(self.runner, command, args).await
    }
}

fn command_failed(step: String, err: anyhow::Error) -> ReconcileError {
    ReconcileError::CommandFailed {
        step,
        output: format!("{:#}", err),
    }
}

fn site_already_absent(output: &CommandOutput) -> bool {
    let text = output.combined();
    text.contains("does not exist")
        || text.contains("not enabled")
        || text.contains("already disabled")
}
