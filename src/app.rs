use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    cli::args::Cli,
    config::{ConfigLoader, GlobalConfig},
    core::{
        errors::SetupError,
        models::{DeploymentTarget, SslMode},
        state::RunState,
    },
    executors::{
        command::{CommandRunner, SystemRunner},
        toolchain,
    },
    steps::{materialize, preflight, provision, reconcile::Reconciler},
    ui::{printer, progress::ProgressManager},
    utils::{logging, time},
};

pub async fn run(cli: Cli) -> Result<(), SetupError> {
    let level = logging::level_from_cli(&cli);
    logging::init(level)?;

    let config = ConfigLoader::load_with_custom_path(cli.config.as_deref())?;

    let target = target_from_cli(&cli)?;
    tracing::info!(
        "Configuring site {} in {:?} (mode: {})",
        target.site_name,
        target.app_dir,
        target.ssl_mode.as_str()
    );

    toolchain::verify_or_bail(target.ssl_mode, &config.tools)?;

    let runner = SystemRunner::new(config.limits.command_timeout_ms);
    let mut state = RunState::new(&target, time::new_run_id(&target.site_name));
    let progress = if cli.json {
        ProgressManager::hidden()
    } else {
        ProgressManager::new()
    };

    let result = run_deployment(
        &target,
        &config,
        &runner,
        preflight::is_elevated(),
        &mut state,
        &progress,
    )
    .await;

    progress.finish();

    if cli.json {
        let rendered = serde_json::to_string_pretty(&state)
            .context("Failed to serialize run state")?;
        println!("{}", rendered);
    } else {
        printer::print_summary(&state);
    }

    result
}

/// The full step sequence against an injected runner; the testable core of
/// the orchestrator. Each step records into the audit trail and
/// short-circuits the rest on failure.
pub async fn run_deployment(
    target: &DeploymentTarget,
    config: &GlobalConfig,
    runner: &dyn CommandRunner,
    elevated: bool,
    state: &mut RunState,
    progress: &ProgressManager,
) -> Result<(), SetupError> {
    progress.update("Checking preconditions...");
    state
        .run_step("preflight", async {
            preflight::verify(target, config, elevated)
        })
        .await?;

    let artifact = match target.ssl_mode {
        SslMode::None => {
            state.record_skipped("provision", "no certificate requested");
            None
        }
        SslMode::SelfSigned => {
            progress.update("Generating self-signed certificate...");
            Some(
                state
                    .run_step("provision", provision::self_signed(config, runner))
                    .await?,
            )
        }
        SslMode::LetsEncrypt => {
            let Some(domain) = target.domain.as_deref() else {
                return Err(SetupError::InvalidArguments(
                    "Let's Encrypt mode requires a domain".to_string(),
                ));
            };
            progress.update(&format!("Requesting certificate for {}...", domain));
            Some(
                state
                    .run_step("provision", provision::lets_encrypt(domain, config, runner))
                    .await?,
            )
        }
    };

    let plan = SitePlan::for_target(target, config);

    progress.update("Rendering site configuration...");
    let substitutions = materialize::substitutions(target, artifact.as_ref());
    state
        .run_step("materialize", async {
            materialize::materialize(&plan.template, &substitutions, &plan.destination)
        })
        .await?;

    progress.update("Applying configuration to the service...");
    let mut modules = config.modules.clone();
    if target.ssl_mode.is_tls() && !modules.iter().any(|m| m == "ssl") {
        modules.push("ssl".to_string());
    }
    let mut reconciler = Reconciler::new(config, runner);
    state
        .run_step(
            "reconcile",
            reconciler.apply(&plan.enabled_site, Some(plan.previous_site.as_str()), &modules),
        )
        .await?;

    tracing::info!("Deployment complete for site {}", plan.enabled_site);
    Ok(())
}

/// Where the rendered configuration goes and which sites are switched.
/// TLS runs enable `<site>-ssl` and retire the plain site; plain runs
/// retire the distribution default.
struct SitePlan {
    template: PathBuf,
    destination: PathBuf,
    enabled_site: String,
    previous_site: String,
}

impl SitePlan {
    fn for_target(target: &DeploymentTarget, config: &GlobalConfig) -> Self {
        let (template_rel, enabled_site, previous_site) = if target.ssl_mode.is_tls() {
            (
                &config.paths.ssl_template,
                format!("{}-ssl", target.site_name),
                target.site_name.clone(),
            )
        } else {
            (
                &config.paths.plain_template,
                target.site_name.clone(),
                "000-default".to_string(),
            )
        };

        Self {
            template: target.app_dir.join(template_rel),
            destination: config
                .paths
                .sites_available
                .join(format!("{}.conf", enabled_site)),
            enabled_site,
            previous_site,
        }
    }
}

fn target_from_cli(cli: &Cli) -> Result<DeploymentTarget, SetupError> {
    let app_dir = match &cli.directory {
        Some(dir) => dir.clone(),
        None => default_directory()?,
    };

    let site_name = match &cli.site {
        Some(site) => site.clone(),
        None => app_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "site".to_string()),
    };

    DeploymentTarget::new(app_dir, site_name, cli.ssl_mode(), cli.letsencrypt.clone())
}

// Invocations usually happen from a deploy/ directory inside the
// application checkout, so default to one level up.
fn default_directory() -> Result<PathBuf, SetupError> {
    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
    Ok(cwd.parent().map(Path::to_path_buf).unwrap_or(cwd))
}
