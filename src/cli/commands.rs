//! Command dispatch
//!
//! Order for deploy and cleanup: resolve settings → validate (no remote
//! call yet) → check the `aws` client → check the artifact → run.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{CleanupReport, DeployReport, Termination};
use crate::cli::args::{CleanupArgs, Cli, Commands, ConfigCommands, DeployArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, RawSettings, Settings};
use crate::domain::DomainError;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

const AWS_CLI_HINT: &str =
    "install AWS CLI v2: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html";

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Deploy(args) => cmd_deploy(cli.config.as_deref(), args),
        Commands::Cleanup(args) => cmd_cleanup(cli.config.as_deref(), args),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(cli.config.as_deref()),
            ConfigCommands::Path => cmd_config_path(cli.config.as_deref()),
            ConfigCommands::Init { force } => cmd_config_init(cli.config.as_deref(), *force),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Layered settings with the command-line layer on top.
fn resolve_settings(config: Option<&Path>, overrides: &RawSettings) -> CliResult<Settings> {
    Ok(Settings::load(config)?.apply(overrides))
}

#[instrument]
fn cmd_deploy(config: Option<&Path>, args: &DeployArgs) -> CliResult<()> {
    let settings = resolve_settings(config, &args.overrides())?;
    let container = ServiceContainer::new(settings);
    run_deploy(&container, args.version_label.as_deref()).map(|_| ())
}

#[instrument]
fn cmd_cleanup(config: Option<&Path>, args: &CleanupArgs) -> CliResult<()> {
    let settings = resolve_settings(config, &args.target.overrides())?;
    let container = ServiceContainer::new(settings);
    run_cleanup(&container, args).map(|_| ())
}

/// Fail with exit 3 unless the configured `aws` client is on PATH.
fn ensure_aws_cli(container: &ServiceContainer) -> CliResult<()> {
    let tool = &container.settings.aws_cli;
    if container.cmd.is_available(tool) {
        Ok(())
    } else {
        Err(InfraError::MissingTool {
            tool: tool.clone(),
            hint: AWS_CLI_HINT.into(),
        }
        .into())
    }
}

/// Deploy with the container's settings. `version` is the `--version` label.
pub fn run_deploy(container: &ServiceContainer, version: Option<&str>) -> CliResult<DeployReport> {
    let now = container.clock.local_now();
    let req = container
        .settings
        .deploy_request(version, &now)
        .map_err(|e| CliError::Usage(e.to_string()))?;
    debug!("deploy request: {:?}", req);

    ensure_aws_cli(container)?;
    let workflow = container.deploy_workflow();
    workflow.check_artifact(&req)?;

    output::header(&format!(
        "Deploying {} ({}) to {}/{} in {}",
        req.artifact.display(),
        req.version,
        req.app,
        req.env,
        req.region
    ));
    let report = workflow.run(&req)?;

    output::step_summary(&report.records);
    output::action("Bundle", &report.location.uri());
    output::success(&format!(
        "{} {} with version {}",
        req.env, report.environment, req.version
    ));
    if report.warnings > 0 {
        output::warning(&format!("{} step(s) finished with warnings", report.warnings));
    }
    output::detail("the environment is rolling out; health is not awaited");
    Ok(report)
}

/// Cleanup with the container's settings.
pub fn run_cleanup(container: &ServiceContainer, args: &CleanupArgs) -> CliResult<CleanupReport> {
    let req = container
        .settings
        .cleanup_request(args.delete_bucket, args.delete_app, args.yes)
        .map_err(|e| match e {
            DomainError::MalformedBucket(_) => CliError::Validation(e.to_string()),
            other => CliError::Usage(other.to_string()),
        })?;
    debug!("cleanup request: {:?}", req);

    ensure_aws_cli(container)?;
    let report = container.cleanup_service().run(&req)?;

    output::header(&format!("Cleanup of {}", req.app));
    output::step_summary(&report.records);
    if let Some(termination) = report.termination {
        let env = req.env.as_deref().unwrap_or_default();
        match termination {
            Termination::NotPresent => output::detail(&format!("environment {env} not present")),
            Termination::AlreadyGone => output::detail(&format!("environment {env} already gone")),
            Termination::Terminated => output::action("Terminated", &env),
            Termination::TimedOut => output::detail(&format!("environment {env} still terminating")),
        }
    }
    output::action("Versions deleted", &report.versions_deleted);
    if report.warnings > 0 {
        output::warning(&format!("{} step(s) finished with warnings", report.warnings));
    } else {
        output::success("cleanup complete");
    }
    Ok(report)
}

fn config_file(config: Option<&Path>) -> CliResult<PathBuf> {
    config
        .map(Path::to_path_buf)
        .or_else(global_config_path)
        .ok_or_else(|| CliError::Usage("cannot determine config directory; pass --config".into()))
}

#[instrument]
fn cmd_config_show(config: Option<&Path>) -> CliResult<()> {
    let settings = Settings::load(config)?;
    output::info(&settings.to_toml()?);
    Ok(())
}

#[instrument]
fn cmd_config_path(config: Option<&Path>) -> CliResult<()> {
    let path = config_file(config)?;
    let state = if path.exists() { "exists" } else { "not found" };
    output::info(&format!("{} ({state})", path.display()));
    Ok(())
}

#[instrument]
fn cmd_config_init(config: Option<&Path>, force: bool) -> CliResult<()> {
    let path = config_file(config)?;
    if path.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    std::fs::write(&path, Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::action("Created", &path.display());
    Ok(())
}
