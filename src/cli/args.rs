//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};

use crate::config::RawSettings;

/// Deploy and tear down a Java application on Elastic Beanstalk
#[derive(Parser, Debug)]
#[command(name = "ebdeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: $XDG_CONFIG_HOME/ebdeploy/ebdeploy.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package, upload and roll out the artifact
    #[command(disable_version_flag = true)]
    Deploy(DeployArgs),

    /// Terminate the environment and remove versions, bundles and optionally bucket/app
    Cleanup(CleanupArgs),

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flags shared by deploy and cleanup.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Application name [env: EB_APP_NAME]
    #[arg(long)]
    pub app: Option<String>,

    /// Environment name [env: EB_ENV_NAME]
    #[arg(long)]
    pub env: Option<String>,

    /// Bucket for source bundles [env: EB_BUCKET]
    #[arg(long)]
    pub bucket: Option<String>,

    /// Region [env: EB_REGION, AWS_REGION, AWS_DEFAULT_REGION]
    #[arg(long)]
    pub region: Option<String>,

    /// Named credentials profile [env: EB_PROFILE, AWS_PROFILE]
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Fallback platform descriptor [env: EB_PLATFORM]
    #[arg(long)]
    pub platform: Option<String>,

    /// Pre-built jar [env: EB_ARTIFACT]
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub jar: Option<PathBuf>,

    /// Version label (default: v-YYYYMMDDHHMMSS)
    #[arg(long = "version")]
    pub version_label: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Also empty and delete the bucket
    #[arg(long)]
    pub delete_bucket: bool,

    /// Also delete the application
    #[arg(long)]
    pub delete_app: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective config
    Show,

    /// Create config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config path
    Path,
}

impl Cli {
    /// Usage text of the invoked subcommand, e.g. `Usage: ebdeploy deploy [OPTIONS]`.
    pub fn usage(&self) -> String {
        let mut cmd = Cli::command();
        cmd.build();
        match cmd.find_subcommand_mut(self.command.name()) {
            Some(sub) => sub.render_usage().to_string(),
            None => cmd.render_usage().to_string(),
        }
    }
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Deploy(_) => "deploy",
            Commands::Cleanup(_) => "cleanup",
            Commands::Config { .. } => "config",
            Commands::Completion { .. } => "completion",
        }
    }
}

impl TargetArgs {
    /// Flags as the highest-precedence settings layer.
    pub fn overrides(&self) -> RawSettings {
        RawSettings {
            app: self.app.clone(),
            env: self.env.clone(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            profile: self.profile.clone(),
            ..RawSettings::default()
        }
    }
}

impl DeployArgs {
    pub fn overrides(&self) -> RawSettings {
        RawSettings {
            platform: self.platform.clone(),
            artifact: self.jar.clone(),
            ..self.target.overrides()
        }
    }
}
