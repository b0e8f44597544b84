//! Service container for dependency injection
//!
//! Wires up the workflows with their dependencies.

use std::sync::Arc;

use crate::application::services::{CleanupService, DeployWorkflow};
use crate::config::Settings;
use crate::infrastructure::aws::AwsCli;
use crate::infrastructure::traits::{
    Clock, CloudClient, CommandRunner, FileSystem, Prompter, RealCommandRunner, RealFileSystem,
    StdinPrompter, SystemClock,
};

/// Container holding the I/O boundaries for one invocation.
pub struct ServiceContainer {
    /// Resolved settings (flags already applied)
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction (tool availability checks)
    pub cmd: Arc<dyn CommandRunner>,

    /// Cloud provider
    pub cloud: Arc<dyn CloudClient>,

    pub clock: Arc<dyn Clock>,

    pub prompter: Arc<dyn Prompter>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let cloud = Arc::new(AwsCli::new(
            cmd.clone(),
            settings.aws_cli.clone(),
            settings.region.clone(),
            settings.profile.clone(),
        ));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            cmd,
            cloud,
            Arc::new(SystemClock),
            Arc::new(StdinPrompter),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        cloud: Arc<dyn CloudClient>,
        clock: Arc<dyn Clock>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            cmd,
            cloud,
            clock,
            prompter,
        }
    }

    pub fn deploy_workflow(&self) -> DeployWorkflow {
        DeployWorkflow::new(self.fs.clone(), self.cloud.clone(), self.clock.clone())
    }

    pub fn cleanup_service(&self) -> CleanupService {
        CleanupService::new(
            self.cloud.clone(),
            self.clock.clone(),
            self.prompter.clone(),
        )
    }
}
