//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::Path;
use std::process::Output;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::domain::{ApplicationVersion, BundleLocation, OptionSetting, RemoteResult};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Copy file from source to destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Read whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write bytes to file, replacing it.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;

    /// Check whether a command can be found on `PATH`.
    fn is_available(&self, cmd: &str) -> bool;
}

/// Wall clock and sleeping, so polling loops can run on virtual time.
pub trait Clock: Send + Sync {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Local calendar time (for version labels).
    fn local_now(&self) -> DateTime<Local>;

    /// Block the current thread.
    fn sleep(&self, duration: Duration);
}

/// Yes/no confirmation abstraction.
pub trait Prompter: Send + Sync {
    /// Ask a question; `Ok(true)` only on an explicit yes.
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Operations the reconcilers need from the cloud provider.
///
/// Existence checks return `Ok(false)` for absent resources; any other
/// failure is a classified [`crate::domain::RemoteError`].
pub trait CloudClient: Send + Sync {
    // -- storage --------------------------------------------------------

    /// Head-style existence check. Any error means "could not confirm it exists".
    fn head_bucket(&self, bucket: &str) -> RemoteResult<()>;

    /// Create a bucket. `location_constraint` is `None` for the default region.
    fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
        location_constraint: Option<&str>,
    ) -> RemoteResult<()>;

    /// Block until the provider reports the bucket exists.
    fn wait_bucket_exists(&self, bucket: &str) -> RemoteResult<()>;

    fn upload_file(&self, local: &Path, location: &BundleLocation) -> RemoteResult<()>;

    /// Remove every object under `prefix` (empty prefix: whole bucket).
    fn remove_objects(&self, bucket: &str, prefix: &str) -> RemoteResult<()>;

    fn delete_bucket(&self, bucket: &str) -> RemoteResult<()>;

    // -- applications -----------------------------------------------------

    /// Exact-name match on application records.
    fn application_exists(&self, app: &str) -> RemoteResult<bool>;

    fn create_application(&self, app: &str) -> RemoteResult<()>;

    /// Delete an application, force-terminating its environments.
    fn delete_application(&self, app: &str) -> RemoteResult<()>;

    fn create_application_version(
        &self,
        app: &str,
        label: &str,
        source: &BundleLocation,
    ) -> RemoteResult<()>;

    fn list_application_versions(&self, app: &str) -> RemoteResult<Vec<ApplicationVersion>>;

    /// Delete a version record together with its source bundle.
    fn delete_application_version(&self, app: &str, label: &str) -> RemoteResult<()>;

    // -- environments -----------------------------------------------------

    /// Number of non-terminated environments matching app + name.
    fn count_environments(&self, app: &str, env: &str) -> RemoteResult<usize>;

    fn update_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()>;

    fn create_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        platform: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()>;

    fn terminate_environment(&self, env: &str) -> RemoteResult<()>;

    fn list_solution_stacks(&self) -> RemoteResult<Vec<String>>;

    // -- identity ---------------------------------------------------------

    fn role_exists(&self, role: &str) -> RemoteResult<bool>;

    fn create_role(&self, role: &str, trust_policy: &str) -> RemoteResult<()>;

    fn attach_role_policy(&self, role: &str, policy_arn: &str) -> RemoteResult<()>;

    fn instance_profile_exists(&self, profile: &str) -> RemoteResult<bool>;

    fn create_instance_profile(&self, profile: &str) -> RemoteResult<()>;

    fn add_role_to_instance_profile(&self, profile: &str, role: &str) -> RemoteResult<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        std::process::Command::new(cmd).args(args).output()
    }

    fn is_available(&self, cmd: &str) -> bool {
        which::which(cmd).is_ok()
    }
}

/// Real clock backed by the OS.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Real prompter reading a line from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        crate::cli::output::prompt(&format!("{question} [y/N]"));
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Accept `y` / `yes` in any case; everything else is a no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
