//! Scoped scratch directories
//!
//! A [`ScratchDir`] is removed when dropped (normal return or early `?`).
//! Live scratch paths are also tracked in a process-wide registry so the
//! Ctrl-C handler installed by [`install_interrupt_cleanup`] can remove them
//! before the process exits.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tempfile::TempDir;
use tracing::{debug, warn};

fn registry() -> &'static Mutex<Vec<PathBuf>> {
    static LIVE: OnceLock<Mutex<Vec<PathBuf>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(Vec::new()))
}

/// Temporary directory owned by one invocation.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir.
    pub fn new(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        if let Ok(mut live) = registry().lock() {
            live.push(dir.path().to_path_buf());
        }
        debug!("scratch dir: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Ok(mut live) = registry().lock() {
            live.retain(|p| p != self.dir.path());
        }
        debug!("removing scratch dir: {}", self.dir.path().display());
    }
}

/// Paths of scratch directories that are currently alive.
pub fn live_scratch_dirs() -> Vec<PathBuf> {
    registry()
        .lock()
        .map(|live| live.clone())
        .unwrap_or_default()
}

/// Remove every live scratch directory. Called from the interrupt handler.
pub fn remove_live_scratch_dirs() {
    remove_dirs(&live_scratch_dirs());
}

fn remove_dirs(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_dir_all(path) {
            warn!("cannot remove {}: {}", path.display(), e);
        }
    }
}

/// Install a Ctrl-C handler that cleans scratch dirs and exits 130.
pub fn install_interrupt_cleanup() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        remove_live_scratch_dirs();
        std::process::exit(crate::exitcode::INTERRUPTED);
    })
}
