//! Artifact packaging and upload
//!
//! The jar is staged in a [`ScratchDir`], wrapped in a single-entry zip named
//! `{app}-{version}.zip` and uploaded to `{app}/{version}/{archive}`.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::application::pipeline::StepOutcome;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{BundleLocation, VersionLabel};
use crate::infrastructure::scratch::ScratchDir;
use crate::infrastructure::traits::{CloudClient, FileSystem};

/// A packaged bundle. The archive lives as long as this value.
#[derive(Debug)]
pub struct PackagedArtifact {
    scratch: ScratchDir,
    pub archive: PathBuf,
    pub location: BundleLocation,
}

impl PackagedArtifact {
    /// Directory holding the staged jar and archive.
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Packaging and upload service.
pub struct ArtifactService {
    fs: Arc<dyn FileSystem>,
    cloud: Arc<dyn CloudClient>,
}

impl ArtifactService {
    pub fn new(fs: Arc<dyn FileSystem>, cloud: Arc<dyn CloudClient>) -> Self {
        Self { fs, cloud }
    }

    /// Fail with `MissingArtifact` unless `artifact` is a regular file.
    pub fn ensure_exists(&self, artifact: &Path) -> ApplicationResult<()> {
        if self.fs.is_file(artifact) {
            Ok(())
        } else {
            Err(ApplicationError::MissingArtifact(artifact.to_path_buf()))
        }
    }

    /// Stage and zip the artifact for `bucket`.
    pub fn package(
        &self,
        artifact: &Path,
        app: &str,
        version: &VersionLabel,
        bucket: &str,
    ) -> ApplicationResult<PackagedArtifact> {
        self.ensure_exists(artifact)?;

        let entry_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ApplicationError::Packaging {
                message: format!("artifact path has no file name: {}", artifact.display()),
            })?;

        let scratch =
            ScratchDir::new("ebdeploy-").with_path_context("create scratch dir", artifact)?;
        let staged = scratch.path().join(&entry_name);
        self.fs
            .copy(artifact, &staged)
            .with_path_context("stage artifact", artifact)?;

        let payload = self
            .fs
            .read(&staged)
            .with_path_context("read staged artifact", &staged)?;
        let bytes = zip_single_entry(&entry_name, &payload)?;

        let archive = scratch
            .path()
            .join(BundleLocation::archive_name(app, version));
        self.fs
            .write(&archive, &bytes)
            .with_path_context("write archive", &archive)?;
        debug!(
            "packaged {} ({} bytes) into {}",
            entry_name,
            bytes.len(),
            archive.display()
        );

        Ok(PackagedArtifact {
            scratch,
            archive,
            location: BundleLocation::for_version(bucket, app, version),
        })
    }

    /// Upload the archive to its bundle location.
    pub fn upload(&self, packaged: &PackagedArtifact) -> StepOutcome<BundleLocation> {
        self.cloud
            .upload_file(&packaged.archive, &packaged.location)
            .map(|_| packaged.location.clone())
            .into()
    }
}

/// Build an in-memory zip holding exactly one deflated entry.
pub fn zip_single_entry(name: &str, payload: &[u8]) -> ApplicationResult<Vec<u8>> {
    let packaging = |e: &dyn std::fmt::Display| ApplicationError::Packaging {
        message: e.to_string(),
    };

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(
            name,
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        )
        .map_err(|e| packaging(&e))?;
    writer.write_all(payload).map_err(|e| packaging(&e))?;
    let cursor = writer.finish().map_err(|e| packaging(&e))?;
    Ok(cursor.into_inner())
}
