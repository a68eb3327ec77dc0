//! Atomic replacement of the executable on disk.
//!
//! The running process keeps executing its already-loaded image; the new
//! bytes take effect on the next launch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::UpdateError;

/// How the executable gets replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStrategy {
    /// Write a sibling temp file, then atomically rename it over the executable.
    Rename,
    /// Truncate and rewrite the executable in place.
    ///
    /// Only used when the directory does not allow creating new files.
    Overwrite,
}

/// Replaces an executable with verified bytes.
///
/// The strategy is chosen by probing the file system (see [`Installer::probe`])
/// rather than by target platform, so the orchestrator only ever calls
/// [`Installer::install`].
#[derive(Debug, Clone)]
pub struct Installer {
    target: PathBuf,
}

impl Installer {
    /// Create an installer for the executable at `target`.
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
        }
    }

    /// Path of the executable being replaced.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Detect which replacement strategy this file system allows.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Install`] when neither a sibling file can be
    /// created nor the executable opened for writing.
    pub fn probe(&self) -> Result<ReplaceStrategy, UpdateError> {
        if !self.target.is_file() {
            return Err(self.error(format!(
                "executable not found at {}",
                self.target.display()
            )));
        }

        let dir = self.parent_dir();
        match NamedTempFile::new_in(dir) {
            Ok(probe) => {
                drop(probe);
                return Ok(ReplaceStrategy::Rename);
            }
            Err(e) => debug!("Cannot create files in {}: {}", dir.display(), e),
        }

        match fs::OpenOptions::new().write(true).open(&self.target) {
            Ok(_) => Ok(ReplaceStrategy::Overwrite),
            Err(e) => Err(self.error(format!("executable is not writable: {e}"))),
        }
    }

    /// Replace the executable with `bytes`.
    ///
    /// With [`ReplaceStrategy::Rename`] the executable is either fully
    /// replaced or left untouched.
    pub fn install(&self, bytes: &[u8]) -> Result<ReplaceStrategy, UpdateError> {
        let strategy = self.probe()?;
        match strategy {
            ReplaceStrategy::Rename => self.replace_by_rename(bytes)?,
            ReplaceStrategy::Overwrite => {
                warn!("Rename-based replacement unavailable, overwriting executable in place");
                self.replace_in_place(bytes)?;
            }
        }

        info!("Installed {} bytes to {}", bytes.len(), self.target.display());
        Ok(strategy)
    }

    fn replace_by_rename(&self, bytes: &[u8]) -> Result<(), UpdateError> {
        let dir = self.parent_dir();
        let mut staged = NamedTempFile::new_in(dir)
            .map_err(|e| self.error(format!("cannot create temp file: {e}")))?;

        staged.write_all(bytes).map_err(|e| self.error(format!("cannot write temp file: {e}")))?;
        staged.as_file().sync_all().map_err(|e| self.error(format!("cannot sync temp file: {e}")))?;

        let permissions = fs::metadata(&self.target)
            .map_err(|e| self.error(format!("cannot read executable metadata: {e}")))?
            .permissions();
        fs::set_permissions(staged.path(), permissions)
            .map_err(|e| self.error(format!("cannot set permissions: {e}")))?;

        self.persist(staged)
    }

    #[cfg(not(windows))]
    fn persist(&self, staged: NamedTempFile) -> Result<(), UpdateError> {
        staged
            .persist(&self.target)
            .map_err(|e| self.error(format!("cannot move new executable into place: {}", e.error)))?;
        Ok(())
    }

    #[cfg(windows)]
    fn persist(&self, staged: NamedTempFile) -> Result<(), UpdateError> {
        // A running image cannot be replaced, but it can be moved aside
        let old = self.moved_aside_path();
        let _ = fs::remove_file(&old);
        fs::rename(&self.target, &old)
            .map_err(|e| self.error(format!("cannot move running executable aside: {e}")))?;

        if let Err(e) = staged.persist(&self.target) {
            let restored = fs::rename(&old, &self.target);
            return Err(self.persist_failure(&e.error, restored, &old));
        }
        // Still mapped by this process; removal succeeds on a later run
        let _ = fs::remove_file(&old);
        Ok(())
    }

    fn replace_in_place(&self, bytes: &[u8]) -> Result<(), UpdateError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.target)
            .map_err(|e| self.error(format!("cannot open executable for writing: {e}")))?;

        file.write_all(bytes).map_err(|e| self.error(format!("cannot write executable: {e}")))?;
        file.sync_all().map_err(|e| self.error(format!("cannot sync executable: {e}")))?;
        Ok(())
    }

    /// Error for a failed final rename, naming the moved-aside copy when it
    /// could not be put back.
    #[cfg(any(windows, test))]
    fn persist_failure(
        &self,
        error: &std::io::Error,
        restored: std::io::Result<()>,
        old: &Path,
    ) -> UpdateError {
        match restored {
            Ok(()) => self.error(format!("cannot move new executable into place: {error}")),
            Err(restore) => self.error(format!(
                "cannot move new executable into place: {error}; restoring previous executable from {} also failed: {restore}",
                old.display()
            )),
        }
    }

    #[cfg(windows)]
    fn moved_aside_path(&self) -> PathBuf {
        let name = self.target.file_name().unwrap_or_default().to_string_lossy();
        self.parent_dir().join(format!(".{name}.old"))
    }

    fn parent_dir(&self) -> &Path {
        match self.target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn error(&self, reason: String) -> UpdateError {
        UpdateError::Install {
            path: self.target.display().to_string(),
            reason,
        }
    }
}
