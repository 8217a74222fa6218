//! Trained-data directory linking.
//!
//! The engine reads its language models from a writable per-user directory,
//! while the application ships them in a read-only bundle. A symbolic link
//! joins the two. It is created once per process and never removed.

use crate::error::LinkError;
use crate::models::config::TessdataConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// What [`TessdataLink::ensure`] found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Created,
    AlreadyPresent,
}

/// Link from the per-user data directory to the bundled trained data
#[derive(Debug, Clone, PartialEq)]
pub struct TessdataLink {
    bundled: PathBuf,
    link: PathBuf,
}

impl TessdataLink {
    pub fn new(bundled: impl Into<PathBuf>, link: impl Into<PathBuf>) -> Self {
        Self {
            bundled: bundled.into(),
            link: link.into(),
        }
    }

    /// Resolve both ends from configuration
    pub fn from_config(config: &TessdataConfig) -> Result<Self, LinkError> {
        let link = config.resolve_data_dir().ok_or(LinkError::NoDataDir)?;
        let bundled = config
            .resolve_bundled_dir()
            .ok_or_else(|| LinkError::MissingBundle(PathBuf::from("tessdata")))?;
        Ok(Self::new(bundled, link))
    }

    pub fn bundled_dir(&self) -> &Path {
        &self.bundled
    }

    /// Directory the engine should read from
    pub fn data_dir(&self) -> &Path {
        &self.link
    }

    /// Create the link if nothing exists at the link path yet.
    ///
    /// Safe to call repeatedly: an existing entry is reported as
    /// [`LinkStatus::AlreadyPresent`] and left untouched.
    pub fn ensure(&self) -> Result<LinkStatus, LinkError> {
        if let Ok(existing) = fs::read_link(&self.link) {
            if existing != self.bundled {
                tracing::warn!(
                    link = %self.link.display(),
                    points_to = %existing.display(),
                    expected = %self.bundled.display(),
                    "Trained-data link points elsewhere, leaving it in place"
                );
            }
            return Ok(LinkStatus::AlreadyPresent);
        }

        if self.link.exists() {
            tracing::debug!(path = %self.link.display(), "Trained-data directory already present");
            return Ok(LinkStatus::AlreadyPresent);
        }

        if !self.bundled.is_dir() {
            return Err(LinkError::MissingBundle(self.bundled.clone()));
        }

        if let Some(parent) = self.link.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        match symlink_dir(&self.bundled, &self.link) {
            Ok(()) => {
                tracing::info!(
                    link = %self.link.display(),
                    target = %self.bundled.display(),
                    "Linked trained-data directory"
                );
                Ok(LinkStatus::Created)
            }
            // Another call won the race
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(LinkStatus::AlreadyPresent)
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> LinkError {
        LinkError::Io {
            link: self.link.clone(),
            target: self.bundled.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn bundle_with_model(root: &Path) -> PathBuf {
        let bundled = root.join("bundle").join("tessdata");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("eng.traineddata"), b"model").unwrap();
        bundled
    }

    #[test]
    fn test_creates_link_to_bundle() {
        let root = tempfile::tempdir().unwrap();
        let bundled = bundle_with_model(root.path());
        let link = TessdataLink::new(&bundled, root.path().join("user").join("tessdata"));

        assert_eq!(link.ensure().unwrap(), LinkStatus::Created);
        assert_eq!(fs::read_link(link.data_dir()).unwrap(), bundled);
        assert!(link.data_dir().join("eng.traineddata").exists());
    }

    #[test]
    fn test_ensure_twice_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let bundled = bundle_with_model(root.path());
        let link = TessdataLink::new(&bundled, root.path().join("user").join("tessdata"));

        assert_eq!(link.ensure().unwrap(), LinkStatus::Created);
        assert_eq!(link.ensure().unwrap(), LinkStatus::AlreadyPresent);
        assert_eq!(fs::read_link(link.data_dir()).unwrap(), bundled);
    }

    #[test]
    fn test_existing_directory_is_left_alone() {
        let root = tempfile::tempdir().unwrap();
        let bundled = bundle_with_model(root.path());
        let user_dir = root.path().join("user").join("tessdata");
        fs::create_dir_all(&user_dir).unwrap();

        let link = TessdataLink::new(&bundled, &user_dir);
        assert_eq!(link.ensure().unwrap(), LinkStatus::AlreadyPresent);
        assert!(fs::read_link(&user_dir).is_err(), "real directory must not be replaced");
    }

    #[test]
    fn test_missing_bundle() {
        let root = tempfile::tempdir().unwrap();
        let link = TessdataLink::new(
            root.path().join("nope"),
            root.path().join("user").join("tessdata"),
        );

        assert!(matches!(link.ensure(), Err(LinkError::MissingBundle(_))));
        assert!(!link.data_dir().exists());
    }

    #[test]
    fn test_from_config_uses_explicit_dirs() {
        let config = TessdataConfig {
            bundled_dir: Some(PathBuf::from("/opt/app/tessdata")),
            data_dir: Some(PathBuf::from("/var/lib/ocr/tessdata")),
            link_on_startup: true,
        };

        let link = TessdataLink::from_config(&config).unwrap();
        assert_eq!(link.bundled_dir(), Path::new("/opt/app/tessdata"));
        assert_eq!(link.data_dir(), Path::new("/var/lib/ocr/tessdata"));
    }
}
