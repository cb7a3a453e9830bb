use std::fmt;
use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Naming convention for the per-component listening endpoints.
///
/// Every component gets a Unix socket at `<dir>/<prefix><name>`, so the
/// endpoint for `coms_handler` with the defaults is
/// `/tmp/fifo_socket_coms_handler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketLayout {
    dir: Utf8PathBuf,
    prefix: String,
}

impl SocketLayout {
    /// Builds a layout rooted at `dir` using `prefix` for every filename.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Directory holding the endpoints.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        self.dir.as_path()
    }

    /// Filename prefix shared by the endpoints.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Path of the endpoint owned by the named component.
    #[must_use]
    pub fn endpoint_path(&self, component: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}{component}", self.prefix))
    }

    /// Ensures the socket directory exists, creating it with restrictive
    /// permissions when it is missing.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        if self.dir.as_str().is_empty() {
            return Err(SocketPreparationError::EmptyDirectory);
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(self.dir.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: self.dir.clone(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketLayout {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "unix://{}/{}*", self.dir, self.prefix)
    }
}

/// Errors raised when preparing the socket directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The configured directory was empty.
    #[error("socket directory must not be empty")]
    EmptyDirectory,
    /// Failed to create the socket directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths_follow_prefix_convention() {
        let layout = SocketLayout::new("/tmp", "fifo_socket_");
        assert_eq!(
            layout.endpoint_path("coms_handler"),
            Utf8PathBuf::from("/tmp/fifo_socket_coms_handler")
        );
    }

    #[test]
    fn display_shows_endpoint_pattern() {
        let layout = SocketLayout::new("/run/courier", "ep_");
        assert_eq!(layout.to_string(), "unix:///run/courier/ep_*");
    }

    #[test]
    fn prepare_creates_missing_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().join("nested").join("sockets");
        let dir = Utf8PathBuf::from_path_buf(dir).expect("utf8 temp path");
        let layout = SocketLayout::new(dir.clone(), "fifo_socket_");

        layout.prepare_filesystem().expect("directory should be created");
        assert!(dir.is_dir());
        layout
            .prepare_filesystem()
            .expect("preparing twice should be harmless");
    }

    #[test]
    fn prepare_rejects_empty_directory() {
        let layout = SocketLayout::new("", "fifo_socket_");
        assert!(matches!(
            layout.prepare_filesystem(),
            Err(SocketPreparationError::EmptyDirectory)
        ));
    }
}
