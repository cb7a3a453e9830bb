//! Listening endpoint owned by a single component slot.

use std::fs;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::{ListenerError, TRANSPORT_TARGET};

/// Unix listener bound to a component endpoint.
///
/// The socket file is removed when the endpoint is dropped.
#[derive(Debug)]
pub(crate) struct EndpointListener {
    path: Utf8PathBuf,
    listener: UnixListener,
}

impl EndpointListener {
    /// Binds the endpoint, replacing a stale socket file left by an earlier
    /// run. The listener is non-blocking so a spurious wake-up cannot stall
    /// the dispatch loop inside `accept`.
    pub(crate) fn bind(path: &Utf8Path) -> Result<Self, ListenerError> {
        let listener = bind_unix(path.as_std_path())?;
        if let Err(source) = listener.set_nonblocking(true) {
            remove_socket_file(path);
            return Err(ListenerError::NonBlocking {
                path: path.to_string(),
                source,
            });
        }
        debug!(target: TRANSPORT_TARGET, path = %path, "endpoint listening");
        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Accepts one pending peer. `Ok(None)` means nothing was actually
    /// waiting. The accepted stream is non-blocking: a peer that stops
    /// draining its socket must fail the write rather than hold the loop.
    pub(crate) fn accept(&self) -> io::Result<Option<UnixStream>> {
        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    stream.set_nonblocking(true)?;
                    return Ok(Some(stream));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(error) => return Err(error),
            }
        }
    }
}

impl AsFd for EndpointListener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.listener.as_fd()
    }
}

impl Drop for EndpointListener {
    fn drop(&mut self) {
        remove_socket_file(&self.path);
    }
}

fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata =
            fs::symlink_metadata(path).map_err(|source| ListenerError::UnixMetadata {
                path: path.display().to_string(),
                source,
            })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket {
                path: path.display().to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::UnixInUse {
                    path: path.display().to_string(),
                });
            }
            Err(error)
                if error.kind() == io::ErrorKind::ConnectionRefused
                    || error.kind() == io::ErrorKind::NotFound =>
            {
                fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            Err(error) => {
                return Err(ListenerError::UnixConnect {
                    path: path.display().to_string(),
                    source: error,
                });
            }
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

fn remove_socket_file(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
