//! A single component slot and its connection state.

use std::fmt;
use std::io::{self, Read};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;

use camino::Utf8Path;

use super::{AcceptError, ComponentKind, ReadError};
use crate::transport::EndpointListener;

/// Connection state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Waiting for the component to connect.
    Listening,
    /// A component is connected and its connection is polled for units.
    Connected,
}

impl fmt::Display for SlotState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Listening => "listening",
            Self::Connected => "connected",
        })
    }
}

/// Result of servicing a readable listening endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcceptOutcome {
    /// A peer was accepted and the slot is now connected.
    Connected,
    /// Readiness was spurious; nothing was waiting.
    NothingPending,
    /// The slot already holds a connection; the listener was left alone.
    AlreadyConnected,
}

/// Registry entry for one component: its endpoint and at most one peer.
pub struct Slot {
    kind: ComponentKind,
    name: String,
    listener: EndpointListener,
    connection: Option<UnixStream>,
}

impl Slot {
    pub(crate) fn new(kind: ComponentKind, name: String, listener: EndpointListener) -> Self {
        Self {
            kind,
            name,
            listener,
            connection: None,
        }
    }

    /// Identity matched against destination bytes.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Human-readable component name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Filesystem path of the listening endpoint.
    #[must_use]
    pub fn endpoint_path(&self) -> &Utf8Path {
        self.listener.path()
    }

    #[must_use]
    pub fn state(&self) -> SlotState {
        if self.connection.is_some() {
            SlotState::Connected
        } else {
            SlotState::Listening
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Handle the multiplexer should watch: the peer connection while one is
    /// held, the listening endpoint otherwise.
    pub(crate) fn pollable(&self) -> BorrowedFd<'_> {
        match &self.connection {
            Some(stream) => stream.as_fd(),
            None => self.listener.as_fd(),
        }
    }

    pub(crate) fn accept(&mut self) -> Result<AcceptOutcome, AcceptError> {
        if self.connection.is_some() {
            return Ok(AcceptOutcome::AlreadyConnected);
        }
        match self.listener.accept() {
            Ok(Some(stream)) => {
                self.connection = Some(stream);
                Ok(AcceptOutcome::Connected)
            }
            Ok(None) => Ok(AcceptOutcome::NothingPending),
            Err(source) => Err(AcceptError {
                name: self.name.clone(),
                source,
            }),
        }
    }

    /// Performs a single read from the peer. `Ok(Some(0))` means the peer
    /// closed, or that no peer is connected. `Ok(None)` means the readiness
    /// was spurious and nothing could be read.
    pub(crate) fn read_unit(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, ReadError> {
        let Some(stream) = self.connection.as_mut() else {
            return Ok(Some(0));
        };
        loop {
            match stream.read(buffer) {
                Ok(read) => return Ok(Some(read)),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(source) => {
                    return Err(ReadError {
                        name: self.name.clone(),
                        source,
                    });
                }
            }
        }
    }

    pub(crate) fn connection_mut(&mut self) -> Option<&mut UnixStream> {
        self.connection.as_mut()
    }

    /// Drops the peer connection, returning the slot to listening. Returns
    /// whether a connection was actually held.
    pub(crate) fn release_connection(&mut self) -> bool {
        self.connection.take().is_some()
    }

    #[cfg(test)]
    pub(crate) fn listener_fd(&self) -> std::os::fd::RawFd {
        use std::os::fd::AsRawFd;
        self.listener.as_fd().as_raw_fd()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Slot")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("endpoint", &self.listener.path())
            .field("state", &self.state())
            .finish()
    }
}
