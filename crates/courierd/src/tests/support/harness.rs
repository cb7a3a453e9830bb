//! Drives a real dispatcher over sockets in a temporary directory.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use courier_config::{Config, DEFAULT_SOCKET_PREFIX};

use super::{HealthEvent, RecordingHealthReporter};
use crate::bootstrap::bootstrap_with;
use crate::dispatch::{Dispatcher, LoopState, ShutdownReport};
use crate::message::{MESSAGE_UNIT_SIZE, MessageHeader};
use crate::registry::{ComponentKind, ComponentSpec};

/// Poll timeout used by harness dispatchers; short so idle turns stay cheap.
pub const TEST_POLL_TIMEOUT_MS: u64 = 20;

/// Upper bound on turns spent waiting for a condition.
pub const MAX_TURNS: usize = 100;

const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// The component set used by most scenarios, in registry order.
pub const TEST_COMPONENTS: &[ComponentSpec] = &[
    ComponentSpec::new("coms_handler", ComponentKind::Coms),
    ComponentSpec::new("eps_handler", ComponentKind::Eps),
    ComponentSpec::new("shell_handler", ComponentKind::Shell),
    ComponentSpec::new("test_handler", ComponentKind::Test),
];

/// Owns a temporary socket directory and the dispatcher serving it.
pub struct Harness {
    dir: TempDir,
    pub reporter: Arc<RecordingHealthReporter>,
    dispatcher: Option<Dispatcher>,
    report: Option<ShutdownReport>,
}

impl Harness {
    /// Boots a dispatcher serving `components`.
    pub fn start(components: &[ComponentSpec]) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let reporter = Arc::new(RecordingHealthReporter::default());
        let config = Self::config_for(&dir);
        let dispatcher = bootstrap_with(&config, components, reporter.clone()).expect("bootstrap");
        Self {
            dir,
            reporter,
            dispatcher: Some(dispatcher),
            report: None,
        }
    }

    /// Configuration pointing every endpoint into `dir`.
    pub fn config_for(dir: &TempDir) -> Config {
        let socket_dir =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        Config {
            socket_dir,
            poll_timeout_ms: TEST_POLL_TIMEOUT_MS,
            log_filter: "courierd=debug".to_owned(),
            ..Config::default()
        }
    }

    /// Endpoint path for the named component.
    pub fn endpoint(&self, name: &str) -> Utf8PathBuf {
        let dir = Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf8 temp dir");
        dir.join(format!("{DEFAULT_SOCKET_PREFIX}{name}"))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.dispatcher.as_ref().expect("dispatcher already shut down")
    }

    /// Opens a client connection without waiting for it to be accepted.
    pub fn dial(&self, name: &str) -> UnixStream {
        let stream = UnixStream::connect(self.endpoint(name)).expect("connect client");
        stream
            .set_read_timeout(Some(CLIENT_READ_TIMEOUT))
            .expect("set read timeout");
        stream
    }

    /// Connects a client and turns the loop until its slot is connected.
    pub fn connect(&mut self, name: &str) -> UnixStream {
        let stream = self.dial(name);
        assert!(
            self.pump_until(|dispatcher| slot_connected(dispatcher, name)),
            "{name} was never accepted"
        );
        stream
    }

    /// Runs a single loop iteration.
    pub fn turn(&mut self) -> LoopState {
        let dispatcher = self.dispatcher.as_mut().expect("dispatcher already shut down");
        dispatcher.turn().expect("dispatch turn")
    }

    /// Turns the loop until `condition` holds or the dispatcher stops.
    pub fn pump_until(&mut self, condition: impl Fn(&Dispatcher) -> bool) -> bool {
        for _ in 0..MAX_TURNS {
            if condition(self.dispatcher()) {
                return true;
            }
            if self.turn() == LoopState::ShuttingDown {
                return condition(self.dispatcher());
            }
        }
        condition(self.dispatcher())
    }

    /// Turns the loop until `expected` routing events have been recorded.
    pub fn pump_until_routed(&mut self, expected: usize) -> bool {
        self.pump_until_recorded(expected, HealthEvent::is_routing)
    }

    /// Turns the loop until `expected` events matching `predicate` exist.
    pub fn pump_until_recorded(
        &mut self,
        expected: usize,
        predicate: impl Fn(&HealthEvent) -> bool,
    ) -> bool {
        let reporter = Arc::clone(&self.reporter);
        self.pump_until(move |_| reporter.count(&predicate) >= expected)
    }

    /// Turns the loop until it enters shutdown, then tears it down.
    pub fn pump_until_shutdown(&mut self) -> Option<&ShutdownReport> {
        for _ in 0..MAX_TURNS {
            if self.turn() == LoopState::ShuttingDown {
                let dispatcher = self.dispatcher.take().expect("dispatcher present");
                self.report = Some(dispatcher.shutdown());
                break;
            }
        }
        self.report.as_ref()
    }

    pub fn is_shut_down(&self) -> bool {
        self.report.is_some()
    }
}

fn slot_connected(dispatcher: &Dispatcher, name: &str) -> bool {
    dispatcher
        .registry()
        .all_slots()
        .iter()
        .any(|slot| slot.name() == name && slot.is_connected())
}

/// Builds a full-width unit addressed to `destination`.
pub fn unit_for(destination: ComponentKind, source: ComponentKind, payload: &[u8]) -> Vec<u8> {
    let header = MessageHeader {
        msg_id: 0x0102,
        msg_type: 1,
        dest_id: destination.id(),
        source_id: source.id(),
        opcode: 7,
        msg_len: u16::try_from(payload.len()).expect("payload fits in a unit"),
    };
    let mut unit = vec![0_u8; MESSAGE_UNIT_SIZE];
    unit[..header.to_bytes().len()].copy_from_slice(&header.to_bytes());
    unit[header.to_bytes().len()..][..payload.len()].copy_from_slice(payload);
    unit
}

/// Writes `bytes` on the client side.
pub fn send(stream: &mut UnixStream, bytes: &[u8]) {
    stream.write_all(bytes).expect("client write");
}

/// Reads exactly `len` bytes, failing the test on timeout.
pub fn receive(stream: &mut UnixStream, len: usize) -> Vec<u8> {
    let mut received = vec![0_u8; len];
    stream.read_exact(&mut received).expect("client read");
    received
}

/// Returns `true` when nothing arrives before `wait` elapses.
pub fn receives_nothing(stream: &mut UnixStream, wait: Duration) -> bool {
    stream.set_read_timeout(Some(wait)).expect("set read timeout");
    let mut byte = [0_u8; 1];
    let quiet = match stream.read(&mut byte) {
        Err(error) => matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
        Ok(_) => false,
    };
    stream
        .set_read_timeout(Some(CLIENT_READ_TIMEOUT))
        .expect("restore read timeout");
    quiet
}

/// Returns `true` when the peer has closed the connection.
pub fn sees_end_of_stream(stream: &mut UnixStream) -> bool {
    let mut byte = [0_u8; 1];
    matches!(stream.read(&mut byte), Ok(0))
}
