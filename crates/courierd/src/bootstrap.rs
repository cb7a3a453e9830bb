//! Dispatcher bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;

use courier_config::{Config, SocketPreparationError};

use crate::dispatch::{DispatchError, Dispatcher, ShutdownReport};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::registry::{ComponentSpec, DEFAULT_COMPONENTS, Registry, RegistryError};
use crate::telemetry::{self, TelemetryError};

/// Errors surfaced during bootstrap. Every variant is fatal.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// Socket directory preparation failed.
    #[error("failed to prepare socket directory: {source}")]
    Socket {
        #[source]
        source: SocketPreparationError,
    },
    /// A component endpoint could not be created.
    #[error("failed to build component registry: {source}")]
    Registry {
        #[source]
        source: RegistryError,
    },
    /// No component was supplied, so no unit could ever arrive.
    #[error("no components to serve")]
    NoComponents,
    /// The dispatch context could not be allocated.
    #[error("failed to build dispatch context: {source}")]
    Dispatch {
        #[source]
        source: DispatchError,
    },
}

/// Errors that end a dispatcher run with a failure status.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Bootstraps a dispatcher serving `components` using the supplied reporter.
pub fn bootstrap_with(
    config: &Config,
    components: &[ComponentSpec],
    reporter: Arc<dyn HealthReporter>,
) -> Result<Dispatcher, BootstrapError> {
    reporter.bootstrap_starting();
    match build(config, components, Arc::clone(&reporter)) {
        Ok(dispatcher) => {
            reporter.bootstrap_succeeded(config, dispatcher.registry());
            Ok(dispatcher)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn build(
    config: &Config,
    components: &[ComponentSpec],
    reporter: Arc<dyn HealthReporter>,
) -> Result<Dispatcher, BootstrapError> {
    telemetry::initialise(config).map_err(|source| BootstrapError::Telemetry { source })?;

    let layout = config.socket_layout();
    layout
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    let registry = Registry::with_components(layout, components)
        .map_err(|source| BootstrapError::Registry { source })?;
    if registry.is_empty() {
        return Err(BootstrapError::NoComponents);
    }

    Dispatcher::new(registry, config.poll_timeout(), reporter)
        .map_err(|source| BootstrapError::Dispatch { source })
}

/// Serves the flight component set until a slot sends `DOWN`.
pub fn run_dispatcher(config: &Config) -> Result<ShutdownReport, RunError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let dispatcher = bootstrap_with(config, DEFAULT_COMPONENTS, reporter)?;
    Ok(dispatcher.run()?)
}
