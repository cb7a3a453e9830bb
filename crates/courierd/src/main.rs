use std::io::{self, Write};
use std::process::ExitCode;

use courier_config::Config;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => return config_failure(&error),
    };

    match courierd::run_dispatcher(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            if courierd::telemetry_initialised() {
                tracing::error!(target: "courierd", error = %error, "dispatcher exited");
            } else {
                let _ = writeln!(io::stderr(), "courierd: {error}");
            }
            ExitCode::FAILURE
        }
    }
}

fn config_failure(error: &courier_config::ConfigError) -> ExitCode {
    if let courier_config::ConfigError::Arguments {
        message,
        informational: true,
    } = error
    {
        let _ = write!(io::stdout(), "{message}");
        return ExitCode::SUCCESS;
    }
    let _ = writeln!(io::stderr(), "courierd: {error}");
    ExitCode::FAILURE
}
