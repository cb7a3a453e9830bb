//! Shared harness for the dispatcher behavioural suites.

mod harness;
mod reporter;

pub use harness::{
    Harness, TEST_COMPONENTS, receive, receives_nothing, sees_end_of_stream, send, unit_for,
};
pub use reporter::{HealthEvent, RecordingHealthReporter};
