//! Test suites for the dispatcher.

mod support;
