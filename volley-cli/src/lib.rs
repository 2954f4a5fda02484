//! The `volley` command line runner and its bundled benchmark suites.
pub mod benchmarks;
pub mod cli;
pub mod logging;
pub mod push;
