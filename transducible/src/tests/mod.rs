//! Test module for transducible
//!
//! Topic suites over the transducer call paths, composition, batching,
//! self-test utilities, configuration and errors. Stub executors live in
//! `support`.

#[cfg(test)]
pub mod support;





#[cfg(test)]
pub mod config_tests;
