//! Test module for atype
//!
//! Property-based tests for the schema algebra laws, plus rendering checks.


#[cfg(test)]
pub mod rendering_tests;
