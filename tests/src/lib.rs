//! Rigging integration tests

pub mod common;

#[cfg(test)]
mod local_tests;
#[cfg(test)]
mod pipeline_tests;
