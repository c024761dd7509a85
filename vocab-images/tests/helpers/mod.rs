//! Test Helper Utilities
//!
//! Counting mocks for every external component of the image pipeline, and
//! a tracing layer that records log lines.

#![allow(dead_code)]

pub mod log_capture;
pub mod mocks;

pub use log_capture::LogCapture;
pub use mocks::{
    candidate, pipeline_with, MockEvaluator, MockGenerator, MockProvider,
};
