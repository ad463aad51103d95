//! Tests for the executor
//!
//! Organized by feature area

mod branch_tests;
mod dispatch_tests;
mod helpers;
