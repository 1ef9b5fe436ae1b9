//! Consolidated test modules.
//!
//! Scenario-level coverage of the step protocol and the HTTP surface,
//! driven against in-memory stores.

pub mod support;

mod api;
