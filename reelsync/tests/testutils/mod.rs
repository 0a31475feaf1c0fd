//! Test utilities for Reelsync integration tests
//!
//! - FakeRemote: deterministic remote catalog with scripted failures, a call log, and a gate
//! - TestFixture: catalog over the memory or sled driver with a manual clock

#![allow(dead_code)]

pub mod fake_remote;
pub mod test_fixture;
