//! Unit tests for the agent-deploy CLI
//!
//! These tests use mocked ports and run fast without external I/O.

mod architecture;
mod chart_service;
mod compose_service;
mod normalize_service;
mod property_tests;
mod vm_service;
