//! Integration tests for the agent-deploy CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reach a cloud API.

mod chart_command;
mod cli_tests;
mod config_command;
mod normalize_command;
mod render_command;
