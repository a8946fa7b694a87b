//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, cloud
//! lookups, filesystem access, configuration loading and embedded assets.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod assets;
pub mod aws;
pub mod command_runner;
pub mod config;
pub mod fs;
