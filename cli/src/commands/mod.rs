//! Command implementations

pub mod chart;
pub mod config;
pub mod normalize;
pub mod render;
pub mod version;
pub mod vm;
