//! The settings engine: job descriptions, solvation models, static lookup
//! tables, and the [`builder::SettingsBuilder`] that merges them with caller
//! overrides into a validated set of input sections.

pub mod builder;
pub mod config;
pub mod error;
mod overrides;
pub mod solvation;
pub mod tables;
