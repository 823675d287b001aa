//! # qcset Core Library
//!
//! Builds validated input sets for Q-Chem calculations from a small number of
//! high-level job parameters (job type, basis set, DFT rung, solvation model,
//! optimizer options) and renders them to the program's `$section` input syntax.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Section`,
//!   `SectionCollection`), keyword normalization, and text I/O for `.qin` input
//!   files and `.xyz` structures.
//!
//! - **[`engine`]: The Logic Core.** The `JobSpec` description of a job and the
//!   `SettingsBuilder` that merges defaults, derived solvation/NBO/optimizer
//!   settings, and caller overrides into one consistent `SectionCollection`,
//!   enforcing every cross-parameter rule along the way.
//!
//! - **[`workflows`]: The Public API.** Job presets (single point, optimization,
//!   transition state, force, frequency, PES scan) and the `QChemInputSet` that
//!   renders and writes the final input files.

pub mod core;
pub mod engine;
pub mod workflows;
