//! # Workflows Module
//!
//! The public entry points of the library.
//!
//! - **Input sets** ([`input_set`]): a built [`QChemInputSet`](input_set::QChemInputSet)
//!   that renders the final `.qin` text and writes it, together with any
//!   custom-solvent side file, to disk.
//! - **Presets** ([`presets`]): six job types (single point, optimization,
//!   transition state, force, frequency, PES scan), each fixing the job type and
//!   sensible defaults before delegating to the settings builder.

pub mod input_set;
pub mod presets;
