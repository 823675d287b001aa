//! # Core Module
//!
//! Fundamental building blocks shared by the settings engine and the workflows.
//!
//! - **Data Models** ([`models`]) - The molecule passed through to the input file and the
//!   ordered keyword sections that make up a Q-Chem input
//! - **File I/O** ([`io`]) - Rendering and parsing of `.qin` input files and `.xyz` structures
//! - **Utilities** ([`utils`]) - Case-insensitive keyword normalization

pub mod io;
pub mod models;
pub mod utils;
