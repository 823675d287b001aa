//! Provides input/output functionality for the text formats handled by the library.
//!
//! [`qcin`] renders a molecule plus a [`SectionCollection`](crate::core::models::section::SectionCollection)
//! into the Q-Chem input syntax and parses it back. [`xyz`] reads and writes plain
//! Cartesian structures. Both implement the [`traits::TextFormat`] interface.

pub mod qcin;
pub mod traits;
pub mod xyz;
