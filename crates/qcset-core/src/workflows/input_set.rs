use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::io::qcin::{self, QcInput, QcInputError, QcInputFile};
use crate::core::io::traits::TextFormat;
use crate::core::models::molecule::Molecule;
use crate::core::models::section::SectionCollection;
use crate::engine::builder::SettingsBuilder;
use crate::engine::config::{JobSpec, OverrideSet};
use crate::engine::error::{Advisory, SetError};

/// Name of the file holding custom SMD parameters, written next to the input.
pub const SOLVENT_DATA_FILE_NAME: &str = "solvent_data";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write input file {path:?}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: QcInputError,
    },
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A fully built Q-Chem input ready to be rendered or written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct QChemInputSet {
    molecule: Molecule,
    sections: SectionCollection,
    custom_smd: Option<String>,
    advisories: Vec<Advisory>,
}

impl QChemInputSet {
    /// Builds the input set for `spec`, merging `overrides` last.
    ///
    /// # Errors
    ///
    /// Returns the first [`SetError`] raised while deriving or merging sections.
    pub fn new(spec: &JobSpec, overrides: &OverrideSet) -> Result<Self, SetError> {
        let output = SettingsBuilder::new(spec).build(overrides)?;
        Ok(Self {
            molecule: spec.molecule.clone(),
            sections: output.sections,
            custom_smd: spec.solvation.custom_smd().map(str::to_string),
            advisories: output.advisories,
        })
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn sections(&self) -> &SectionCollection {
        &self.sections
    }

    /// Parameters of a user-defined SMD solvent, if one was requested.
    pub fn custom_smd(&self) -> Option<&str> {
        self.custom_smd.as_deref()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn to_qc_input(&self) -> QcInput {
        QcInput {
            molecule: self.molecule.clone(),
            sections: self.sections.clone(),
        }
    }

    pub fn render(&self) -> String {
        qcin::render(&self.to_qc_input())
    }

    /// Writes the input file and, for a custom SMD solvent, its `solvent_data`
    /// companion in the same directory.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteError> {
        let path = path.as_ref();
        QcInputFile::write_to_path(&self.to_qc_input(), path).map_err(|source| {
            WriteError::Input {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), "Wrote input file.");

        if let Some(parameters) = &self.custom_smd {
            let data_path = path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(SOLVENT_DATA_FILE_NAME);
            fs::write(&data_path, parameters).map_err(|source| WriteError::Io {
                path: data_path.clone(),
                source,
            })?;
            info!(path = %data_path.display(), "Wrote custom SMD parameters.");
        }
        Ok(())
    }
}
