use qcset::core::models::molecule::MoleculeError;
use qcset::engine::error::SetError;
use qcset::workflows::input_set::WriteError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid job settings ({category:?}): {source}", category = source.category())]
    Settings {
        #[from]
        source: SetError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Invalid molecule '{path}': {source}", path = path.display())]
    Molecule {
        path: PathBuf,
        #[source]
        source: MoleculeError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
