use thiserror::Error;

use crate::core::models::section::{SectionName, UnknownSectionError};
use crate::core::utils::normalize::DuplicateKeyError;

/// Broad classes of configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InvalidParameter,
    ConflictingConfiguration,
    MissingDependency,
    DuplicateKey,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("DFT rung must be between 1 and 5 (got {0})")]
    InvalidDftRung(u8),

    #[error("CMIRS is not parameterized for solvent '{0}'")]
    UnsupportedCmirsSolvent(String),

    #[error("CMIRS is only parameterized for rhoiso values of 0.001 or 0.0005 (got '{0}')")]
    UnsupportedIsodensity(String),

    #[error("NBO version must be 7 (got {0})")]
    UnsupportedNboVersion(u32),

    #[error("A PES scan requires at least one scan variable")]
    MissingScanVariables,

    #[error("At most two scan variables are allowed (got {0})")]
    TooManyScanVariables(usize),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue { parameter: String, reason: String },

    #[error(transparent)]
    UnknownSection(#[from] UnknownSectionError),

    #[error("Only one solvation model may be used, found: {}", .0.join(", "))]
    ConflictingSolvation(Vec<&'static str>),

    #[error("New optimizer maxiter ({maxiter}) must equal geom_opt_max_cycles ({limit})")]
    OptimizerCycleMismatch { maxiter: u32, limit: u32 },

    #[error(
        "A user-defined SMD solvent requires seven comma-separated values: dielectric, \
         refractive index, acidity, basicity, surface tension, aromaticity, \
         electronegative halogenicity"
    )]
    MissingCustomSmd,

    #[error("Cannot override ${0}: the section was never enabled")]
    SectionNotEnabled(SectionName),

    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
}

impl SetError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SetError::InvalidDftRung(_)
            | SetError::UnsupportedCmirsSolvent(_)
            | SetError::UnsupportedIsodensity(_)
            | SetError::UnsupportedNboVersion(_)
            | SetError::MissingScanVariables
            | SetError::TooManyScanVariables(_)
            | SetError::InvalidValue { .. }
            | SetError::UnknownSection(_) => ErrorCategory::InvalidParameter,
            SetError::ConflictingSolvation(_) | SetError::OptimizerCycleMismatch { .. } => {
                ErrorCategory::ConflictingConfiguration
            }
            SetError::MissingParameter(_)
            | SetError::MissingCustomSmd
            | SetError::SectionNotEnabled(_) => ErrorCategory::MissingDependency,
            SetError::DuplicateKey(_) => ErrorCategory::DuplicateKey,
        }
    }
}

/// A non-fatal inconsistency detected while merging overrides.
///
/// Advisories never abort a build; they are returned with the result and
/// logged at `WARN` level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Advisory {
    #[error(
        "The $solvent section will be ignored unless solvent_method = pcm (currently {})",
        .solvent_method.as_deref().unwrap_or("unset")
    )]
    SolventSectionIgnored { solvent_method: Option<String> },

    #[error("Setting idefesr = 0 disables the requested CMIRS calculation")]
    CmirsDisabled,

    #[error("Setting idefesr = 1 has no effect unless a CMIRS solvent is chosen")]
    CmirsFlagWithoutSolvent,

    #[error(
        "Setting dielst has no effect unless solvent_method = isosvp (currently {})",
        .solvent_method.as_deref().unwrap_or("unset")
    )]
    DielectricIgnored { solvent_method: Option<String> },
}
