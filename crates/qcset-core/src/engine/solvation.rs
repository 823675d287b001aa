use tracing::debug;

use super::error::SetError;
use super::tables::{self, DEFAULT_RHOISO};
use crate::core::models::section::{SectionCollection, SectionName};

const PCM_DEFAULTS: [(&str, &str); 5] = [
    ("heavypoints", "194"),
    ("hpoints", "194"),
    ("radii", "uff"),
    ("theory", "cpcm"),
    ("vdwscale", "1.1"),
];

const SVP_DEFAULTS: [(&str, &str); 4] = [
    ("rhoiso", DEFAULT_RHOISO),
    ("nptleb", "1202"),
    ("itrngr", "2"),
    ("irotgr", "2"),
];

const CMIRS_INTEGRATION: [(&str, &str); 2] = [("delta", "7"), ("gaulag_n", "40")];

const CUSTOM_SMD_FIELDS: usize = 7;

/// The implicit solvation model of a job. At most one model is ever active.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SolvationModel {
    #[default]
    None,
    /// C-PCM with the given dielectric constant.
    Pcm { dielectric: f64 },
    /// Isodensity SS(V)PE with the given dielectric constant.
    Isosvp { dielectric: f64 },
    /// SMD with a named solvent, or `custom`/`other` plus seven parameters.
    Smd {
        solvent: String,
        custom_parameters: Option<String>,
    },
    /// CMIRS for one of the tabulated solvents.
    Cmirs { solvent: String },
}

/// The four independent solvent selectors a caller may set.
///
/// Mirrors how jobs are described on the command line and in job files, where
/// each model has its own optional field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolventSelectors {
    pub pcm_dielectric: Option<f64>,
    pub isosvp_dielectric: Option<f64>,
    pub smd_solvent: Option<String>,
    pub custom_smd: Option<String>,
    pub cmirs_solvent: Option<String>,
}

impl SolventSelectors {
    /// Collapses the selectors into a single model.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::ConflictingSolvation`] if more than one selector is set,
    /// or any error from [`SolvationModel::validate`].
    pub fn into_model(self) -> Result<SolvationModel, SetError> {
        let active: Vec<&'static str> = [
            ("pcm", self.pcm_dielectric.is_some()),
            ("isosvp", self.isosvp_dielectric.is_some()),
            ("smd", self.smd_solvent.is_some()),
            ("cmirs", self.cmirs_solvent.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        if active.len() > 1 {
            return Err(SetError::ConflictingSolvation(active));
        }

        let model = if let Some(dielectric) = self.pcm_dielectric {
            SolvationModel::Pcm { dielectric }
        } else if let Some(dielectric) = self.isosvp_dielectric {
            SolvationModel::Isosvp { dielectric }
        } else if let Some(solvent) = self.smd_solvent {
            SolvationModel::Smd {
                solvent,
                custom_parameters: self.custom_smd,
            }
        } else if let Some(solvent) = self.cmirs_solvent {
            SolvationModel::Cmirs { solvent }
        } else {
            SolvationModel::None
        };
        model.validate()?;
        Ok(model)
    }
}

/// True for the SMD solvent names that request user-supplied parameters.
pub fn is_custom_smd_solvent(solvent: &str) -> bool {
    let solvent = solvent.trim();
    solvent.eq_ignore_ascii_case("custom") || solvent.eq_ignore_ascii_case("other")
}

impl SolvationModel {
    /// The `solvent_method` keyword this model writes, if any.
    pub fn solvent_method(&self) -> Option<&'static str> {
        match self {
            SolvationModel::None => None,
            SolvationModel::Pcm { .. } => Some("pcm"),
            SolvationModel::Isosvp { .. } | SolvationModel::Cmirs { .. } => Some("isosvp"),
            SolvationModel::Smd { .. } => Some("smd"),
        }
    }

    pub fn cmirs_solvent(&self) -> Option<&str> {
        match self {
            SolvationModel::Cmirs { solvent } => Some(solvent.as_str()),
            _ => None,
        }
    }

    /// The seven-value parameter string of a user-defined SMD solvent.
    pub fn custom_smd(&self) -> Option<&str> {
        match self {
            SolvationModel::Smd {
                solvent,
                custom_parameters: Some(parameters),
            } if is_custom_smd_solvent(solvent) => Some(parameters.as_str()),
            _ => None,
        }
    }

    /// Checks the model's own parameters without touching any section.
    pub fn validate(&self) -> Result<(), SetError> {
        match self {
            SolvationModel::None => Ok(()),
            SolvationModel::Pcm { dielectric } => check_dielectric("pcm_dielectric", *dielectric),
            SolvationModel::Isosvp { dielectric } => {
                check_dielectric("isosvp_dielectric", *dielectric)
            }
            SolvationModel::Smd {
                solvent,
                custom_parameters,
            } => {
                if solvent.trim().is_empty() {
                    return Err(SetError::InvalidValue {
                        parameter: "smd_solvent".to_string(),
                        reason: "solvent name is empty".to_string(),
                    });
                }
                if is_custom_smd_solvent(solvent) {
                    let parameters = custom_parameters.as_deref().ok_or(SetError::MissingCustomSmd)?;
                    check_custom_smd(parameters)?;
                }
                Ok(())
            }
            SolvationModel::Cmirs { solvent } => tables::cmirs_parameters(solvent).map(|_| ()),
        }
    }

    /// Writes the model's sections and primary keywords into `sections`.
    pub fn apply(&self, sections: &mut SectionCollection) -> Result<(), SetError> {
        self.validate()?;
        match self {
            SolvationModel::None => {}
            SolvationModel::Pcm { dielectric } => {
                let pcm = sections.section_mut(SectionName::Pcm);
                for (key, value) in PCM_DEFAULTS {
                    pcm.insert(key, value);
                }
                sections
                    .section_mut(SectionName::Solvent)
                    .insert("dielectric", format_dielectric(*dielectric));
                sections.section_mut(SectionName::Rem).insert("solvent_method", "pcm");
            }
            SolvationModel::Isosvp { dielectric } => {
                apply_svp_defaults(sections, &format_dielectric(*dielectric));
            }
            SolvationModel::Smd { solvent, .. } => {
                let smx_solvent = if is_custom_smd_solvent(solvent) {
                    "other".to_string()
                } else {
                    solvent.trim().to_string()
                };
                sections
                    .section_mut(SectionName::Smx)
                    .insert("solvent", smx_solvent);
                let rem = sections.section_mut(SectionName::Rem);
                rem.insert("solvent_method", "smd");
                rem.insert("ideriv", "1");
            }
            SolvationModel::Cmirs { solvent } => {
                let parameters = tables::cmirs_parameters(solvent)?;
                apply_svp_defaults(sections, parameters.dielectric);
                let svp = sections.section_mut(SectionName::Svp);
                svp.insert("idefesr", "1");
                svp.insert("ipnrf", "1");

                let nonels = sections.section_mut(SectionName::PcmNonels);
                for (key, value) in parameters.coefficients(DEFAULT_RHOISO)?.entries() {
                    nonels.insert(key, value);
                }
                for (key, value) in CMIRS_INTEGRATION {
                    nonels.insert(key, value);
                }
            }
        }
        debug!(solvent_method = ?self.solvent_method(), "Applied solvation model");
        Ok(())
    }
}

fn apply_svp_defaults(sections: &mut SectionCollection, dielectric: &str) {
    let svp = sections.section_mut(SectionName::Svp);
    for (key, value) in SVP_DEFAULTS {
        svp.insert(key, value);
    }
    svp.insert("dielst", dielectric);
    let rem = sections.section_mut(SectionName::Rem);
    rem.insert("solvent_method", "isosvp");
    rem.insert("gen_scfman", "false");
}

// Debug formatting always keeps a decimal point ("80.0", "78.39").
fn format_dielectric(value: f64) -> String {
    format!("{:?}", value)
}

fn check_dielectric(parameter: &str, value: f64) -> Result<(), SetError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SetError::InvalidValue {
            parameter: parameter.to_string(),
            reason: format!("dielectric constant must be positive (got {})", value),
        })
    }
}

fn check_custom_smd(parameters: &str) -> Result<(), SetError> {
    let fields: Vec<&str> = parameters.split(',').map(str::trim).collect();
    if fields.len() != CUSTOM_SMD_FIELDS {
        return Err(SetError::InvalidValue {
            parameter: "custom_smd".to_string(),
            reason: format!(
                "expected {} comma-separated values, found {}",
                CUSTOM_SMD_FIELDS,
                fields.len()
            ),
        });
    }
    if let Some(bad) = fields.iter().find(|f| f.parse::<f64>().is_err()) {
        return Err(SetError::InvalidValue {
            parameter: "custom_smd".to_string(),
            reason: format!("'{}' is not a number", bad),
        });
    }
    Ok(())
}
