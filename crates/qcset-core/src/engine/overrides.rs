//! Per-section rules applied while caller overrides are merged.

use tracing::{debug, warn};

use super::error::{Advisory, SetError};
use super::tables::CmirsParameters;
use crate::core::models::section::{Section, SectionCollection, SectionName};

/// State shared by the hooks of one merge pass.
pub(crate) struct MergeState {
    pub cmirs: Option<&'static CmirsParameters>,
    pub advisories: Vec<Advisory>,
    pub read_custom_radii: bool,
}

impl MergeState {
    pub fn new(cmirs: Option<&'static CmirsParameters>) -> Self {
        Self {
            cmirs,
            advisories: Vec::new(),
            read_custom_radii: false,
        }
    }

    fn advise(&mut self, advisory: Advisory) {
        warn!("{}", advisory);
        self.advisories.push(advisory);
    }
}

/// Runs on the normalized incoming keywords, before they are merged.
type Hook = fn(&Section, &mut SectionCollection, &mut MergeState) -> Result<(), SetError>;

pub(crate) struct Route {
    /// The section must already have been produced by the build.
    pub requires_enabled: bool,
    pub hook: Option<Hook>,
}

pub(crate) fn route(name: SectionName) -> Route {
    match name {
        SectionName::Nbo | SectionName::GeomOpt => Route {
            requires_enabled: true,
            hook: None,
        },
        SectionName::Solvent => Route {
            requires_enabled: false,
            hook: Some(check_solvent),
        },
        SectionName::VanDerWaals => Route {
            requires_enabled: false,
            hook: Some(request_custom_radii),
        },
        SectionName::Svp => Route {
            requires_enabled: false,
            hook: Some(check_svp),
        },
        SectionName::Rem
        | SectionName::Opt
        | SectionName::Pcm
        | SectionName::Smx
        | SectionName::Scan
        | SectionName::Plots
        | SectionName::PcmNonels => Route {
            requires_enabled: false,
            hook: None,
        },
    }
}

fn solvent_method(sections: &SectionCollection) -> Option<String> {
    sections
        .text(SectionName::Rem, "solvent_method")
        .map(str::to_lowercase)
}

fn check_solvent(
    _incoming: &Section,
    sections: &mut SectionCollection,
    state: &mut MergeState,
) -> Result<(), SetError> {
    let method = solvent_method(sections);
    if method.as_deref() != Some("pcm") {
        state.advise(Advisory::SolventSectionIgnored {
            solvent_method: method,
        });
    }
    Ok(())
}

fn request_custom_radii(
    _incoming: &Section,
    _sections: &mut SectionCollection,
    state: &mut MergeState,
) -> Result<(), SetError> {
    state.read_custom_radii = true;
    Ok(())
}

fn check_svp(
    incoming: &Section,
    sections: &mut SectionCollection,
    state: &mut MergeState,
) -> Result<(), SetError> {
    for (key, value) in incoming.iter() {
        let Some(value) = value.as_text() else {
            continue;
        };
        let value = value.trim();
        match key {
            "rhoiso" => {
                if let Some(parameters) = state.cmirs {
                    let coefficients = parameters.coefficients(value)?;
                    // Terms without a tabulated value keep whatever they held.
                    if let Some(nonels) = sections.get_mut(SectionName::PcmNonels) {
                        let present: Vec<String> = nonels.keys().map(str::to_string).collect();
                        for key in present {
                            if let Some(updated) = coefficients.get(&key) {
                                nonels.insert(&key, updated);
                            }
                        }
                    }
                    debug!(rhoiso = value, "Re-selected CMIRS coefficients");
                }
            }
            "idefesr" => match (state.cmirs.is_some(), value) {
                (true, "0") => state.advise(Advisory::CmirsDisabled),
                (false, "1") => state.advise(Advisory::CmirsFlagWithoutSolvent),
                _ => {}
            },
            "dielst" => {
                let method = solvent_method(sections);
                if method.as_deref() != Some("isosvp") {
                    state.advise(Advisory::DielectricIgnored {
                        solvent_method: method,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}
