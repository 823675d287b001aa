use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::SetError;
use super::solvation::{SolvationModel, SolventSelectors};
use crate::core::models::molecule::Molecule;
use crate::core::models::section::{SectionName, SectionValue, VdwMode};
use crate::core::utils::normalize::lower_and_check_unique;

pub const DEFAULT_DFT_RUNG: u8 = 4;
pub const DEFAULT_MAX_SCF_CYCLES: u32 = 100;
pub const DEFAULT_GEOM_OPT_MAX_CYCLES: u32 = 200;

/// The kind of calculation, written as `job_type` in `$rem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "sp")]
    SinglePoint,
    #[serde(rename = "opt")]
    Optimization,
    #[serde(rename = "ts")]
    TransitionState,
    #[serde(rename = "force")]
    Force,
    #[serde(rename = "freq")]
    Frequency,
    #[serde(rename = "pes_scan")]
    PesScan,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::SinglePoint,
        JobType::Optimization,
        JobType::TransitionState,
        JobType::Force,
        JobType::Frequency,
        JobType::PesScan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::SinglePoint => "sp",
            JobType::Optimization => "opt",
            JobType::TransitionState => "ts",
            JobType::Force => "force",
            JobType::Frequency => "freq",
            JobType::PesScan => "pes_scan",
        }
    }

    /// Jobs that move the geometry and therefore need `geom_opt_max_cycles`.
    pub fn moves_geometry(self) -> bool {
        matches!(
            self,
            JobType::Optimization | JobType::TransitionState | JobType::PesScan
        )
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = SetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        JobType::ALL
            .into_iter()
            .find(|job| job.as_str() == wanted)
            .ok_or_else(|| SetError::InvalidValue {
                parameter: "job_type".to_string(),
                reason: format!("unknown job type '{}'", s),
            })
    }
}

/// Named blocks of lines, e.g. `stre` scan coordinates or `CONSTRAINT` blocks.
pub type VariableBlocks = IndexMap<String, Vec<String>>;

/// Natural bond orbital analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NboParams {
    /// Only version 7 (external NBO) is accepted when set.
    pub version: Option<u32>,
    /// Keywords copied verbatim into `$nbo`.
    pub options: IndexMap<String, String>,
}

impl NboParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from raw key/value pairs, pulling out `version`.
    pub fn from_options<K, V, I>(entries: I) -> Result<Self, SetError>
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut options =
            lower_and_check_unique(entries.into_iter().map(|(k, v)| (k, Into::<String>::into(v))))?;
        let version = options
            .shift_remove("version")
            .map(|raw| parse_count("nbo.version", &raw))
            .transpose()?;
        Ok(Self { version, options })
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.trim().to_lowercase(), value.to_string());
        self
    }

    /// Every version the caller asked for: the typed field and a raw
    /// `version` option, which is never copied into `$nbo`.
    pub fn requested_versions(&self) -> Result<Vec<u32>, SetError> {
        let raw = reserved_count(&self.options, "version", "nbo.version")?;
        Ok(self.version.into_iter().chain(raw).collect())
    }
}

/// Request for the new-generation geometry optimizer (`geom_opt2 = 3`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeomOptParams {
    /// Must equal the job's geometry cycle limit when given.
    pub maxiter: Option<u32>,
    /// Other `$geom_opt` keywords, copied verbatim.
    pub options: IndexMap<String, String>,
}

impl GeomOptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from raw key/value pairs, pulling out `maxiter`.
    pub fn from_options<K, V, I>(entries: I) -> Result<Self, SetError>
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut options =
            lower_and_check_unique(entries.into_iter().map(|(k, v)| (k, Into::<String>::into(v))))?;
        let maxiter = options
            .shift_remove("maxiter")
            .map(|raw| parse_count("geom_opt.maxiter", &raw))
            .transpose()?;
        Ok(Self { maxiter, options })
    }

    pub fn with_maxiter(mut self, maxiter: u32) -> Self {
        self.maxiter = Some(maxiter);
        self
    }

    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.trim().to_lowercase(), value.to_string());
        self
    }

    /// Every explicit `maxiter`: the typed field and a raw `maxiter` option.
    pub fn requested_maxiters(&self) -> Result<Vec<u32>, SetError> {
        let raw = reserved_count(&self.options, "maxiter", "geom_opt.maxiter")?;
        Ok(self.maxiter.into_iter().chain(raw).collect())
    }
}

fn reserved_count(
    options: &IndexMap<String, String>,
    key: &str,
    parameter: &str,
) -> Result<Option<u32>, SetError> {
    options
        .get(key)
        .map(|raw| parse_count(parameter, raw))
        .transpose()
}

fn parse_count(parameter: &str, raw: &str) -> Result<u32, SetError> {
    raw.trim().parse().map_err(|_| SetError::InvalidValue {
        parameter: parameter.to_string(),
        reason: format!("'{}' is not a non-negative integer", raw),
    })
}

/// Caller-supplied keywords that replace or extend the built sections.
///
/// Keys are kept as given; they are normalized (and checked for case-only
/// duplicates) when merged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverrideSet {
    sections: BTreeMap<SectionName, Vec<(String, SectionValue)>>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable form of [`OverrideSet::insert`].
    pub fn set(mut self, section: SectionName, key: &str, value: impl Into<SectionValue>) -> Self {
        self.insert(section, key, value);
        self
    }

    /// Adds a keyword. A key spelled exactly the same replaces the earlier value.
    pub fn insert(&mut self, section: SectionName, key: &str, value: impl Into<SectionValue>) {
        let entries = self.sections.entry(section).or_default();
        let value = value.into();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => entries.push((key.to_string(), value)),
        }
    }

    /// Adds a keyword to a section given by name or alias.
    pub fn insert_str(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<SectionValue>,
    ) -> Result<(), SetError> {
        let name: SectionName = section.parse()?;
        self.insert(name, key, value);
        Ok(())
    }

    /// Registers a section with no keywords; merging it still triggers the
    /// section's rules.
    pub fn touch(&mut self, section: SectionName) {
        self.sections.entry(section).or_default();
    }

    pub fn section(&self, section: SectionName) -> Option<&[(String, SectionValue)]> {
        self.sections.get(&section).map(Vec::as_slice)
    }

    pub fn contains(&self, section: SectionName) -> bool {
        self.sections.contains_key(&section)
    }

    /// Iterates overridden sections in file order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &[(String, SectionValue)])> {
        self.sections
            .iter()
            .map(|(name, entries)| (*name, entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Everything needed to build one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub molecule: Molecule,
    pub job_type: JobType,
    pub basis_set: String,
    pub scf_algorithm: String,
    pub dft_rung: u8,
    pub max_scf_cycles: u32,
    pub geom_opt_max_cycles: u32,
    pub solvation: SolvationModel,
    pub opt_variables: VariableBlocks,
    pub scan_variables: VariableBlocks,
    pub plot_cubes: bool,
    pub nbo: Option<NboParams>,
    pub new_geom_opt: Option<GeomOptParams>,
    pub vdw_mode: VdwMode,
    pub extra_scf_print: bool,
}

#[derive(Default)]
pub struct JobSpecBuilder {
    molecule: Option<Molecule>,
    job_type: Option<JobType>,
    basis_set: Option<String>,
    scf_algorithm: Option<String>,
    dft_rung: Option<u8>,
    max_scf_cycles: Option<u32>,
    geom_opt_max_cycles: Option<u32>,
    solvation: Option<SolvationModel>,
    selectors: Option<SolventSelectors>,
    opt_variables: VariableBlocks,
    scan_variables: VariableBlocks,
    plot_cubes: bool,
    nbo: Option<NboParams>,
    new_geom_opt: Option<GeomOptParams>,
    vdw_mode: Option<VdwMode>,
    extra_scf_print: bool,
}

impl JobSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn molecule(mut self, molecule: Molecule) -> Self {
        self.molecule = Some(molecule);
        self
    }
    pub fn job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }
    pub fn basis_set(mut self, basis_set: &str) -> Self {
        self.basis_set = Some(basis_set.to_string());
        self
    }
    pub fn scf_algorithm(mut self, algorithm: &str) -> Self {
        self.scf_algorithm = Some(algorithm.to_string());
        self
    }
    pub fn dft_rung(mut self, rung: u8) -> Self {
        self.dft_rung = Some(rung);
        self
    }
    pub fn max_scf_cycles(mut self, cycles: u32) -> Self {
        self.max_scf_cycles = Some(cycles);
        self
    }
    pub fn geom_opt_max_cycles(mut self, cycles: u32) -> Self {
        self.geom_opt_max_cycles = Some(cycles);
        self
    }
    /// Sets the solvation model directly.
    pub fn solvation(mut self, model: SolvationModel) -> Self {
        self.solvation = Some(model);
        self
    }
    /// Sets the solvation model from independent selectors, checked at `build`.
    pub fn solvent(mut self, selectors: SolventSelectors) -> Self {
        self.selectors = Some(selectors);
        self
    }
    pub fn opt_variables(mut self, variables: VariableBlocks) -> Self {
        self.opt_variables = variables;
        self
    }
    pub fn scan_variables(mut self, variables: VariableBlocks) -> Self {
        self.scan_variables = variables;
        self
    }
    pub fn plot_cubes(mut self, enabled: bool) -> Self {
        self.plot_cubes = enabled;
        self
    }
    pub fn nbo(mut self, params: NboParams) -> Self {
        self.nbo = Some(params);
        self
    }
    pub fn new_geom_opt(mut self, params: GeomOptParams) -> Self {
        self.new_geom_opt = Some(params);
        self
    }
    pub fn vdw_mode(mut self, mode: VdwMode) -> Self {
        self.vdw_mode = Some(mode);
        self
    }
    pub fn extra_scf_print(mut self, enabled: bool) -> Self {
        self.extra_scf_print = enabled;
        self
    }

    pub fn build(self) -> Result<JobSpec, SetError> {
        let solvation = match (self.solvation, self.selectors) {
            (Some(model), None) => {
                model.validate()?;
                model
            }
            (None, Some(selectors)) => selectors.into_model()?,
            (None, None) => SolvationModel::None,
            (Some(model), Some(selectors)) => {
                let from_selectors = selectors.into_model()?;
                match (model.solvent_method(), from_selectors.solvent_method()) {
                    (Some(_), Some(_)) => {
                        return Err(SetError::ConflictingSolvation(vec![
                            model_name(&model),
                            model_name(&from_selectors),
                        ]));
                    }
                    (Some(_), None) => {
                        model.validate()?;
                        model
                    }
                    _ => from_selectors,
                }
            }
        };

        Ok(JobSpec {
            molecule: self.molecule.ok_or(SetError::MissingParameter("molecule"))?,
            job_type: self.job_type.ok_or(SetError::MissingParameter("job_type"))?,
            basis_set: self
                .basis_set
                .ok_or(SetError::MissingParameter("basis_set"))?,
            scf_algorithm: self
                .scf_algorithm
                .ok_or(SetError::MissingParameter("scf_algorithm"))?,
            dft_rung: self.dft_rung.unwrap_or(DEFAULT_DFT_RUNG),
            max_scf_cycles: self.max_scf_cycles.unwrap_or(DEFAULT_MAX_SCF_CYCLES),
            geom_opt_max_cycles: self
                .geom_opt_max_cycles
                .unwrap_or(DEFAULT_GEOM_OPT_MAX_CYCLES),
            solvation,
            opt_variables: self.opt_variables,
            scan_variables: self.scan_variables,
            plot_cubes: self.plot_cubes,
            nbo: self.nbo,
            new_geom_opt: self.new_geom_opt,
            vdw_mode: self.vdw_mode.unwrap_or_default(),
            extra_scf_print: self.extra_scf_print,
        })
    }
}

fn model_name(model: &SolvationModel) -> &'static str {
    match model {
        SolvationModel::None => "none",
        SolvationModel::Pcm { .. } => "pcm",
        SolvationModel::Isosvp { .. } => "isosvp",
        SolvationModel::Smd { .. } => "smd",
        SolvationModel::Cmirs { .. } => "cmirs",
    }
}
