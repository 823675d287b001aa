use crate::cli::{SolventArgs, WriteArgs};
use crate::error::{CliError, Result};
use qcset::core::models::section::{SectionName, SectionValue, VdwMode};
use qcset::core::utils::normalize::{DuplicateKeyError, normalize_key};
use qcset::engine::config::{GeomOptParams, JobType, NboParams, OverrideSet, VariableBlocks};
use qcset::engine::error::SetError;
use qcset::engine::solvation::SolventSelectors;
use qcset::workflows::presets::PresetOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialJobSection {
    #[serde(rename = "job-type")]
    job_type: Option<JobType>,
    #[serde(rename = "basis-set")]
    basis_set: Option<String>,
    #[serde(rename = "scf-algorithm")]
    scf_algorithm: Option<String>,
    #[serde(rename = "dft-rung")]
    dft_rung: Option<u8>,
    #[serde(rename = "max-scf-cycles")]
    max_scf_cycles: Option<u32>,
    #[serde(rename = "geom-opt-max-cycles")]
    geom_opt_max_cycles: Option<u32>,
    #[serde(rename = "plot-cubes")]
    plot_cubes: Option<bool>,
    #[serde(rename = "extra-scf-print")]
    extra_scf_print: Option<bool>,
    #[serde(rename = "vdw-mode")]
    vdw_mode: Option<VdwMode>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMoleculeConfig {
    charge: Option<i32>,
    multiplicity: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialSolventConfig {
    #[serde(rename = "pcm-dielectric")]
    pcm_dielectric: Option<f64>,
    #[serde(rename = "isosvp-dielectric")]
    isosvp_dielectric: Option<f64>,
    #[serde(rename = "smd-solvent")]
    smd_solvent: Option<String>,
    #[serde(rename = "custom-smd")]
    custom_smd: Option<String>,
    #[serde(rename = "cmirs-solvent")]
    cmirs_solvent: Option<String>,
}

impl From<PartialSolventConfig> for SolventSelectors {
    fn from(p: PartialSolventConfig) -> Self {
        Self {
            pcm_dielectric: p.pcm_dielectric,
            isosvp_dielectric: p.isosvp_dielectric,
            smd_solvent: p.smd_solvent,
            custom_smd: p.custom_smd,
            cmirs_solvent: p.cmirs_solvent,
        }
    }
}

impl From<SolventArgs> for SolventSelectors {
    fn from(args: SolventArgs) -> Self {
        Self {
            pcm_dielectric: args.pcm_dielectric,
            isosvp_dielectric: args.isosvp_dielectric,
            smd_solvent: args.smd_solvent,
            custom_smd: args.custom_smd,
            cmirs_solvent: args.cmirs_solvent,
        }
    }
}

/// A job description as read from TOML; every field may be absent.
///
/// ```toml
/// [job]
/// job-type = "opt"
/// basis-set = "def2-svpd"
///
/// [solvent]
/// cmirs-solvent = "water"
///
/// [overrides.rem]
/// scf_convergence = 9
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialJobConfig {
    job: Option<PartialJobSection>,
    molecule: Option<PartialMoleculeConfig>,
    solvent: Option<PartialSolventConfig>,
    nbo: Option<toml::Table>,
    #[serde(rename = "new-geom-opt")]
    new_geom_opt: Option<toml::Table>,
    #[serde(rename = "opt-variables")]
    opt_variables: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "scan-variables")]
    scan_variables: Option<BTreeMap<String, Vec<String>>>,
    overrides: Option<BTreeMap<String, toml::Table>>,
}

/// Everything `write` needs besides the molecules themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub job_type: JobType,
    pub charge: i32,
    pub multiplicity: u32,
    pub options: PresetOptions,
}

impl PartialJobConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading job description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Combines the file with the command line. Command-line values win, and
    /// `-S` keywords are applied after the file's `[overrides]`.
    pub fn merge_with_cli(self, args: &WriteArgs) -> Result<JobPlan> {
        let job = self.job.unwrap_or_default();
        let molecule = self.molecule.unwrap_or_default();

        let job_type = match &args.job_type {
            Some(raw) => raw.parse::<JobType>()?,
            None => job.job_type.ok_or_else(|| {
                CliError::Config(
                    "`job.job-type` is required either in the config file or via --job-type."
                        .to_string(),
                )
            })?,
        };

        let defaults = PresetOptions::default();
        let solvent = if args.solvent.is_empty() {
            self.solvent.map(Into::into).unwrap_or_default()
        } else {
            args.solvent.clone().into()
        };

        let nbo = match &self.nbo {
            Some(table) => Some(NboParams::from_options(table_texts(table)?)?),
            None => None,
        };
        let new_geom_opt = match &self.new_geom_opt {
            Some(table) => Some(GeomOptParams::from_options(table_texts(table)?)?),
            None => None,
        };

        let mut overrides = OverrideSet::new();
        for (section, table) in self.overrides.unwrap_or_default() {
            let name: SectionName = section.parse().map_err(SetError::from)?;
            for (key, value) in &table {
                insert_file_override(&mut overrides, name, key, toml_value(key, value)?)?;
            }
        }
        apply_set_values(&mut overrides, &args.set_values)?;

        let options = PresetOptions {
            basis_set: args
                .basis_set
                .clone()
                .or(job.basis_set)
                .unwrap_or(defaults.basis_set),
            scf_algorithm: args
                .scf_algorithm
                .clone()
                .or(job.scf_algorithm)
                .unwrap_or(defaults.scf_algorithm),
            dft_rung: args.dft_rung.or(job.dft_rung).unwrap_or(defaults.dft_rung),
            max_scf_cycles: args
                .max_scf_cycles
                .or(job.max_scf_cycles)
                .unwrap_or(defaults.max_scf_cycles),
            geom_opt_max_cycles: args.geom_opt_max_cycles.or(job.geom_opt_max_cycles),
            solvent,
            opt_variables: into_blocks(self.opt_variables),
            scan_variables: into_blocks(self.scan_variables),
            plot_cubes: args.plot_cubes || job.plot_cubes.unwrap_or(false),
            nbo,
            new_geom_opt,
            vdw_mode: job.vdw_mode.unwrap_or_default(),
            extra_scf_print: args.extra_scf_print || job.extra_scf_print.unwrap_or(false),
            overrides,
        };

        Ok(JobPlan {
            job_type,
            charge: args.charge.or(molecule.charge).unwrap_or(0),
            multiplicity: args.multiplicity.or(molecule.multiplicity).unwrap_or(1),
            options,
        })
    }
}

fn into_blocks(blocks: Option<BTreeMap<String, Vec<String>>>) -> VariableBlocks {
    blocks.unwrap_or_default().into_iter().collect()
}

fn scalar_text(key: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        _ => Err(CliError::Config(format!(
            "Value of '{}' must be a string, number, or boolean.",
            key
        ))),
    }
}

/// Arrays become multi-line values; everything else is a single keyword value.
fn toml_value(key: &str, value: &toml::Value) -> Result<SectionValue> {
    match value {
        toml::Value::Array(items) => items
            .iter()
            .map(|item| scalar_text(key, item))
            .collect::<Result<Vec<_>>>()
            .map(SectionValue::Lines),
        other => scalar_text(key, other).map(SectionValue::Text),
    }
}

fn table_texts(table: &toml::Table) -> Result<Vec<(String, String)>> {
    table
        .iter()
        .map(|(key, value)| Ok((key.clone(), scalar_text(key, value)?)))
        .collect()
}

fn insert_file_override(
    overrides: &mut OverrideSet,
    section: SectionName,
    key: &str,
    value: SectionValue,
) -> Result<()> {
    let key = normalize_key(key);
    let taken = overrides
        .section(section)
        .is_some_and(|entries| entries.iter().any(|(k, _)| *k == key));
    if taken {
        return Err(SetError::DuplicateKey(DuplicateKeyError { key }).into());
    }
    overrides.insert(section, &key, value);
    Ok(())
}

/// Applies `SECTION.KEY=VALUE` pairs; a later pair replaces an earlier value.
fn apply_set_values(overrides: &mut OverrideSet, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected SECTION.KEY=VALUE.",
                kv_pair
            )));
        }
        let (section, key) = parts[0].split_once('.').ok_or_else(|| {
            CliError::Config(format!(
                "Invalid --set key: '{}'. Expected SECTION.KEY.",
                parts[0]
            ))
        })?;
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(CliError::Config(format!(
                "Invalid --set key: '{}'. The keyword is empty.",
                parts[0]
            )));
        }
        overrides.insert_str(section.trim(), &key, parts[1].trim())?;
    }
    Ok(())
}
