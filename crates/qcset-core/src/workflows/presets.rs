use tracing::instrument;

use super::input_set::QChemInputSet;
use crate::core::models::molecule::Molecule;
use crate::core::models::section::VdwMode;
use crate::engine::config::{
    GeomOptParams, JobSpec, JobSpecBuilder, JobType, NboParams, OverrideSet, VariableBlocks,
};
use crate::engine::error::SetError;
use crate::engine::solvation::SolventSelectors;

pub const PRESET_BASIS_SET: &str = "def2-tzvppd";
pub const PRESET_SCF_ALGORITHM: &str = "diis";
pub const PRESET_DFT_RUNG: u8 = 3;

/// Caller-facing knobs shared by every preset.
///
/// Options a preset does not use must stay at their defaults; setting one is
/// reported as an error rather than silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetOptions {
    pub basis_set: String,
    pub scf_algorithm: String,
    pub dft_rung: u8,
    pub max_scf_cycles: u32,
    /// `None` keeps the builder default of 200.
    pub geom_opt_max_cycles: Option<u32>,
    pub solvent: SolventSelectors,
    pub opt_variables: VariableBlocks,
    pub scan_variables: VariableBlocks,
    pub plot_cubes: bool,
    pub nbo: Option<NboParams>,
    pub new_geom_opt: Option<GeomOptParams>,
    pub vdw_mode: VdwMode,
    pub extra_scf_print: bool,
    pub overrides: OverrideSet,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            basis_set: PRESET_BASIS_SET.to_string(),
            scf_algorithm: PRESET_SCF_ALGORITHM.to_string(),
            dft_rung: PRESET_DFT_RUNG,
            max_scf_cycles: 100,
            geom_opt_max_cycles: None,
            solvent: SolventSelectors::default(),
            opt_variables: VariableBlocks::new(),
            scan_variables: VariableBlocks::new(),
            plot_cubes: false,
            nbo: None,
            new_geom_opt: None,
            vdw_mode: VdwMode::Atomic,
            extra_scf_print: false,
            overrides: OverrideSet::new(),
        }
    }
}

/// Which job-specific options a preset accepts on top of the common ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetFeatures {
    pub opt_variables: bool,
    pub scan_variables: bool,
    pub geom_opt_max_cycles: bool,
    pub new_geom_opt: bool,
    pub extra_scf_print: bool,
}

impl PresetFeatures {
    /// Names of the accepted job-specific options.
    pub fn names(&self) -> Vec<&'static str> {
        [
            ("opt_variables", self.opt_variables),
            ("scan_variables", self.scan_variables),
            ("geom_opt_max_cycles", self.geom_opt_max_cycles),
            ("new_geom_opt", self.new_geom_opt),
            ("extra_scf_print", self.extra_scf_print),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }

    fn check(&self, job_type: JobType, options: &PresetOptions) -> Result<(), SetError> {
        let used = [
            ("opt_variables", !options.opt_variables.is_empty(), self.opt_variables),
            ("scan_variables", !options.scan_variables.is_empty(), self.scan_variables),
            (
                "geom_opt_max_cycles",
                options.geom_opt_max_cycles.is_some(),
                self.geom_opt_max_cycles,
            ),
            ("new_geom_opt", options.new_geom_opt.is_some(), self.new_geom_opt),
            ("extra_scf_print", options.extra_scf_print, self.extra_scf_print),
        ];
        match used.iter().find(|(_, set, supported)| *set && !*supported) {
            Some((name, _, _)) => Err(SetError::InvalidValue {
                parameter: name.to_string(),
                reason: format!("not used by {} jobs", job_type),
            }),
            None => Ok(()),
        }
    }
}

/// A fixed job type with its default options, delegating to the settings builder.
pub trait JobPreset {
    const JOB_TYPE: JobType;
    const FEATURES: PresetFeatures;

    /// Checks run before anything is built.
    fn validate(options: &PresetOptions) -> Result<(), SetError> {
        Self::FEATURES.check(Self::JOB_TYPE, options)
    }

    fn job_spec(molecule: Molecule, options: &PresetOptions) -> Result<JobSpec, SetError> {
        let mut builder = JobSpecBuilder::new()
            .molecule(molecule)
            .job_type(Self::JOB_TYPE)
            .basis_set(&options.basis_set)
            .scf_algorithm(&options.scf_algorithm)
            .dft_rung(options.dft_rung)
            .max_scf_cycles(options.max_scf_cycles)
            .solvent(options.solvent.clone())
            .opt_variables(options.opt_variables.clone())
            .scan_variables(options.scan_variables.clone())
            .plot_cubes(options.plot_cubes)
            .vdw_mode(options.vdw_mode)
            .extra_scf_print(options.extra_scf_print);
        if let Some(cycles) = options.geom_opt_max_cycles {
            builder = builder.geom_opt_max_cycles(cycles);
        }
        if let Some(nbo) = &options.nbo {
            builder = builder.nbo(nbo.clone());
        }
        if let Some(geom_opt) = &options.new_geom_opt {
            builder = builder.new_geom_opt(geom_opt.clone());
        }
        builder.build()
    }

    fn build(molecule: Molecule, options: &PresetOptions) -> Result<QChemInputSet, SetError> {
        Self::validate(options)?;
        let spec = Self::job_spec(molecule, options)?;
        QChemInputSet::new(&spec, &options.overrides)
    }
}

pub struct SinglePointSet;
pub struct OptSet;
pub struct TransitionStateSet;
pub struct ForceSet;
pub struct FreqSet;
pub struct PesScanSet;

impl JobPreset for SinglePointSet {
    const JOB_TYPE: JobType = JobType::SinglePoint;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: false,
        scan_variables: false,
        geom_opt_max_cycles: false,
        new_geom_opt: false,
        extra_scf_print: true,
    };
}

impl JobPreset for OptSet {
    const JOB_TYPE: JobType = JobType::Optimization;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: true,
        scan_variables: false,
        geom_opt_max_cycles: true,
        new_geom_opt: true,
        extra_scf_print: false,
    };
}

impl JobPreset for TransitionStateSet {
    const JOB_TYPE: JobType = JobType::TransitionState;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: true,
        scan_variables: false,
        geom_opt_max_cycles: true,
        new_geom_opt: false,
        extra_scf_print: false,
    };
}

impl JobPreset for ForceSet {
    const JOB_TYPE: JobType = JobType::Force;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: false,
        scan_variables: false,
        geom_opt_max_cycles: false,
        new_geom_opt: false,
        extra_scf_print: false,
    };
}

impl JobPreset for FreqSet {
    const JOB_TYPE: JobType = JobType::Frequency;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: false,
        scan_variables: false,
        geom_opt_max_cycles: false,
        new_geom_opt: false,
        extra_scf_print: false,
    };
}

impl JobPreset for PesScanSet {
    const JOB_TYPE: JobType = JobType::PesScan;
    const FEATURES: PresetFeatures = PresetFeatures {
        opt_variables: true,
        scan_variables: true,
        geom_opt_max_cycles: true,
        new_geom_opt: false,
        extra_scf_print: false,
    };

    fn validate(options: &PresetOptions) -> Result<(), SetError> {
        if options.scan_variables.values().all(Vec::is_empty) {
            return Err(SetError::MissingScanVariables);
        }
        Self::FEATURES.check(Self::JOB_TYPE, options)
    }
}

/// The accepted job-specific options of the preset for `job_type`.
pub fn features(job_type: JobType) -> PresetFeatures {
    match job_type {
        JobType::SinglePoint => SinglePointSet::FEATURES,
        JobType::Optimization => OptSet::FEATURES,
        JobType::TransitionState => TransitionStateSet::FEATURES,
        JobType::Force => ForceSet::FEATURES,
        JobType::Frequency => FreqSet::FEATURES,
        JobType::PesScan => PesScanSet::FEATURES,
    }
}

/// Builds an input set with the preset matching `job_type`.
#[instrument(skip(molecule, options), fields(atoms = molecule.len()))]
pub fn build_preset(
    job_type: JobType,
    molecule: Molecule,
    options: &PresetOptions,
) -> Result<QChemInputSet, SetError> {
    match job_type {
        JobType::SinglePoint => SinglePointSet::build(molecule, options),
        JobType::Optimization => OptSet::build(molecule, options),
        JobType::TransitionState => TransitionStateSet::build(molecule, options),
        JobType::Force => ForceSet::build(molecule, options),
        JobType::Frequency => FreqSet::build(molecule, options),
        JobType::PesScan => PesScanSet::build(molecule, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::Site;
    use crate::core::models::section::SectionName;
    use nalgebra::Point3;

    fn h2() -> Molecule {
        Molecule::new(
            vec![
                Site::new("H", Point3::new(0.0, 0.0, 0.0)),
                Site::new("H", Point3::new(0.0, 0.0, 0.74)),
            ],
            0,
            1,
        )
        .unwrap()
    }

    #[test]
    fn defaults_match_preset_constants() {
        let options = PresetOptions::default();
        assert_eq!(options.basis_set, "def2-tzvppd");
        assert_eq!(options.scf_algorithm, "diis");
        assert_eq!(options.dft_rung, 3);
        assert_eq!(options.max_scf_cycles, 100);
    }

    #[test]
    fn each_preset_fixes_its_job_type() {
        let options = PresetOptions::default();
        for job_type in [
            JobType::SinglePoint,
            JobType::Optimization,
            JobType::TransitionState,
            JobType::Force,
            JobType::Frequency,
        ] {
            let set = build_preset(job_type, h2(), &options).unwrap();
            assert_eq!(
                set.sections().text(SectionName::Rem, "job_type"),
                Some(job_type.as_str())
            );
            assert_eq!(set.sections().text(SectionName::Rem, "method"), Some("wb97xd"));
        }
    }

    #[test]
    fn unsupported_options_are_rejected() {
        let options = PresetOptions {
            extra_scf_print: true,
            ..Default::default()
        };
        assert!(SinglePointSet::build(h2(), &options).is_ok());
        assert!(matches!(
            FreqSet::build(h2(), &options),
            Err(SetError::InvalidValue { parameter, .. }) if parameter == "extra_scf_print"
        ));
    }

    #[test]
    fn opt_preset_forwards_constraints_and_cycle_limit() {
        let mut opt_variables = VariableBlocks::new();
        opt_variables.insert("CONSTRAINT".to_string(), vec!["stre 1 2 0.8".to_string()]);
        let options = PresetOptions {
            opt_variables,
            geom_opt_max_cycles: Some(80),
            ..Default::default()
        };
        let set = OptSet::build(h2(), &options).unwrap();
        assert_eq!(
            set.sections().text(SectionName::Rem, "geom_opt_max_cycles"),
            Some("80")
        );
        let opt = set.sections().get(SectionName::Opt).unwrap();
        assert_eq!(
            opt.get("constraint").and_then(|v| v.as_lines()),
            Some(&["stre 1 2 0.8".to_string()][..])
        );
    }

    #[test]
    fn pes_scan_without_variables_fails_before_building() {
        // An invalid rung would fail inside the builder; the scan check wins.
        let options = PresetOptions {
            dft_rung: 9,
            ..Default::default()
        };
        assert_eq!(
            PesScanSet::build(h2(), &options),
            Err(SetError::MissingScanVariables)
        );
    }

    #[test]
    fn pes_scan_with_variables_builds() {
        let mut scan_variables = VariableBlocks::new();
        scan_variables.insert("stre".to_string(), vec!["1 2 0.6 1.0 0.1".to_string()]);
        let options = PresetOptions {
            scan_variables,
            ..Default::default()
        };
        let set = PesScanSet::build(h2(), &options).unwrap();
        assert_eq!(
            set.sections().text(SectionName::Rem, "job_type"),
            Some("pes_scan")
        );
        assert!(set.sections().get(SectionName::Scan).is_some());
    }

    #[test]
    fn feature_names_follow_declaration_order() {
        assert_eq!(
            features(JobType::PesScan).names(),
            ["opt_variables", "scan_variables", "geom_opt_max_cycles"]
        );
        assert!(features(JobType::Force).names().is_empty());
    }
}
