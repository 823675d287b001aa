use tracing::{debug, info, instrument, warn};

use super::config::{JobSpec, OverrideSet, VariableBlocks};
use super::error::{Advisory, SetError};
use super::overrides::{self, MergeState};
use super::tables;
use crate::core::models::section::{Section, SectionCollection, SectionName, SectionValue};

const MAX_SCAN_VARIABLES: usize = 2;
const NBO_EXTERNAL_VERSION: u32 = 7;
const PRINT_SCF_CONVERGENCE: i64 = 8;
const PLOTS_DEFAULTS: [(&str, &str); 2] = [("grid_spacing", "0.05"), ("total_density", "0")];

/// The sections produced by a build plus any non-fatal advisories.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub sections: SectionCollection,
    pub advisories: Vec<Advisory>,
}

/// Turns a [`JobSpec`] into a complete, validated [`SectionCollection`].
///
/// A build either returns every section or fails with a [`SetError`]; no
/// partially populated collection ever escapes.
pub struct SettingsBuilder<'a> {
    spec: &'a JobSpec,
}

impl<'a> SettingsBuilder<'a> {
    pub fn new(spec: &'a JobSpec) -> Self {
        Self { spec }
    }

    #[instrument(skip_all, name = "settings_build", fields(job_type = %self.spec.job_type))]
    pub fn build(&self, overrides: &OverrideSet) -> Result<BuildOutput, SetError> {
        let sections = self.derive_sections()?;
        let (sections, advisories) = self.apply_overrides(sections, overrides)?;
        info!(
            sections = sections.len(),
            advisories = advisories.len(),
            "Built input sections."
        );
        Ok(BuildOutput {
            sections,
            advisories,
        })
    }

    /// Builds every section implied by the job parameters alone.
    pub fn derive_sections(&self) -> Result<SectionCollection, SetError> {
        let spec = self.spec;
        let mut sections = SectionCollection::new(spec.vdw_mode);

        let rem = sections.section_mut(SectionName::Rem);
        rem.insert("job_type", spec.job_type.as_str());
        rem.insert("basis", spec.basis_set.as_str());
        rem.insert("max_scf_cycles", spec.max_scf_cycles.to_string());
        rem.insert("gen_scfman", "true");
        rem.insert("xc_grid", "3");
        rem.insert("thresh", "14");
        rem.insert("s2thresh", "16");
        rem.insert("scf_algorithm", spec.scf_algorithm.as_str());
        rem.insert("resp_charges", "true");
        rem.insert("symmetry", "false");
        rem.insert("sym_ignore", "true");

        let rung = tables::dft_rung(spec.dft_rung)?;
        rem.insert("method", rung.method);
        if let Some(dispersion) = rung.dispersion {
            rem.insert("dft_d", dispersion);
        }

        if spec.job_type.moves_geometry() {
            rem.insert("geom_opt_max_cycles", spec.geom_opt_max_cycles.to_string());
        }

        insert_blocks(&mut sections, SectionName::Opt, &spec.opt_variables);
        insert_blocks(&mut sections, SectionName::Scan, &spec.scan_variables);

        spec.solvation.apply(&mut sections)?;

        if spec.plot_cubes {
            let plots = sections.section_mut(SectionName::Plots);
            for (key, value) in PLOTS_DEFAULTS {
                plots.insert(key, value);
            }
            let rem = sections.section_mut(SectionName::Rem);
            rem.insert("plots", "true");
            rem.insert("make_cube_files", "true");
        }

        if let Some(nbo) = &spec.nbo {
            let rem = sections.section_mut(SectionName::Rem);
            rem.insert("nbo", "true");
            let versions = nbo.requested_versions()?;
            if let Some(&version) = versions.iter().find(|v| **v != NBO_EXTERNAL_VERSION) {
                return Err(SetError::UnsupportedNboVersion(version));
            }
            if !versions.is_empty() {
                rem.insert("nbo_external", "true");
            }
            let section = sections.section_mut(SectionName::Nbo);
            for (key, value) in nbo.options.iter().filter(|(key, _)| *key != "version") {
                section.insert(key, value.as_str());
            }
        }

        if let Some(geom_opt) = &spec.new_geom_opt {
            let limit = spec.geom_opt_max_cycles;
            if let Some(maxiter) = geom_opt
                .requested_maxiters()?
                .into_iter()
                .find(|maxiter| *maxiter != limit)
            {
                return Err(SetError::OptimizerCycleMismatch { maxiter, limit });
            }
            sections
                .section_mut(SectionName::Rem)
                .insert("geom_opt2", "3");
            let section = sections.section_mut(SectionName::GeomOpt);
            for (key, value) in geom_opt.options.iter().filter(|(key, _)| *key != "maxiter") {
                section.insert(key, value.as_str());
            }
            section.insert("maxiter", limit.to_string());
        }

        debug!(sections = sections.len(), "Derived sections from job parameters.");
        Ok(sections)
    }

    /// Merges caller overrides into `sections` and applies the final policies.
    ///
    /// Takes the collection by value and hands back a new one, so a failure
    /// leaves nothing half-merged. Applying the same overrides again to the
    /// result yields the same collection.
    pub fn apply_overrides(
        &self,
        mut sections: SectionCollection,
        overrides: &OverrideSet,
    ) -> Result<(SectionCollection, Vec<Advisory>), SetError> {
        let cmirs = match self.spec.solvation.cmirs_solvent() {
            Some(solvent) => Some(tables::cmirs_parameters(solvent)?),
            None => None,
        };
        let mut state = MergeState::new(cmirs);

        for (name, entries) in overrides.iter() {
            let route = overrides::route(name);
            if route.requires_enabled && !sections.contains(name) {
                return Err(SetError::SectionNotEnabled(name));
            }
            let incoming = Section::from_entries(
                entries
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.clone())),
            )?;
            if let Some(hook) = route.hook {
                hook(&incoming, &mut sections, &mut state)?;
            }
            debug!(section = %name, keys = incoming.len(), "Merging overrides.");
            sections.section_mut(name).merge(incoming);
        }

        if state.read_custom_radii {
            sections
                .section_mut(SectionName::Pcm)
                .insert("radii", "read");
        }

        if self.spec.extra_scf_print {
            raise_scf_print(sections.section_mut(SectionName::Rem))?;
        }

        let scan_count: usize = sections
            .get(SectionName::Scan)
            .map(|scan| scan.iter().map(|(_, value)| value.lines().len()).sum::<usize>())
            .unwrap_or(0);
        if scan_count > MAX_SCAN_VARIABLES {
            return Err(SetError::TooManyScanVariables(scan_count));
        }

        Ok((sections, state.advisories))
    }
}

fn insert_blocks(sections: &mut SectionCollection, name: SectionName, blocks: &VariableBlocks) {
    if blocks.is_empty() {
        return;
    }
    let section = sections.section_mut(name);
    for (key, lines) in blocks {
        section.insert(key, SectionValue::Lines(lines.clone()));
    }
}

fn raise_scf_print(rem: &mut Section) -> Result<(), SetError> {
    rem.insert("scf_final_print", "3");
    let current = match rem.text("scf_convergence") {
        Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| SetError::InvalidValue {
            parameter: "scf_convergence".to_string(),
            reason: format!("'{}' is not an integer", raw),
        })?),
        None => None,
    };
    match current {
        Some(value) if value >= PRINT_SCF_CONVERGENCE => {}
        Some(value) => {
            warn!(
                scf_convergence = value,
                "Tightening scf_convergence to 8 for extra SCF printing."
            );
            rem.insert("scf_convergence", PRINT_SCF_CONVERGENCE.to_string());
        }
        None => {
            rem.insert("scf_convergence", PRINT_SCF_CONVERGENCE.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::{Molecule, Site};
    use crate::engine::config::{GeomOptParams, JobSpecBuilder, JobType, NboParams};
    use crate::engine::error::ErrorCategory;
    use crate::engine::solvation::{SolvationModel, SolventSelectors};
    use nalgebra::Point3;

    fn water() -> Molecule {
        Molecule::new(
            vec![
                Site::new("O", Point3::new(0.0, 0.0, 0.1173)),
                Site::new("H", Point3::new(0.0, 0.7572, -0.4692)),
                Site::new("H", Point3::new(0.0, -0.7572, -0.4692)),
            ],
            0,
            1,
        )
        .unwrap()
    }

    fn job(job_type: JobType) -> JobSpecBuilder {
        JobSpecBuilder::new()
            .molecule(water())
            .job_type(job_type)
            .basis_set("def2-tzvppd")
            .scf_algorithm("diis")
    }

    fn build(spec: &JobSpec, overrides: &OverrideSet) -> Result<BuildOutput, SetError> {
        SettingsBuilder::new(spec).build(overrides)
    }

    fn rem_text<'s>(output: &'s BuildOutput, key: &str) -> Option<&'s str> {
        output.sections.text(SectionName::Rem, key)
    }

    fn cmirs(solvent: &str) -> JobSpec {
        job(JobType::SinglePoint)
            .solvation(SolvationModel::Cmirs {
                solvent: solvent.to_string(),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn primary_section_is_seeded_in_order() {
        let spec = job(JobType::SinglePoint).dft_rung(3).build().unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        let rem = output.sections.get(SectionName::Rem).unwrap();
        assert_eq!(
            rem.keys().collect::<Vec<_>>(),
            [
                "job_type",
                "basis",
                "max_scf_cycles",
                "gen_scfman",
                "xc_grid",
                "thresh",
                "s2thresh",
                "scf_algorithm",
                "resp_charges",
                "symmetry",
                "sym_ignore",
                "method",
            ]
        );
        assert_eq!(rem.text("method"), Some("wb97xd"));
        assert!(output.advisories.is_empty());
    }

    #[test]
    fn every_rung_sets_its_functional() {
        let expected = ["b3lyp", "b3lyp", "wb97xd", "wb97xv", "wb97mv"];
        for (rung, method) in (1u8..=5).zip(expected) {
            let spec = job(JobType::SinglePoint).dft_rung(rung).build().unwrap();
            let output = build(&spec, &OverrideSet::new()).unwrap();
            assert_eq!(rem_text(&output, "method"), Some(method));
            assert_eq!(rem_text(&output, "dft_d").is_some(), rung == 2);
        }
    }

    #[test]
    fn rungs_outside_the_ladder_fail() {
        for rung in [0, 6] {
            let spec = job(JobType::SinglePoint).dft_rung(rung).build().unwrap();
            let err = build(&spec, &OverrideSet::new()).unwrap_err();
            assert_eq!(err, SetError::InvalidDftRung(rung));
            assert_eq!(err.category(), ErrorCategory::InvalidParameter);
        }
    }

    #[test]
    fn method_override_bypasses_the_rung_table() {
        let spec = job(JobType::SinglePoint).build().unwrap();
        let overrides = OverrideSet::new().set(SectionName::Rem, "METHOD", "pbe0");
        let output = build(&spec, &overrides).unwrap();
        assert_eq!(rem_text(&output, "method"), Some("pbe0"));
    }

    #[test]
    fn geometry_cycles_only_for_moving_jobs() {
        for job_type in JobType::ALL {
            let spec = job(job_type).geom_opt_max_cycles(150).build().unwrap();
            let sections = SettingsBuilder::new(&spec).derive_sections().unwrap();
            let cycles = sections.text(SectionName::Rem, "geom_opt_max_cycles");
            if job_type.moves_geometry() {
                assert_eq!(cycles, Some("150"));
            } else {
                assert_eq!(cycles, None);
            }
        }
    }

    #[test]
    fn cmirs_benzene_leaves_untabulated_terms_out() {
        let spec = cmirs("benzene");
        let output = build(&spec, &OverrideSet::new()).unwrap();
        let nonels = output.sections.get(SectionName::PcmNonels).unwrap();
        for missing in ["gamma", "c", "d"] {
            assert!(!nonels.contains_key(missing));
        }
        for present in ["a", "b", "solvrho", "delta", "gaulag_n"] {
            assert!(nonels.contains_key(present));
        }
        assert_eq!(nonels.text("delta"), Some("7"));
        assert_eq!(nonels.text("gaulag_n"), Some("40"));
    }

    #[test]
    fn rhoiso_override_reselects_cmirs_coefficients() {
        let spec = cmirs("water");
        let overrides = OverrideSet::new().set(SectionName::Svp, "RHOISO", "0.0005");
        let output = build(&spec, &overrides).unwrap();
        let nonels = output.sections.get(SectionName::PcmNonels).unwrap();
        assert_eq!(nonels.text("a"), Some("-0.006496"));
        assert_eq!(nonels.text("c"), Some("-566.7"));
        assert_eq!(nonels.text("gamma"), Some("3.2"));
        assert_eq!(nonels.text("delta"), Some("7"));
        assert_eq!(output.sections.text(SectionName::Svp, "rhoiso"), Some("0.0005"));
    }

    #[test]
    fn rhoiso_override_keeps_terms_missing_from_new_table() {
        let spec = cmirs("benzene");
        let builder = SettingsBuilder::new(&spec);
        let first = OverrideSet::new().set(SectionName::PcmNonels, "gamma", "2.0");
        let output = builder.build(&first).unwrap();

        let second = OverrideSet::new().set(SectionName::Svp, "rhoiso", "0.0005");
        let (sections, _) = builder.apply_overrides(output.sections, &second).unwrap();
        let nonels = sections.get(SectionName::PcmNonels).unwrap();
        assert_eq!(nonels.text("a"), Some("-0.00572"));
        assert_eq!(nonels.text("b"), Some("0.01116"));
        assert_eq!(nonels.text("gamma"), Some("2.0"));
    }

    #[test]
    fn unsupported_rhoiso_with_cmirs_fails() {
        let spec = cmirs("water");
        let overrides = OverrideSet::new().set(SectionName::Svp, "rhoiso", "0.002");
        assert_eq!(
            build(&spec, &overrides),
            Err(SetError::UnsupportedIsodensity("0.002".to_string()))
        );
    }

    #[test]
    fn rhoiso_override_without_cmirs_is_plain_merge() {
        let spec = job(JobType::SinglePoint)
            .solvation(SolvationModel::Isosvp { dielectric: 78.39 })
            .build()
            .unwrap();
        let overrides = OverrideSet::new().set(SectionName::Svp, "rhoiso", "0.002");
        let output = build(&spec, &overrides).unwrap();
        assert_eq!(output.sections.text(SectionName::Svp, "rhoiso"), Some("0.002"));
        assert!(output.sections.get(SectionName::PcmNonels).is_none());
    }

    #[test]
    fn idefesr_overrides_raise_advisories() {
        let spec = cmirs("water");
        let overrides = OverrideSet::new().set(SectionName::Svp, "idefesr", "0");
        let output = build(&spec, &overrides).unwrap();
        assert_eq!(output.advisories, [Advisory::CmirsDisabled]);

        let spec = job(JobType::SinglePoint).build().unwrap();
        let overrides = OverrideSet::new().set(SectionName::Svp, "idefesr", "1");
        let output = build(&spec, &overrides).unwrap();
        assert!(output.advisories.contains(&Advisory::CmirsFlagWithoutSolvent));
    }

    #[test]
    fn dielst_override_warns_without_isosvp() {
        let spec = job(JobType::SinglePoint)
            .solvation(SolvationModel::Pcm { dielectric: 78.39 })
            .build()
            .unwrap();
        let overrides = OverrideSet::new().set(SectionName::Svp, "dielst", "10.0");
        let output = build(&spec, &overrides).unwrap();
        assert_eq!(
            output.advisories,
            [Advisory::DielectricIgnored {
                solvent_method: Some("pcm".to_string())
            }]
        );
    }

    #[test]
    fn solvent_override_warns_unless_pcm() {
        let smd = job(JobType::SinglePoint)
            .solvent(SolventSelectors {
                smd_solvent: Some("water".to_string()),
                ..Default::default()
            })
            .build()
            .unwrap();
        let overrides = OverrideSet::new().set(SectionName::Solvent, "dielectric", "10.0");
        let output = build(&smd, &overrides).unwrap();
        assert_eq!(
            output.advisories,
            [Advisory::SolventSectionIgnored {
                solvent_method: Some("smd".to_string())
            }]
        );

        let pcm = job(JobType::SinglePoint)
            .solvation(SolvationModel::Pcm { dielectric: 78.39 })
            .build()
            .unwrap();
        let output = build(&pcm, &overrides).unwrap();
        assert!(output.advisories.is_empty());
        assert_eq!(
            output.sections.text(SectionName::Solvent, "dielectric"),
            Some("10.0")
        );
    }

    #[test]
    fn van_der_waals_override_forces_read_radii() {
        let overrides = OverrideSet::new().set(SectionName::VanDerWaals, "6", "1.8");
        let models = [
            SolvationModel::None,
            SolvationModel::Pcm { dielectric: 78.39 },
            SolvationModel::Cmirs {
                solvent: "water".to_string(),
            },
        ];
        for model in models {
            let spec = job(JobType::SinglePoint).solvation(model).build().unwrap();
            let both = overrides.clone().set(SectionName::Pcm, "radii", "bondi");
            for overrides in [&overrides, &both] {
                let output = build(&spec, overrides).unwrap();
                assert_eq!(output.sections.text(SectionName::Pcm, "radii"), Some("read"));
                assert_eq!(
                    output.sections.text(SectionName::VanDerWaals, "6"),
                    Some("1.8")
                );
            }
        }
    }

    #[test]
    fn nbo_version_seven_sets_external_flag() {
        let spec = job(JobType::SinglePoint)
            .nbo(NboParams::new().with_version(7).option("print", "1"))
            .build()
            .unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        assert_eq!(rem_text(&output, "nbo"), Some("true"));
        assert_eq!(rem_text(&output, "nbo_external"), Some("true"));
        let nbo = output.sections.get(SectionName::Nbo).unwrap();
        assert_eq!(nbo.text("print"), Some("1"));
        assert!(!nbo.contains_key("version"));
    }

    #[test]
    fn nbo_without_options_still_has_a_section() {
        let spec = job(JobType::SinglePoint).nbo(NboParams::new()).build().unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        assert!(output.sections.get(SectionName::Nbo).unwrap().is_empty());
        assert_eq!(rem_text(&output, "nbo_external"), None);
    }

    #[test]
    fn other_nbo_versions_fail() {
        let spec = job(JobType::SinglePoint)
            .nbo(NboParams::new().with_version(6))
            .build()
            .unwrap();
        let err = build(&spec, &OverrideSet::new()).unwrap_err();
        assert_eq!(err, SetError::UnsupportedNboVersion(6));
        assert_eq!(err.category(), ErrorCategory::InvalidParameter);
    }

    #[test]
    fn nbo_version_given_as_an_option_is_checked() {
        let spec = job(JobType::SinglePoint)
            .nbo(NboParams::new().option("version", "6"))
            .build()
            .unwrap();
        assert_eq!(
            build(&spec, &OverrideSet::new()),
            Err(SetError::UnsupportedNboVersion(6))
        );

        let spec = job(JobType::SinglePoint)
            .nbo(NboParams::new().option("VERSION", "7").option("print", "1"))
            .build()
            .unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        assert_eq!(rem_text(&output, "nbo_external"), Some("true"));
        let nbo = output.sections.get(SectionName::Nbo).unwrap();
        assert!(!nbo.contains_key("version"));
        assert_eq!(nbo.text("print"), Some("1"));
    }

    #[test]
    fn overriding_sections_that_were_never_enabled_fails() {
        let spec = job(JobType::Optimization).build().unwrap();
        for name in [SectionName::Nbo, SectionName::GeomOpt] {
            let overrides = OverrideSet::new().set(name, "print", "2");
            let err = build(&spec, &overrides).unwrap_err();
            assert_eq!(err, SetError::SectionNotEnabled(name));
            assert_eq!(err.category(), ErrorCategory::MissingDependency);
        }
    }

    #[test]
    fn new_optimizer_maxiter_must_match_cycle_limit() {
        let matching = job(JobType::Optimization)
            .new_geom_opt(GeomOptParams::new().with_maxiter(200))
            .build()
            .unwrap();
        let output = build(&matching, &OverrideSet::new()).unwrap();
        assert_eq!(rem_text(&output, "geom_opt2"), Some("3"));
        assert_eq!(output.sections.text(SectionName::GeomOpt, "maxiter"), Some("200"));

        let mismatched = job(JobType::Optimization)
            .new_geom_opt(GeomOptParams::new().with_maxiter(50))
            .build()
            .unwrap();
        let err = build(&mismatched, &OverrideSet::new()).unwrap_err();
        assert_eq!(
            err,
            SetError::OptimizerCycleMismatch {
                maxiter: 50,
                limit: 200
            }
        );
        assert_eq!(err.category(), ErrorCategory::ConflictingConfiguration);
    }

    #[test]
    fn new_optimizer_maxiter_given_as_an_option_is_checked() {
        let spec = job(JobType::Optimization)
            .new_geom_opt(GeomOptParams::new().option("maxiter", "50"))
            .build()
            .unwrap();
        assert_eq!(
            build(&spec, &OverrideSet::new()),
            Err(SetError::OptimizerCycleMismatch {
                maxiter: 50,
                limit: 200
            })
        );

        let spec = job(JobType::Optimization)
            .geom_opt_max_cycles(120)
            .new_geom_opt(GeomOptParams::new().option("MaxIter", "120"))
            .build()
            .unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        let geom_opt = output.sections.get(SectionName::GeomOpt).unwrap();
        assert_eq!(geom_opt.text("maxiter"), Some("120"));
        assert_eq!(geom_opt.len(), 1);
    }

    #[test]
    fn touched_sections_still_need_to_be_enabled() {
        let spec = job(JobType::SinglePoint).build().unwrap();
        let mut overrides = OverrideSet::new();
        overrides.touch(SectionName::Nbo);
        assert!(overrides.contains(SectionName::Nbo));
        assert_eq!(
            build(&spec, &overrides),
            Err(SetError::SectionNotEnabled(SectionName::Nbo))
        );

        let spec = job(JobType::SinglePoint).nbo(NboParams::new()).build().unwrap();
        let output = build(&spec, &overrides).unwrap();
        assert!(output.sections.get(SectionName::Nbo).unwrap().is_empty());
    }

    #[test]
    fn new_optimizer_derives_maxiter_when_absent() {
        let spec = job(JobType::Optimization)
            .geom_opt_max_cycles(75)
            .new_geom_opt(GeomOptParams::new().option("coordinates", "redundant"))
            .build()
            .unwrap();
        let overrides = OverrideSet::new().set(SectionName::GeomOpt, "initial_hessian", "model");
        let output = build(&spec, &overrides).unwrap();
        let geom_opt = output.sections.get(SectionName::GeomOpt).unwrap();
        assert_eq!(geom_opt.text("maxiter"), Some("75"));
        assert_eq!(geom_opt.text("coordinates"), Some("redundant"));
        assert_eq!(geom_opt.text("initial_hessian"), Some("model"));
    }

    #[test]
    fn plots_add_section_and_flags() {
        let spec = job(JobType::SinglePoint).plot_cubes(true).build().unwrap();
        let output = build(&spec, &OverrideSet::new()).unwrap();
        assert_eq!(output.sections.text(SectionName::Plots, "grid_spacing"), Some("0.05"));
        assert_eq!(output.sections.text(SectionName::Plots, "total_density"), Some("0"));
        assert_eq!(rem_text(&output, "plots"), Some("true"));
        assert_eq!(rem_text(&output, "make_cube_files"), Some("true"));
    }

    #[test]
    fn extra_scf_print_never_loosens_convergence() {
        let spec = job(JobType::SinglePoint).extra_scf_print(true).build().unwrap();

        let output = build(&spec, &OverrideSet::new()).unwrap();
        assert_eq!(rem_text(&output, "scf_final_print"), Some("3"));
        assert_eq!(rem_text(&output, "scf_convergence"), Some("8"));

        let loose = OverrideSet::new().set(SectionName::Rem, "scf_convergence", "5");
        let output = build(&spec, &loose).unwrap();
        assert_eq!(rem_text(&output, "scf_convergence"), Some("8"));

        let tight = OverrideSet::new().set(SectionName::Rem, "scf_convergence", "10");
        let output = build(&spec, &tight).unwrap();
        assert_eq!(rem_text(&output, "scf_convergence"), Some("10"));

        let bad = OverrideSet::new().set(SectionName::Rem, "scf_convergence", "tight");
        assert!(matches!(
            build(&spec, &bad),
            Err(SetError::InvalidValue { .. })
        ));
    }

    #[test]
    fn case_only_duplicate_override_keys_fail() {
        let spec = job(JobType::SinglePoint).build().unwrap();
        let overrides = OverrideSet::new()
            .set(SectionName::Rem, "thresh", "12")
            .set(SectionName::Rem, "THRESH", "10");
        let err = build(&spec, &overrides).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DuplicateKey);
    }

    #[test]
    fn more_than_two_scan_variables_fail() {
        let mut scan = VariableBlocks::new();
        scan.insert("stre".to_string(), vec!["1 2 1.0 1.5 0.1".to_string()]);
        scan.insert(
            "tors".to_string(),
            vec!["1 2 3 4 -180 180 10".to_string(), "2 3 4 5 0 90 10".to_string()],
        );
        let spec = job(JobType::PesScan).scan_variables(scan).build().unwrap();
        assert_eq!(
            build(&spec, &OverrideSet::new()),
            Err(SetError::TooManyScanVariables(3))
        );
    }

    #[test]
    fn override_merge_is_idempotent() {
        let spec = cmirs("water");
        let overrides = OverrideSet::new()
            .set(SectionName::Rem, "method", "b3lyp")
            .set(SectionName::Svp, "rhoiso", "0.0005")
            .set(SectionName::VanDerWaals, "1", "1.1")
            .set(SectionName::Opt, "FIXED", vec!["1 XYZ"]);
        let builder = SettingsBuilder::new(&spec);

        let once = builder.build(&overrides).unwrap().sections;
        let (twice, _) = builder.apply_overrides(once.clone(), &overrides).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn failed_build_reports_error_only() {
        let spec = job(JobType::SinglePoint)
            .solvation(SolvationModel::Smd {
                solvent: "custom".to_string(),
                custom_parameters: None,
            })
            .build();
        assert_eq!(spec, Err(SetError::MissingCustomSmd));
    }
}
