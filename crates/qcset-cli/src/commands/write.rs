use crate::cli::WriteArgs;
use crate::config::{JobPlan, PartialJobConfig};
use crate::error::{CliError, Result};
use qcset::core::io::traits::TextFormat;
use qcset::core::io::xyz::XyzFile;
use qcset::workflows::input_set::QChemInputSet;
use qcset::workflows::presets::build_preset;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn run(args: WriteArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialJobConfig::from_file(path)?,
        None => PartialJobConfig::default(),
    };
    info!("Merging job description from file and CLI arguments...");
    let plan = partial_config.merge_with_cli(&args)?;
    debug!("Final job plan: {:?}", plan);

    let targets = output_paths(&args.molecules, &args.output_dir)?;
    println!(
        "Building {} {} input set(s)...",
        targets.len(),
        plan.job_type
    );
    // Nothing is written unless every molecule builds.
    let sets = targets
        .par_iter()
        .map(|(input, _)| build_one(input, &plan))
        .collect::<Result<Vec<_>>>()?;

    fs::create_dir_all(&args.output_dir)?;
    for ((_, output), set) in targets.iter().zip(&sets) {
        set.write(output)?;
        info!(
            "Wrote {:?} ({} atoms, {} advisories)",
            output,
            set.molecule().len(),
            set.advisories().len()
        );
        match set.advisories().len() {
            0 => println!("✓ {}", output.display()),
            n => println!(
                "✓ {} ({} advisory warning(s), rerun with -v for details)",
                output.display(),
                n
            ),
        }
    }
    Ok(())
}

/// Pairs every structure file with `<output_dir>/<stem>.qin`.
fn output_paths(molecules: &[PathBuf], output_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut seen = HashSet::new();
    molecules
        .iter()
        .map(|input| {
            let stem = input.file_stem().ok_or_else(|| {
                CliError::Argument(format!("'{}' is not a file path", input.display()))
            })?;
            if !seen.insert(stem.to_os_string()) {
                return Err(CliError::Argument(format!(
                    "More than one molecule is named '{}'; output files would collide.",
                    stem.to_string_lossy()
                )));
            }
            let output = output_dir.join(format!("{}.qin", stem.to_string_lossy()));
            Ok((input.clone(), output))
        })
        .collect()
}

fn build_one(input: &Path, plan: &JobPlan) -> Result<QChemInputSet> {
    info!("Loading molecule from {:?}", input);
    let molecule = XyzFile::read_from_path(input)
        .map_err(|e| CliError::FileParsing {
            path: input.to_path_buf(),
            source: e.into(),
        })?
        .with_charge_and_multiplicity(plan.charge, plan.multiplicity)
        .map_err(|source| CliError::Molecule {
            path: input.to_path_buf(),
            source,
        })?;

    Ok(build_preset(plan.job_type, molecule, &plan.options)?)
}
