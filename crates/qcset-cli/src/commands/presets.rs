use crate::error::Result;
use qcset::engine::config::JobType;
use qcset::engine::tables::cmirs_solvents;
use qcset::workflows::presets::{PresetOptions, features};
use std::fmt::Write;

pub fn run() -> Result<()> {
    print!("{}", describe());
    Ok(())
}

fn describe() -> String {
    let defaults = PresetOptions::default();
    let mut out = String::new();

    let _ = writeln!(out, "Preset defaults:");
    let _ = writeln!(out, "  basis-set       {}", defaults.basis_set);
    let _ = writeln!(out, "  scf-algorithm   {}", defaults.scf_algorithm);
    let _ = writeln!(out, "  dft-rung        {}", defaults.dft_rung);
    let _ = writeln!(out, "  max-scf-cycles  {}", defaults.max_scf_cycles);
    let _ = writeln!(out);

    let _ = writeln!(out, "Job types and their extra options:");
    for job_type in JobType::ALL {
        let names = features(job_type).names();
        let extras = if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        };
        let _ = writeln!(out, "  {:<10} {}", job_type.as_str(), extras);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "CMIRS solvents:");
    for solvent in cmirs_solvents() {
        let _ = writeln!(out, "  {}", solvent);
    }
    out
}
