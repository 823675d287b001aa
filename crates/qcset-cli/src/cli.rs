use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "qcset CLI - Build validated Q-Chem input files from molecule structures and a short job description.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to build input files in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and write one input file per molecule.
    Write(WriteArgs),
    /// Show the job presets, their defaults, and the CMIRS solvent table.
    Presets,
}

/// Arguments for the `write` subcommand.
#[derive(Args, Debug, Default)]
pub struct WriteArgs {
    // --- Core Arguments ---
    /// XYZ structure files; each one produces `<name>.qin` in the output directory.
    #[arg(required = true, value_name = "XYZ")]
    pub molecules: Vec<PathBuf>,

    /// Path to a job description in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the input files are written to. Created if missing.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    // --- Job Overrides ---
    /// Job type: sp, opt, ts, force, freq, or pes_scan.
    #[arg(short = 't', long, value_name = "TYPE")]
    pub job_type: Option<String>,

    /// Override the basis set.
    #[arg(short, long, value_name = "NAME")]
    pub basis_set: Option<String>,

    /// Override the SCF algorithm.
    #[arg(long, value_name = "NAME")]
    pub scf_algorithm: Option<String>,

    /// Override the DFT rung (1-5).
    #[arg(short = 'r', long, value_name = "INT")]
    pub dft_rung: Option<u8>,

    /// Override the maximum number of SCF cycles.
    #[arg(long, value_name = "INT")]
    pub max_scf_cycles: Option<u32>,

    /// Override the maximum number of geometry optimization cycles.
    #[arg(long, value_name = "INT")]
    pub geom_opt_max_cycles: Option<u32>,

    /// Total molecular charge.
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub charge: Option<i32>,

    /// Spin multiplicity.
    #[arg(long, value_name = "INT")]
    pub multiplicity: Option<u32>,

    /// Request cube files of the density and ESP.
    #[arg(long)]
    pub plot_cubes: bool,

    /// Raise SCF print level and convergence (single point only).
    #[arg(long)]
    pub extra_scf_print: bool,

    /// Replace the config file's solvent settings.
    #[command(flatten)]
    pub solvent: SolventArgs,

    /// Set a keyword in an input section, overriding everything else.
    /// Can be used multiple times. Example: -S rem.scf_convergence=9
    #[arg(short = 'S', long = "set", value_name = "SECTION.KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Implicit solvent selection. Any of these replaces the `[solvent]` table
/// of the config file as a whole.
#[derive(Args, Debug, Default, Clone)]
pub struct SolventArgs {
    /// Use PCM with this dielectric constant.
    #[arg(long, value_name = "FLOAT")]
    pub pcm_dielectric: Option<f64>,

    /// Use ISOSVP with this dielectric constant.
    #[arg(long, value_name = "FLOAT")]
    pub isosvp_dielectric: Option<f64>,

    /// Use SMD with this solvent name ('custom' or 'other' for user parameters).
    #[arg(long, value_name = "NAME")]
    pub smd_solvent: Option<String>,

    /// The seven comma-separated parameters of a custom SMD solvent.
    #[arg(long, value_name = "VALUES")]
    pub custom_smd: Option<String>,

    /// Use CMIRS with this tabulated solvent.
    #[arg(long, value_name = "NAME")]
    pub cmirs_solvent: Option<String>,
}

impl SolventArgs {
    pub fn is_empty(&self) -> bool {
        self.pcm_dielectric.is_none()
            && self.isosvp_dielectric.is_none()
            && self.smd_solvent.is_none()
            && self.custom_smd.is_none()
            && self.cmirs_solvent.is_none()
    }
}
