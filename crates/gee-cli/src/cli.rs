use clap::{Args, Parser, Subcommand};
use geetmmc::core::library::cv::CvKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "gee - GEE-TMMC free energies of a bead-spring polymer grown into a Lennard-Jones solvent, resolved along a conformational collective variable.",
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

    /// Set the number of threads used to run CV bins in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the GEE-TMMC simulation over every populated CV bin and write reports.
    Run(RunArgs),
    /// Index a conformation library by collective variable and write it as CSV.
    Index(IndexArgs),
    /// Write a configuration file filled with the default values.
    InitConfig(InitConfigArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the conformation library file.
    #[arg(short, long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Use a previously written CSV index instead of re-indexing the library.
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Override the directory reports are written to.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the global random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the target temperature (reduced units).
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the number of growth stages.
    #[arg(long, value_name = "INT")]
    pub num_stages: Option<usize>,

    /// Override the number of CV bins.
    #[arg(long, value_name = "INT")]
    pub num_cv_bins: Option<usize>,

    /// Override the number of production cycles.
    #[arg(long, value_name = "INT")]
    pub production_cycles: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S gee.num-stages=21
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to the conformation library file.
    #[arg(short, long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Path of the CSV index to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Configuration file providing chain length and interaction parameters.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the number of monomers per conformation.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_monomers: Option<usize>,

    /// Override the collective variable (radius-of-gyration or end-to-end-distance).
    #[arg(long, value_name = "KIND")]
    pub cv: Option<CvKind>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `init-config` subcommand.
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration file.
    #[arg(default_value = "gee.toml", value_name = "PATH")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
