use crate::cli::InitConfigArgs;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use std::fs;
use tracing::info;

pub fn run(args: InitConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(CliError::Argument(format!(
            "{} already exists; pass --force to overwrite it",
            args.output.display()
        )));
    }
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(&args.output, render_default_config(&DefaultsConfig::default()))?;
    info!("Wrote default configuration to {:?}", args.output);
    println!("✓ Default configuration written to: {}", args.output.display());
    Ok(())
}

/// A commented configuration file holding every built-in default.
pub fn render_default_config(d: &DefaultsConfig) -> String {
    format!(
        r#"# gee configuration. Every key is optional except `library`; command-line
# flags and `-S section.key=value` override the values below.

# Conformation library: `# Conformation ...` header lines, each followed by
# one `x y z` line per monomer.
library = "conformations.txt"
# Optional CSV index written by `gee index`; skips re-indexing the library.
# index = "library-index.csv"
output-dir = "{output_dir}"
# seed = 12345

[thermodynamics]
temperature = {temperature:?}
# Temperature the library was sampled at; defaults to `temperature`.
# library-temperature = {temperature:?}

[polymer]
num-monomers = {num_monomers}
bond-k = {bond_k:?}
bond-r-eq = {bond_r_eq:?}
epsilon = {polymer_epsilon:?}
sigma = {polymer_sigma:?}

[solvent]
count = {solvent_count}
box-length = {box_length:?}
epsilon = {solvent_epsilon:?}
sigma = {solvent_sigma:?}
max-displacement = {max_displacement:?}
# cutoff = 2.5
# Whitespace-separated x y z rows; the first `count` rows are used.
# initial-box = "solvent.txt"

[coupling]
epsilon = {coupling_epsilon:?}
sigma = {coupling_sigma:?}

[collective-variable]
# radius-of-gyration or end-to-end-distance
kind = "{cv_kind}"
num-bins = {num_cv_bins}
# Widened to the observed library range when absent or narrower.
# min = 0.0
# max = 5.0

[gee]
num-stages = {num_stages}
equilibration-cycles = {equilibration_cycles}
production-cycles = {production_cycles}
sweeps-per-attempt = {sweeps_per_attempt}
# Outer cycles between bias updates; 0 disables adaptation.
eta-update-interval = {eta_update_interval}
eta-damping = {eta_damping:?}

[diagnostics]
# Elementary steps between samples; 0 derives them from the run length.
history-interval = {history_interval}
verbose-interval = {verbose_interval}
"#,
        output_dir = d.output_dir,
        temperature = d.temperature,
        num_monomers = d.num_monomers,
        bond_k = d.bond_k,
        bond_r_eq = d.bond_r_eq,
        polymer_epsilon = d.polymer_epsilon,
        polymer_sigma = d.polymer_sigma,
        solvent_count = d.solvent_count,
        box_length = d.box_length,
        solvent_epsilon = d.solvent_epsilon,
        solvent_sigma = d.solvent_sigma,
        max_displacement = d.max_displacement,
        coupling_epsilon = d.coupling_epsilon,
        coupling_sigma = d.coupling_sigma,
        cv_kind = d.cv_kind,
        num_cv_bins = d.num_cv_bins,
        num_stages = d.num_stages,
        equilibration_cycles = d.equilibration_cycles,
        production_cycles = d.production_cycles,
        sweeps_per_attempt = d.sweeps_per_attempt,
        eta_update_interval = d.eta_update_interval,
        eta_damping = d.eta_damping,
        history_interval = d.history_interval,
        verbose_interval = d.verbose_interval,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::FileConfig;
    use geetmmc::core::library::cv::CvKind;
    use tempfile::tempdir;

    #[test]
    fn rendered_defaults_parse_back_with_the_same_values() {
        let defaults = DefaultsConfig::default();
        let config = FileConfig::from_toml_str(&render_default_config(&defaults)).unwrap();

        let polymer = config.polymer.unwrap();
        assert_eq!(polymer.num_monomers, Some(defaults.num_monomers));
        assert_eq!(polymer.bond_k, Some(defaults.bond_k));
        assert_eq!(polymer.bond_r_eq, Some(defaults.bond_r_eq));
        let solvent = config.solvent.unwrap();
        assert_eq!(solvent.box_length, Some(defaults.box_length));
        assert_eq!(solvent.cutoff, None);
        let cv = config.collective_variable.unwrap();
        assert_eq!(cv.kind, Some(CvKind::RadiusOfGyration));
        let gee = config.gee.unwrap();
        assert_eq!(gee.num_stages, Some(defaults.num_stages));
        assert_eq!(gee.eta_damping, Some(defaults.eta_damping));
        assert_eq!(config.thermodynamics.unwrap().temperature, Some(1.0));
    }

    #[test]
    fn existing_file_is_kept_without_force() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("gee.toml");
        fs::write(&output, "seed = 1\n").unwrap();

        let result = run(InitConfigArgs {
            output: output.clone(),
            force: false,
        });
        assert!(matches!(result, Err(CliError::Argument(_))));
        assert_eq!(fs::read_to_string(&output).unwrap(), "seed = 1\n");

        run(InitConfigArgs {
            output: output.clone(),
            force: true,
        })
        .unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("[gee]"));
    }
}
