use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, IndexConfig};
use crate::cli::{IndexArgs, RunArgs};
use crate::error::{CliError, Result};
use geetmmc::core::forcefield::params::{
    ForcefieldParams, HarmonicBondParams, LennardJonesParams,
};
use geetmmc::engine::config::SimulationConfigBuilder;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref())?;

    apply_run_args(&mut file_config, args);
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let library_path = require_library(file_config.library.take())?;
    let forcefield = merge_forcefield(&file_config, &defaults);

    let thermo = file_config.thermodynamics.take().unwrap_or_default();
    let polymer = file_config.polymer.take().unwrap_or_default();
    let solvent = file_config.solvent.take().unwrap_or_default();
    let cv = file_config.collective_variable.take().unwrap_or_default();
    let gee = file_config.gee.take().unwrap_or_default();
    let diagnostics = file_config.diagnostics.take().unwrap_or_default();

    let temperature = thermo.temperature.unwrap_or(defaults.temperature);

    let core_config = SimulationConfigBuilder::new()
        .target_temperature(temperature)
        .library_temperature(thermo.library_temperature.unwrap_or(temperature))
        .forcefield(forcefield)
        .num_monomers(polymer.num_monomers.unwrap_or(defaults.num_monomers))
        .solvent_count(solvent.count.unwrap_or(defaults.solvent_count))
        .box_length(solvent.box_length.unwrap_or(defaults.box_length))
        .max_displacement(
            solvent
                .max_displacement
                .unwrap_or(defaults.max_displacement),
        )
        .initial_box(solvent.initial_box)
        .cv_kind(cv.kind.unwrap_or(defaults.cv_kind))
        .num_cv_bins(cv.num_bins.unwrap_or(defaults.num_cv_bins))
        .cv_range(cv.min, cv.max)
        .num_stages(gee.num_stages.unwrap_or(defaults.num_stages))
        .equilibration_cycles(
            gee.equilibration_cycles
                .unwrap_or(defaults.equilibration_cycles),
        )
        .production_cycles(gee.production_cycles.unwrap_or(defaults.production_cycles))
        .sweeps_per_attempt(gee.sweeps_per_attempt.unwrap_or(defaults.sweeps_per_attempt))
        .eta_update_interval(
            gee.eta_update_interval
                .unwrap_or(defaults.eta_update_interval),
        )
        .eta_damping(gee.eta_damping.unwrap_or(defaults.eta_damping))
        .history_interval(
            diagnostics
                .history_interval
                .unwrap_or(defaults.history_interval),
        )
        .verbose_interval(
            diagnostics
                .verbose_interval
                .unwrap_or(defaults.verbose_interval),
        )
        .seed(file_config.seed)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        library_path,
        index_path: file_config.index,
        output_dir: file_config
            .output_dir
            .unwrap_or_else(|| PathBuf::from(&defaults.output_dir)),
        core_config,
    })
}

pub fn build_index_config(args: &IndexArgs) -> Result<IndexConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref())?;

    if let Some(library) = &args.library {
        file_config.library = Some(library.clone());
    }
    if let Some(n) = args.num_monomers {
        file_config.polymer.get_or_insert_with(Default::default).num_monomers = Some(n);
    }
    if let Some(kind) = args.cv {
        file_config
            .collective_variable
            .get_or_insert_with(Default::default)
            .kind = Some(kind);
    }
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let library_path = require_library(file_config.library.take())?;
    let forcefield = merge_forcefield(&file_config, &defaults);
    let num_monomers = file_config
        .polymer
        .as_ref()
        .and_then(|p| p.num_monomers)
        .unwrap_or(defaults.num_monomers);
    if num_monomers == 0 {
        return Err(CliError::Config(
            "`polymer.num-monomers` must be at least 1".to_string(),
        ));
    }
    let cv_kind = file_config
        .collective_variable
        .as_ref()
        .and_then(|cv| cv.kind)
        .unwrap_or(defaults.cv_kind);

    Ok(IndexConfig {
        library_path,
        num_monomers,
        cv_kind,
        forcefield,
    })
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

fn require_library(library: Option<PathBuf>) -> Result<PathBuf> {
    library.ok_or_else(|| {
        CliError::Config(
            "A conformation library is required, either as `library` in the config file or via --library."
                .to_string(),
        )
    })
}

fn apply_run_args(config: &mut FileConfig, args: &RunArgs) {
    if let Some(library) = &args.library {
        config.library = Some(library.clone());
    }
    if let Some(index) = &args.index {
        config.index = Some(index.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = Some(output_dir.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(temperature) = args.temperature {
        config
            .thermodynamics
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
    }
    if let Some(n) = args.num_cv_bins {
        config
            .collective_variable
            .get_or_insert_with(Default::default)
            .num_bins = Some(n);
    }
    let gee = &mut config.gee;
    if let Some(n) = args.num_stages {
        gee.get_or_insert_with(Default::default).num_stages = Some(n);
    }
    if let Some(n) = args.production_cycles {
        gee.get_or_insert_with(Default::default).production_cycles = Some(n);
    }
}

fn merge_forcefield(file: &FileConfig, defaults: &DefaultsConfig) -> ForcefieldParams {
    let polymer = file.polymer.clone().unwrap_or_default();
    let solvent = file.solvent.clone().unwrap_or_default();
    let coupling = file.coupling.clone().unwrap_or_default();

    ForcefieldParams {
        bond: HarmonicBondParams {
            k: polymer.bond_k.unwrap_or(defaults.bond_k),
            r_eq: polymer.bond_r_eq.unwrap_or(defaults.bond_r_eq),
        },
        polymer: LennardJonesParams {
            epsilon: polymer.epsilon.unwrap_or(defaults.polymer_epsilon),
            sigma: polymer.sigma.unwrap_or(defaults.polymer_sigma),
        },
        solvent: LennardJonesParams {
            epsilon: solvent.epsilon.unwrap_or(defaults.solvent_epsilon),
            sigma: solvent.sigma.unwrap_or(defaults.solvent_sigma),
        },
        coupling: LennardJonesParams {
            epsilon: coupling.epsilon.unwrap_or(defaults.coupling_epsilon),
            sigma: coupling.sigma.unwrap_or(defaults.coupling_sigma),
        },
        solvent_cutoff: solvent.cutoff,
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "library" => config.library = Some(parse_value(key, value)?),
            "index" => config.index = Some(parse_value(key, value)?),
            "output-dir" => config.output_dir = Some(parse_value(key, value)?),
            "seed" => config.seed = Some(parse_value(key, value)?),
            _ => {
                let Some((section, field)) = key.split_once('.') else {
                    return Err(unsupported_key(key));
                };
                apply_section_value(&mut config, section, field, key, value)?;
            }
        }
    }
    Ok(config)
}

fn apply_section_value(
    config: &mut FileConfig,
    section: &str,
    field: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    match section {
        "thermodynamics" => {
            let t = config.thermodynamics.get_or_insert_with(Default::default);
            match field {
                "temperature" => t.temperature = Some(parse_value(key, value)?),
                "library-temperature" => t.library_temperature = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "polymer" => {
            let p = config.polymer.get_or_insert_with(Default::default);
            match field {
                "num-monomers" => p.num_monomers = Some(parse_value(key, value)?),
                "bond-k" => p.bond_k = Some(parse_value(key, value)?),
                "bond-r-eq" => p.bond_r_eq = Some(parse_value(key, value)?),
                "epsilon" => p.epsilon = Some(parse_value(key, value)?),
                "sigma" => p.sigma = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "solvent" => {
            let s = config.solvent.get_or_insert_with(Default::default);
            match field {
                "count" => s.count = Some(parse_value(key, value)?),
                "box-length" => s.box_length = Some(parse_value(key, value)?),
                "epsilon" => s.epsilon = Some(parse_value(key, value)?),
                "sigma" => s.sigma = Some(parse_value(key, value)?),
                "cutoff" => s.cutoff = Some(parse_value(key, value)?),
                "max-displacement" => s.max_displacement = Some(parse_value(key, value)?),
                "initial-box" => s.initial_box = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "coupling" => {
            let c = config.coupling.get_or_insert_with(Default::default);
            match field {
                "epsilon" => c.epsilon = Some(parse_value(key, value)?),
                "sigma" => c.sigma = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "collective-variable" => {
            let cv = config
                .collective_variable
                .get_or_insert_with(Default::default);
            match field {
                "kind" => cv.kind = Some(parse_value(key, value)?),
                "num-bins" => cv.num_bins = Some(parse_value(key, value)?),
                "min" => cv.min = Some(parse_value(key, value)?),
                "max" => cv.max = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "gee" => {
            let g = config.gee.get_or_insert_with(Default::default);
            match field {
                "num-stages" => g.num_stages = Some(parse_value(key, value)?),
                "equilibration-cycles" => g.equilibration_cycles = Some(parse_value(key, value)?),
                "production-cycles" => g.production_cycles = Some(parse_value(key, value)?),
                "sweeps-per-attempt" => g.sweeps_per_attempt = Some(parse_value(key, value)?),
                "eta-update-interval" => g.eta_update_interval = Some(parse_value(key, value)?),
                "eta-damping" => g.eta_damping = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        "diagnostics" => {
            let d = config.diagnostics.get_or_insert_with(Default::default);
            match field {
                "history-interval" => d.history_interval = Some(parse_value(key, value)?),
                "verbose-interval" => d.verbose_interval = Some(parse_value(key, value)?),
                _ => return Err(unsupported_key(key)),
            }
        }
        _ => return Err(unsupported_key(key)),
    }
    Ok(())
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geetmmc::core::library::cv::CvKind;
    use std::fs;
    use tempfile::tempdir;

    fn base_run_args() -> RunArgs {
        RunArgs {
            config: None,
            library: Some(PathBuf::from("confs.txt")),
            index: None,
            output_dir: None,
            seed: None,
            temperature: None,
            num_stages: None,
            num_cv_bins: None,
            production_cycles: None,
            set_values: vec![],
        }
    }

    fn base_index_args() -> IndexArgs {
        IndexArgs {
            library: Some(PathBuf::from("confs.txt")),
            output: PathBuf::from("index.csv"),
            config: None,
            num_monomers: None,
            cv: None,
            set_values: vec![],
        }
    }

    #[test]
    fn build_config_with_only_a_library_uses_defaults() {
        let app = build_config(&base_run_args()).expect("build ok");
        let cfg = app.core_config;
        let defaults = DefaultsConfig::default();

        assert_eq!(app.library_path, PathBuf::from("confs.txt"));
        assert_eq!(app.index_path, None);
        assert_eq!(app.output_dir, PathBuf::from(defaults.output_dir));
        assert_eq!(cfg.thermodynamics.target_temperature, 1.0);
        assert_eq!(cfg.thermodynamics.library_temperature, 1.0);
        assert_eq!(cfg.num_monomers, 20);
        assert_eq!(cfg.forcefield.bond.k, 3.8e7);
        assert_eq!(cfg.forcefield.bond.r_eq, 1.1225);
        assert_eq!(cfg.forcefield.solvent_cutoff, None);
        assert_eq!(cfg.solvent.count, 0);
        assert_eq!(cfg.solvent.box_length, 8.9);
        assert_eq!(cfg.solvent.max_displacement, 0.15);
        assert_eq!(cfg.cv.kind, CvKind::RadiusOfGyration);
        assert_eq!(cfg.cv.num_bins, 49);
        assert_eq!((cfg.cv.min, cfg.cv.max), (None, None));
        assert_eq!(cfg.gee.num_stages, 31);
        assert_eq!(cfg.gee.equilibration_cycles, 1000);
        assert_eq!(cfg.gee.production_cycles, 2000);
        assert_eq!(cfg.gee.sweeps_per_attempt, 10);
        assert_eq!(cfg.gee.eta_update_interval, 100);
        assert_eq!(cfg.gee.eta_damping, 0.2);
        assert_eq!(cfg.diagnostics.history_interval, 100);
        assert_eq!(cfg.diagnostics.verbose_interval, 500);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn build_config_without_a_library_is_an_error() {
        let mut args = base_run_args();
        args.library = None;
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn build_config_reads_file_and_merges() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("gee.toml");
        fs::write(
            &cfg_path,
            r#"
            library = "from-file.txt"
            index = "index.csv"
            seed = 5

            [thermodynamics]
            temperature = 1.5
            library-temperature = 2.0

            [polymer]
            num-monomers = 8
            sigma = 0.9

            [solvent]
            count = 27
            box-length = 5.0
            cutoff = 2.5

            [coupling]
            epsilon = 0.25

            [collective-variable]
            kind = "end-to-end-distance"
            num-bins = 5
            min = 0.0
            max = 4.0

            [gee]
            num-stages = 6
            eta-damping = 0.5
            "#,
        )
        .unwrap();

        let mut args = base_run_args();
        args.library = None;
        args.config = Some(cfg_path);

        let app = build_config(&args).expect("build ok");
        let cfg = app.core_config;

        assert_eq!(app.library_path, PathBuf::from("from-file.txt"));
        assert_eq!(app.index_path, Some(PathBuf::from("index.csv")));
        assert_eq!(cfg.seed, Some(5));
        assert_eq!(cfg.thermodynamics.target_temperature, 1.5);
        assert_eq!(cfg.thermodynamics.library_temperature, 2.0);
        assert_eq!(cfg.num_monomers, 8);
        assert_eq!(cfg.forcefield.polymer.sigma, 0.9);
        assert_eq!(cfg.forcefield.polymer.epsilon, 1.0);
        assert_eq!(cfg.forcefield.coupling.epsilon, 0.25);
        assert_eq!(cfg.forcefield.solvent_cutoff, Some(2.5));
        assert_eq!(cfg.solvent.count, 27);
        assert_eq!(cfg.cv.kind, CvKind::EndToEndDistance);
        assert_eq!((cfg.cv.min, cfg.cv.max), (Some(0.0), Some(4.0)));
        assert_eq!(cfg.gee.num_stages, 6);
        assert_eq!(cfg.gee.eta_damping, 0.5);
        assert_eq!(cfg.gee.production_cycles, 2000);
    }

    #[test]
    fn cli_arguments_override_the_file() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("gee.toml");
        fs::write(
            &cfg_path,
            "seed = 1\n[thermodynamics]\ntemperature = 2.0\n[gee]\nnum-stages = 6\n",
        )
        .unwrap();

        let mut args = base_run_args();
        args.config = Some(cfg_path);
        args.seed = Some(99);
        args.temperature = Some(0.8);
        args.num_stages = Some(9);
        args.num_cv_bins = Some(3);
        args.production_cycles = Some(10);
        args.output_dir = Some(PathBuf::from("results"));

        let app = build_config(&args).unwrap();
        let cfg = app.core_config;
        assert_eq!(cfg.seed, Some(99));
        assert_eq!(cfg.thermodynamics.target_temperature, 0.8);
        assert_eq!(cfg.thermodynamics.library_temperature, 0.8);
        assert_eq!(cfg.gee.num_stages, 9);
        assert_eq!(cfg.cv.num_bins, 3);
        assert_eq!(cfg.gee.production_cycles, 10);
        assert_eq!(app.output_dir, PathBuf::from("results"));
    }

    #[test]
    fn set_values_take_precedence_over_cli_arguments() {
        let mut args = base_run_args();
        args.num_stages = Some(9);
        args.set_values = vec![
            "gee.num-stages=12".to_string(),
            "solvent.initial-box = box.txt".to_string(),
            "collective-variable.kind=ree".to_string(),
            "diagnostics.history-interval=7".to_string(),
        ];

        let cfg = build_config(&args).unwrap().core_config;
        assert_eq!(cfg.gee.num_stages, 12);
        assert_eq!(cfg.solvent.initial_box, Some(PathBuf::from("box.txt")));
        assert_eq!(cfg.cv.kind, CvKind::EndToEndDistance);
        assert_eq!(cfg.diagnostics.history_interval, 7);
    }

    #[test]
    fn malformed_or_unknown_set_values_are_rejected() {
        for bad in ["gee.num-stages", "gee.num-lambdas=3", "bogus=1", "gee.num-stages=x"] {
            let mut args = base_run_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_merged_values_surface_as_config_errors() {
        let mut args = base_run_args();
        args.set_values = vec!["gee.eta-damping=1.5".to_string()];
        match build_config(&args) {
            Err(CliError::Config(msg)) => assert!(msg.contains("eta_damping") || msg.contains("damping")),
            Err(other) => panic!("expected a config error, got {other}"),
            Ok(_) => panic!("expected a config error"),
        }
    }

    #[test]
    fn index_config_honours_overrides() {
        let mut args = base_index_args();
        args.num_monomers = Some(4);
        args.cv = Some(CvKind::EndToEndDistance);
        args.set_values = vec!["polymer.bond-k=10.0".to_string()];

        let index = build_index_config(&args).unwrap();
        assert_eq!(index.library_path, PathBuf::from("confs.txt"));
        assert_eq!(index.num_monomers, 4);
        assert_eq!(index.cv_kind, CvKind::EndToEndDistance);
        assert_eq!(index.forcefield.bond.k, 10.0);
    }

    #[test]
    fn index_config_rejects_zero_monomers() {
        let mut args = base_index_args();
        args.num_monomers = Some(0);
        assert!(matches!(build_index_config(&args), Err(CliError::Config(_))));
    }
}
