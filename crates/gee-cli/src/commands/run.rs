use crate::cli::RunArgs;
use crate::commands::index::index_library;
use crate::config::builder::build_config;
use crate::config::models::AppConfig;
use crate::error::Result;
use crate::report::write_reports;
use crate::utils::progress::CliProgressHandler;
use geetmmc::core::io::conformations::LibraryFile;
use geetmmc::core::library::index::LibraryIndex;
use geetmmc::engine::progress::ProgressReporter;
use geetmmc::workflows;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let app_config = build_config(&args)?;
    execute(&app_config, true)
}

fn execute(app_config: &AppConfig, show_progress: bool) -> Result<()> {
    let config = &app_config.core_config;
    let library = LibraryFile::new(&app_config.library_path, config.num_monomers);

    let index = match &app_config.index_path {
        Some(path) => {
            info!("Loading library index from {:?}", path);
            LibraryIndex::read_csv(path)?
        }
        None => index_library(&library, config.cv.kind, &config.forcefield)?,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = if show_progress {
        ProgressReporter::with_callback(progress_handler.get_callback())
    } else {
        ProgressReporter::new()
    };

    println!(
        "Starting GEE-TMMC over {} conformation(s) in {} CV bins...",
        index.len(),
        config.cv.num_bins
    );
    info!("Invoking the core GEE-TMMC workflow...");

    let result = workflows::run::run(config, &index, &library, &reporter)?;

    info!(
        "Workflow finished: {} bin(s) sampled, {} skipped.",
        result.bins.len(),
        result.skipped_bins.len()
    );
    if result.bins.is_empty() {
        warn!("Workflow completed but no CV bin could be sampled.");
        println!("Warning: no CV bin could be sampled; reports contain no profiles.");
    }
    let failures = result.total_reselection_failures();
    if failures > 0 {
        warn!(failures, "Some conformation reselections failed.");
    }

    let paths = write_reports(&result, config, &app_config.output_dir)?;

    if let Some(reference) = result.reference_bin {
        println!("✓ Reference bin: {} (seed {})", reference, result.seed);
    }
    for bin in &result.bins {
        println!(
            "  bin {:>3}  cv {:>8.4}  n {:>6}  ΔF {}",
            bin.bin,
            bin.cv_center,
            bin.library_count,
            bin.global_profile
                .last()
                .map(|f| format!("{:.4}", f))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
    println!("✓ Summary written to: {}", paths.summary.display());
    println!("✓ Profiles written to: {}", paths.profiles.display());
    println!("✓ Stage history written to: {}", paths.history.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::report::{PROFILES_FILE, SUMMARY_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const LIBRARY: &str = "\
# Conformation 0
0.0 0.0 0.0
1.1 0.0 0.0
2.2 0.0 0.0
# Conformation 1
0.0 0.0 0.0
1.1 0.0 0.0
1.1 1.1 0.0
# Conformation 2
0.0 0.0 0.0
1.1 0.0 0.0
2.1 0.3 0.0
";

    fn args(library: &Path, output_dir: &Path) -> RunArgs {
        RunArgs {
            config: None,
            library: Some(library.to_path_buf()),
            index: None,
            output_dir: Some(output_dir.to_path_buf()),
            seed: Some(17),
            temperature: None,
            num_stages: Some(3),
            num_cv_bins: Some(2),
            production_cycles: Some(20),
            set_values: vec![
                "polymer.num-monomers=3".to_string(),
                "solvent.count=2".to_string(),
                "solvent.box-length=5.0".to_string(),
                "gee.equilibration-cycles=5".to_string(),
                "gee.sweeps-per-attempt=1".to_string(),
                "gee.eta-update-interval=5".to_string(),
            ],
        }
    }

    #[test]
    fn run_command_writes_all_reports() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("confs.txt");
        fs::write(&library, LIBRARY).unwrap();
        let out = dir.path().join("out");

        let app = build_config(&args(&library, &out)).unwrap();
        execute(&app, false).unwrap();

        let summary = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        let table: toml::Table = toml::from_str(&summary).unwrap();
        assert_eq!(table["seed"].as_integer(), Some(17));
        assert_eq!(table["num-stages"].as_integer(), Some(3));
        assert!(out.join(PROFILES_FILE).is_file());
    }

    #[test]
    fn run_command_accepts_a_prebuilt_index() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("confs.txt");
        fs::write(&library, LIBRARY).unwrap();
        let out = dir.path().join("out");

        let mut app = build_config(&args(&library, &out)).unwrap();
        let file = LibraryFile::new(&library, 3);
        let index = index_library(&file, app.core_config.cv.kind, &app.core_config.forcefield)
            .unwrap();
        let index_path = dir.path().join("index.csv");
        index.write_csv(&index_path).unwrap();
        app.index_path = Some(index_path);

        execute(&app, false).unwrap();
        assert!(out.join(SUMMARY_FILE).is_file());
    }

    #[test]
    fn missing_index_file_fails_before_sampling() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("confs.txt");
        fs::write(&library, LIBRARY).unwrap();
        let out = dir.path().join("out");

        let mut app = build_config(&args(&library, &out)).unwrap();
        app.index_path = Some(dir.path().join("nope.csv"));

        assert!(matches!(execute(&app, false), Err(CliError::Library(_))));
        assert!(!out.exists());
    }
}
