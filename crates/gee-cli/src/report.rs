use crate::error::{CliError, Result};
use geetmmc::engine::config::SimulationConfig;
use geetmmc::engine::free_energy::FreeEnergy;
use geetmmc::engine::walker::{GeeAttemptRecord, MoveStats};
use geetmmc::workflows::run::{BinResult, RunResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE: &str = "summary.toml";
pub const PROFILES_FILE: &str = "profiles.csv";
pub const HISTORY_FILE: &str = "stage_history.csv";

/// Attempt records kept in the summary for the first diagnostic bin.
const REPORTED_ATTEMPTS: usize = 100;

pub struct ReportPaths {
    pub summary: PathBuf,
    pub profiles: PathBuf,
    pub history: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Summary<'a> {
    seed: u64,
    target_temperature: f64,
    library_temperature: f64,
    cv_kind: String,
    num_stages: usize,
    lambdas: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_bin: Option<usize>,
    library_counts: &'a [usize],
    offsets: &'a [FreeEnergy],
    skipped_bins: &'a [usize],
    diagnostic_bins: &'a [usize],
    total_reselection_failures: u64,
    binning: BinningSummary,
    acceptance: AcceptanceSummary,
    bins: Vec<BinSummary<'a>>,
    attempts: &'a [GeeAttemptRecord],
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct BinningSummary {
    min: f64,
    max: f64,
    width: f64,
    num_bins: usize,
    centers: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct AcceptanceSummary {
    solvent_attempted: u64,
    solvent_accepted: u64,
    solvent_rate: f64,
    gee_attempted: u64,
    gee_accepted: u64,
    gee_rate: f64,
}

impl AcceptanceSummary {
    fn new(solvent: MoveStats, gee: MoveStats) -> Self {
        Self {
            solvent_attempted: solvent.attempted,
            solvent_accepted: solvent.accepted,
            solvent_rate: solvent.acceptance_rate(),
            gee_attempted: gee.attempted,
            gee_accepted: gee.accepted,
            gee_rate: gee.acceptance_rate(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct BinSummary<'a> {
    bin: usize,
    cv_center: f64,
    library_count: usize,
    offset: FreeEnergy,
    free_energy: FreeEnergy,
    intra_profile: &'a [FreeEnergy],
    global_profile: &'a [FreeEnergy],
    eta: &'a [f64],
    visits: &'a [u64],
    collection: &'a [[f64; 3]],
    acceptance: AcceptanceSummary,
    reselections: u64,
    reselection_failures: u64,
}

impl<'a> BinSummary<'a> {
    fn new(bin: &'a BinResult) -> Self {
        Self {
            bin: bin.bin,
            cv_center: bin.cv_center,
            library_count: bin.library_count,
            offset: bin.offset,
            free_energy: bin.global_profile.last().unwrap_or(FreeEnergy::Unreachable),
            intra_profile: bin.intra_profile.values(),
            global_profile: bin.global_profile.values(),
            eta: bin.walker.final_eta.values(),
            visits: &bin.walker.visits,
            collection: bin.walker.collection.rows(),
            acceptance: AcceptanceSummary::new(bin.walker.solvent_moves, bin.walker.gee_moves),
            reselections: bin.walker.reselections,
            reselection_failures: bin.walker.reselection_failures,
        }
    }
}

#[derive(Serialize)]
struct ProfileRow {
    bin: usize,
    cv_center: f64,
    stage: usize,
    lambda: f64,
    intra: FreeEnergy,
    global: FreeEnergy,
}

#[derive(Serialize)]
struct HistoryRow {
    bin: usize,
    step: u64,
    stage: usize,
    lambda: f64,
}

/// Writes the summary, the per-stage profile table and the stage trajectories
/// of the diagnostic bins into `output_dir`, creating it if needed.
pub fn write_reports(
    result: &RunResult,
    config: &SimulationConfig,
    output_dir: &Path,
) -> Result<ReportPaths> {
    fs::create_dir_all(output_dir)?;

    let paths = ReportPaths {
        summary: output_dir.join(SUMMARY_FILE),
        profiles: output_dir.join(PROFILES_FILE),
        history: output_dir.join(HISTORY_FILE),
    };

    write_summary(result, config, &paths.summary)?;
    write_profiles(result, &paths.profiles)?;
    write_history(result, &paths.history)?;

    info!("Reports written to {}", output_dir.display());
    Ok(paths)
}

fn write_summary(result: &RunResult, config: &SimulationConfig, path: &Path) -> Result<()> {
    let attempts = result
        .diagnostic_bins
        .first()
        .and_then(|&bin| result.bin(bin))
        .map(|bin| {
            let all = &bin.walker.attempts;
            &all[all.len().saturating_sub(REPORTED_ATTEMPTS)..]
        })
        .unwrap_or(&[]);

    let summary = Summary {
        seed: result.seed,
        target_temperature: config.thermodynamics.target_temperature,
        library_temperature: config.thermodynamics.library_temperature,
        cv_kind: config.cv.kind.to_string(),
        num_stages: result.lambdas.len(),
        lambdas: &result.lambdas,
        reference_bin: result.reference_bin,
        library_counts: &result.library_counts,
        offsets: &result.offsets,
        skipped_bins: &result.skipped_bins,
        diagnostic_bins: &result.diagnostic_bins,
        total_reselection_failures: result.total_reselection_failures(),
        binning: BinningSummary {
            min: result.binning.min(),
            max: result.binning.max(),
            width: result.binning.width(),
            num_bins: result.binning.num_bins(),
            centers: result.binning.centers(),
        },
        acceptance: AcceptanceSummary::new(result.solvent_moves, result.gee_moves),
        bins: result.bins.iter().map(BinSummary::new).collect(),
        attempts,
    };

    let content = toml::to_string(&summary).map_err(|e| CliError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    fs::write(path, content)?;
    Ok(())
}

fn write_profiles(result: &RunResult, path: &Path) -> Result<()> {
    let report_err = |e: csv::Error| CliError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;

    for bin in &result.bins {
        let stages = bin
            .intra_profile
            .values()
            .iter()
            .zip(bin.global_profile.values());
        for (stage, (&intra, &global)) in stages.enumerate() {
            writer
                .serialize(ProfileRow {
                    bin: bin.bin,
                    cv_center: bin.cv_center,
                    stage,
                    lambda: result.lambdas.get(stage).copied().unwrap_or(f64::NAN),
                    intra,
                    global,
                })
                .map_err(report_err)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_history(result: &RunResult, path: &Path) -> Result<()> {
    let report_err = |e: csv::Error| CliError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(report_err)?;
    writer
        .write_record(["bin", "step", "stage", "lambda"])
        .map_err(report_err)?;

    for bin in result
        .diagnostic_bins
        .iter()
        .filter_map(|&b| result.bin(b))
    {
        for sample in &bin.walker.history {
            writer
                .serialize(HistoryRow {
                    bin: bin.bin,
                    step: sample.step,
                    stage: sample.stage,
                    lambda: sample.lambda,
                })
                .map_err(report_err)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geetmmc::core::forcefield::params::ForcefieldParams;
    use geetmmc::core::library::cv::CvKind;
    use geetmmc::core::library::source::MemoryLibrary;
    use geetmmc::core::models::polymer::PolymerConformation;
    use geetmmc::engine::config::SimulationConfigBuilder;
    use geetmmc::engine::progress::ProgressReporter;
    use geetmmc::workflows::run::run;
    use serde::Deserialize;
    use tempfile::tempdir;

    fn chain(bend: f64) -> PolymerConformation {
        PolymerConformation::from_coordinates(&[
            [0.0, 0.0, 0.0],
            [1.1, 0.0, 0.0],
            [1.1 + 1.1 * bend.cos(), 1.1 * bend.sin(), 0.0],
        ])
    }

    fn small_run() -> (RunResult, SimulationConfig) {
        let config = SimulationConfigBuilder::new()
            .target_temperature(1.0)
            .forcefield(ForcefieldParams::default())
            .num_monomers(3)
            .solvent_count(3)
            .box_length(5.0)
            .cv_kind(CvKind::EndToEndDistance)
            .num_cv_bins(3)
            .num_stages(3)
            .equilibration_cycles(5)
            .production_cycles(20)
            .history_interval(2)
            .seed(Some(3))
            .build()
            .unwrap();
        let library =
            MemoryLibrary::from_conformations(vec![chain(0.0), chain(0.05), chain(2.0)]);
        let index = library.index(config.cv.kind, &config.forcefield);
        let result = run(&config, &index, &library, &ProgressReporter::new()).unwrap();
        (result, config)
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct SummaryBack {
        seed: u64,
        offsets: Vec<FreeEnergy>,
        library_counts: Vec<usize>,
        skipped_bins: Vec<usize>,
        bins: Vec<toml::Table>,
    }

    #[test]
    fn summary_round_trips_unreachable_offsets_as_inf() {
        let (result, config) = small_run();
        let dir = tempdir().unwrap();
        let paths = write_reports(&result, &config, dir.path()).unwrap();

        let content = fs::read_to_string(&paths.summary).unwrap();
        assert!(content.contains("inf"));
        let back: SummaryBack = toml::from_str(&content).unwrap();

        assert_eq!(back.seed, 3);
        assert_eq!(back.library_counts, vec![1, 0, 2]);
        assert_eq!(back.skipped_bins, vec![1]);
        assert_eq!(back.offsets[0], FreeEnergy::ZERO);
        assert!(back.offsets[1].is_unreachable());
        assert!(back.offsets[2].finite().is_some());
        assert_eq!(back.bins.len(), 2);
        assert!(back.bins[0].contains_key("collection"));
        assert!(back.bins[0].contains_key("visits"));
    }

    #[test]
    fn profiles_have_one_row_per_stage_of_each_run_bin() {
        let (result, config) = small_run();
        let dir = tempdir().unwrap();
        let paths = write_reports(&result, &config, dir.path()).unwrap();

        let mut reader = csv::Reader::from_path(&paths.profiles).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["bin", "cv_center", "stage", "lambda", "intra", "global"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2 * 3);
        assert_eq!(&rows[0][0], "0");
        assert_eq!(rows[0][4].parse::<f64>().unwrap(), 0.0);
        assert_eq!(&rows[3][0], "2");
        assert_eq!(&rows[5][2], "2");
        assert_eq!(rows[5][3].parse::<f64>().unwrap(), 1.0);
    }

    #[test]
    fn stage_history_lists_samples_of_diagnostic_bins() {
        let (result, config) = small_run();
        let dir = tempdir().unwrap();
        let paths = write_reports(&result, &config, dir.path()).unwrap();

        let expected: usize = result
            .diagnostic_bins
            .iter()
            .filter_map(|&b| result.bin(b))
            .map(|b| b.walker.history.len())
            .sum();
        assert!(expected > 0);

        let mut reader = csv::Reader::from_path(&paths.history).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), expected);
        for row in rows {
            let stage: usize = row[2].parse().unwrap();
            assert!(stage < 3);
        }
    }

    #[test]
    fn output_directory_is_created() {
        let (result, config) = small_run();
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        write_reports(&result, &config, &nested).unwrap();
        assert!(nested.join(SUMMARY_FILE).is_file());
        assert!(nested.join(PROFILES_FILE).is_file());
        assert!(nested.join(HISTORY_FILE).is_file());
    }
}
