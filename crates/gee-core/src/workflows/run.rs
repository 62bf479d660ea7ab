use crate::core::io::solvent::read_solvent_box_from_path;
use crate::core::library::binning::CvBinning;
use crate::core::library::index::{LibraryEntry, LibraryIndex};
use crate::core::library::source::ConformationSource;
use crate::core::models::schedule::GrowthSchedule;
use crate::core::models::solvent::{SimulationBox, SolventConfiguration};
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::free_energy::{
    FreeEnergy, FreeEnergyProfile, combine, inter_bin_offsets, intra_stage_profile,
    reference_bin,
};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::walker::{MoveStats, Walker, WalkerContext, WalkerOutput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, thread_rng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Results for one CV bin whose walker ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinResult {
    pub bin: usize,
    pub cv_center: f64,
    pub library_count: usize,
    pub intra_profile: FreeEnergyProfile,
    pub offset: FreeEnergy,
    pub global_profile: FreeEnergyProfile,
    pub walker: WalkerOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Global seed the per-bin generators were derived from.
    pub seed: u64,
    pub lambdas: Vec<f64>,
    pub binning: CvBinning,
    pub library_counts: Vec<usize>,
    pub reference_bin: Option<usize>,
    pub offsets: Vec<FreeEnergy>,
    pub bins: Vec<BinResult>,
    pub skipped_bins: Vec<usize>,
    /// First, middle and last non-empty bins, which keep full diagnostics.
    pub diagnostic_bins: Vec<usize>,
    pub solvent_moves: MoveStats,
    pub gee_moves: MoveStats,
}

impl RunResult {
    pub fn bin(&self, bin: usize) -> Option<&BinResult> {
        self.bins.iter().find(|b| b.bin == bin)
    }

    pub fn total_reselection_failures(&self) -> u64 {
        self.bins.iter().map(|b| b.walker.reselection_failures).sum()
    }
}

/// Runs one independent walker per non-empty CV bin and stitches the per-bin
/// profiles into a global free-energy surface.
///
/// Empty bins and bins whose first conformation cannot be loaded are skipped
/// and listed in [`RunResult::skipped_bins`].
#[instrument(skip_all, name = "gee_workflow")]
pub fn run<S: ConformationSource + ?Sized>(
    config: &SimulationConfig,
    index: &LibraryIndex,
    source: &S,
    reporter: &ProgressReporter,
) -> Result<RunResult, EngineError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let schedule = GrowthSchedule::new(config.gee.num_stages)?;
    if config.has_temperature_mismatch() {
        warn!(
            library = config.thermodynamics.library_temperature,
            target = config.thermodynamics.target_temperature,
            "Library temperature differs from the target; inter-bin offsets use the target temperature."
        );
    }

    let binning = CvBinning::covering(
        config.cv.min,
        config.cv.max,
        index.cv_range(),
        config.cv.num_bins,
    );
    let subsets = binning.partition(index);
    let library_counts: Vec<usize> = subsets.iter().map(Vec::len).collect();
    let diagnostic_bins = diagnostic_bins(&library_counts);
    let solvent_template = load_solvent_template(config);
    let seed = config.seed.unwrap_or_else(|| thread_rng().r#gen());
    info!(
        seed,
        bins = binning.num_bins(),
        non_empty = library_counts.iter().filter(|&&n| n > 0).count(),
        cv_min = binning.min(),
        cv_max = binning.max(),
        "Prepared CV bins."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Sampling ===
    reporter.report(Progress::PhaseStart { name: "Sampling" });
    reporter.report(Progress::TaskStart {
        total_walkers: library_counts.iter().filter(|&&n| n > 0).count() as u64,
    });
    let ctx = WalkerContext::new(config, &schedule, source, solvent_template.as_ref());
    let run_one = |bin: usize| {
        let result = run_bin(
            bin,
            ctx,
            &subsets[bin],
            seed,
            diagnostic_bins.contains(&bin),
        );
        if result.is_ok() {
            reporter.report(Progress::WalkerFinished { bin });
        }
        result
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<_> = (0..subsets.len()).map(run_one).collect();

    #[cfg(feature = "parallel")]
    let outcomes: Vec<_> = (0..subsets.len()).into_par_iter().map(run_one).collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Estimation ===
    reporter.report(Progress::PhaseStart { name: "Estimation" });
    let beta = config.beta();
    let reference = reference_bin(&library_counts);
    let offsets = match reference {
        Some(r) => inter_bin_offsets(&library_counts, r, beta),
        None => vec![FreeEnergy::Unreachable; library_counts.len()],
    };

    let mut bins = Vec::new();
    let mut skipped_bins = Vec::new();
    let mut solvent_moves = MoveStats::default();
    let mut gee_moves = MoveStats::default();
    for (bin, outcome) in outcomes.into_iter().enumerate() {
        let walker = match outcome {
            Ok(walker) => walker,
            Err(e @ (EngineError::EmptyBin { .. } | EngineError::ConformationLoad { .. })) => {
                if library_counts[bin] > 0 {
                    warn!(bin, error = %e, "Skipping bin.");
                    reporter.report(Progress::Message(format!("bin {bin} skipped: {e}")));
                } else {
                    info!(bin, "{}; skipping.", e);
                }
                skipped_bins.push(bin);
                continue;
            }
            Err(e) => return Err(e),
        };
        if walker.reselection_failures > 0 {
            warn!(
                bin,
                failures = walker.reselection_failures,
                reselections = walker.reselections,
                "Walker could not always reselect a conformation."
            );
        }
        solvent_moves += walker.solvent_moves;
        gee_moves += walker.gee_moves;

        let intra_profile = intra_stage_profile(&walker.collection, beta);
        let global_profile = combine(&intra_profile, offsets[bin]);
        bins.push(BinResult {
            bin,
            cv_center: binning.center(bin),
            library_count: library_counts[bin],
            intra_profile,
            offset: offsets[bin],
            global_profile,
            walker,
        });
    }
    if reference.is_none() {
        warn!("No populated reference bin; global profiles are undefined.");
    }
    info!(
        completed = bins.len(),
        skipped = skipped_bins.len(),
        solvent_acceptance = solvent_moves.acceptance_rate(),
        gee_acceptance = gee_moves.acceptance_rate(),
        "Run complete."
    );
    reporter.report(Progress::PhaseFinish);

    Ok(RunResult {
        seed,
        lambdas: schedule.lambdas().to_vec(),
        binning,
        library_counts,
        reference_bin: reference,
        offsets,
        bins,
        skipped_bins,
        diagnostic_bins,
        solvent_moves,
        gee_moves,
    })
}

fn run_bin<S: ConformationSource + ?Sized>(
    bin: usize,
    ctx: WalkerContext<'_, S>,
    entries: &[LibraryEntry],
    seed: u64,
    keep_diagnostics: bool,
) -> Result<WalkerOutput, EngineError> {
    let rng = StdRng::seed_from_u64(bin_seed(seed, bin));
    let walker = Walker::new(bin, ctx, entries, rng)?.with_diagnostics(keep_diagnostics);
    Ok(walker.run())
}

/// Mixes the global seed with the bin index so each walker has its own stream.
pub fn bin_seed(seed: u64, bin: usize) -> u64 {
    let mut z = seed ^ (bin as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// First, middle and last of the non-empty bins, without duplicates.
pub fn diagnostic_bins(counts: &[usize]) -> Vec<usize> {
    let non_empty: Vec<usize> = (0..counts.len()).filter(|&b| counts[b] > 0).collect();
    let (Some(&first), Some(&last)) = (non_empty.first(), non_empty.last()) else {
        return Vec::new();
    };
    let mut picked = vec![first, non_empty[non_empty.len() / 2], last];
    picked.dedup();
    picked
}

/// Reads the configured initial solvent box, or returns `None` so walkers
/// draw random configurations instead.
fn load_solvent_template(config: &SimulationConfig) -> Option<SolventConfiguration> {
    let path = config.solvent.initial_box.as_ref()?;
    let simulation_box = SimulationBox::new(config.solvent.box_length);
    match read_solvent_box_from_path(path, config.solvent.count, simulation_box) {
        Ok(template) => {
            info!(path = %path.display(), count = template.len(), "Loaded initial solvent box.");
            Some(template)
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Could not use the initial solvent box; falling back to random solvent positions."
            );
            None
        }
    }
}
