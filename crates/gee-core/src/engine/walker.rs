use super::bias::BiasWeights;
use super::collection::{CollectionMatrix, Transition};
use super::config::SimulationConfig;
use super::error::EngineError;
use super::utils::sampling::{
    acceptance_probability, collection_weight, fetch_conformation, log_bias_ratio,
    metropolis_accept, random_displacement,
};
use crate::core::forcefield::energy::{
    soft_core_polymer_solvent_energy, solvent_particle_energy, solvent_solvent_energy,
};
use crate::core::library::index::LibraryEntry;
use crate::core::library::source::ConformationSource;
use crate::core::models::polymer::PolymerConformation;
use crate::core::models::schedule::GrowthSchedule;
use crate::core::models::solvent::{SimulationBox, SolventConfiguration};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::{debug, info, instrument, trace, warn};

/// Consecutive failed reselections after which a warning is raised.
const RESELECTION_WARNING_STREAK: u64 = 3;

/// Direction of the growth-stage walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthPhase {
    Growing,
    Shrinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveStats {
    pub attempted: u64,
    pub accepted: u64,
}

impl MoveStats {
    #[inline]
    pub fn record(&mut self, accepted: bool) {
        self.attempted += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

impl AddAssign for MoveStats {
    fn add_assign(&mut self, rhs: Self) {
        self.attempted += rhs.attempted;
        self.accepted += rhs.accepted;
    }
}

/// Everything known about one growth-stage attempt.
///
/// Fields describing the target are `None` when the walker was pinned at a
/// boundary and no candidate stage existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeeAttemptRecord {
    pub step: u64,
    pub from_stage: usize,
    pub to_stage: Option<usize>,
    pub u_from: f64,
    pub u_to: Option<f64>,
    pub delta_u: Option<f64>,
    pub eta_from: f64,
    pub eta_to: Option<f64>,
    pub eta_ratio: Option<f64>,
    pub boltzmann_factor: Option<f64>,
    pub boundary_correction: f64,
    pub acceptance_probability: f64,
    pub accepted: bool,
    pub collection_weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSample {
    pub step: u64,
    pub stage: usize,
    pub lambda: f64,
}

/// What a walker hands back once its cycle budget is spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerOutput {
    pub bin: usize,
    pub collection: CollectionMatrix,
    pub visits: Vec<u64>,
    pub solvent_moves: MoveStats,
    pub gee_moves: MoveStats,
    pub final_eta: BiasWeights,
    pub history: Vec<StageSample>,
    pub attempts: Vec<GeeAttemptRecord>,
    pub reselections: u64,
    pub reselection_failures: u64,
}

/// Read-only inputs shared by every walker of a run.
pub struct WalkerContext<'a, S: ConformationSource + ?Sized> {
    pub config: &'a SimulationConfig,
    pub schedule: &'a GrowthSchedule,
    pub source: &'a S,
    /// Solvent configuration restored at every round trip; a fresh random one
    /// is drawn when absent.
    pub solvent_template: Option<&'a SolventConfiguration>,
}

impl<S: ConformationSource + ?Sized> Clone for WalkerContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ConformationSource + ?Sized> Copy for WalkerContext<'_, S> {}

impl<'a, S: ConformationSource + ?Sized> WalkerContext<'a, S> {
    pub fn new(
        config: &'a SimulationConfig,
        schedule: &'a GrowthSchedule,
        source: &'a S,
        solvent_template: Option<&'a SolventConfiguration>,
    ) -> Self {
        Self {
            config,
            schedule,
            source,
            solvent_template,
        }
    }
}

/// One Markov chain over growth stages for a single CV bin.
///
/// Per outer cycle it relaxes the solvent, attempts one biased stage move,
/// books the attempt in its collection matrix and, after each full
/// grow-then-shrink round trip, swaps in a fresh library conformation.
pub struct Walker<'a, S: ConformationSource + ?Sized, R: Rng> {
    bin: usize,
    ctx: WalkerContext<'a, S>,
    entries: &'a [LibraryEntry],
    rng: R,

    polymer: PolymerConformation,
    solvent: SolventConfiguration,
    start_solvent: SolventConfiguration,
    stage: usize,
    phase: GrowthPhase,
    eta: BiasWeights,
    collection: CollectionMatrix,
    visits: Vec<u64>,

    step: u64,
    solvent_moves: MoveStats,
    gee_moves: MoveStats,
    history: Vec<StageSample>,
    attempts: Vec<GeeAttemptRecord>,
    keep_diagnostics: bool,
    reselections: u64,
    reselection_failures: u64,
    failure_streak: u64,
}

impl<'a, S: ConformationSource + ?Sized, R: Rng> Walker<'a, S, R> {
    /// Creates a walker at stage 0, growing, with uniform bias weights.
    ///
    /// # Errors
    ///
    /// Fails if the bin has no conformations or the first one cannot be loaded.
    pub fn new(
        bin: usize,
        ctx: WalkerContext<'a, S>,
        entries: &'a [LibraryEntry],
        mut rng: R,
    ) -> Result<Self, EngineError> {
        let (polymer, _) = fetch_conformation(ctx.source, entries, bin, &mut rng)?;
        let solvent = initial_solvent(&ctx, &mut rng);
        let num_stages = ctx.schedule.num_stages();
        Ok(Self {
            bin,
            ctx,
            entries,
            rng,
            polymer,
            start_solvent: solvent.clone(),
            solvent,
            stage: 0,
            phase: GrowthPhase::Growing,
            eta: BiasWeights::uniform(num_stages),
            collection: CollectionMatrix::new(num_stages),
            visits: vec![0; num_stages],
            step: 0,
            solvent_moves: MoveStats::default(),
            gee_moves: MoveStats::default(),
            history: Vec::new(),
            attempts: Vec::new(),
            keep_diagnostics: false,
            reselections: 0,
            reselection_failures: 0,
            failure_streak: 0,
        })
    }

    /// Starts from the given bias weights instead of all ones.
    pub fn with_bias(mut self, eta: BiasWeights) -> Self {
        debug_assert_eq!(eta.len(), self.ctx.schedule.num_stages());
        self.eta = eta;
        self
    }

    /// Keeps the stage trajectory and every attempt record in the output,
    /// not just in the trace log.
    pub fn with_diagnostics(mut self, keep: bool) -> Self {
        self.keep_diagnostics = keep;
        self
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn phase(&self) -> GrowthPhase {
        self.phase
    }

    /// Runs equilibration then production and returns the accumulated statistics.
    #[instrument(level = "info", skip_all, fields(bin = self.bin))]
    pub fn run(mut self) -> WalkerOutput {
        let config = self.ctx.config;
        let (history_interval, verbose_interval) =
            config.diagnostics.resolved(config.total_steps());

        self.sample_history();
        for (phase_name, cycles) in [
            ("equilibration", config.gee.equilibration_cycles),
            ("production", config.gee.production_cycles),
        ] {
            debug!(cycles, "Starting {} phase.", phase_name);
            for cycle in 0..cycles {
                self.outer_cycle(history_interval, verbose_interval);
                let interval = config.gee.eta_update_interval;
                if interval > 0 && cycle > 0 && cycle % interval == 0 {
                    self.eta
                        .update(&self.collection, config.beta(), config.gee.eta_damping);
                    trace!(eta = ?self.eta.values(), "Bias weights updated.");
                }
            }
        }

        info!(
            solvent_acceptance = self.solvent_moves.acceptance_rate(),
            gee_acceptance = self.gee_moves.acceptance_rate(),
            reselections = self.reselections,
            reselection_failures = self.reselection_failures,
            "Walker finished."
        );

        WalkerOutput {
            bin: self.bin,
            collection: self.collection,
            visits: self.visits,
            solvent_moves: self.solvent_moves,
            gee_moves: self.gee_moves,
            final_eta: self.eta,
            history: self.history,
            attempts: self.attempts,
            reselections: self.reselections,
            reselection_failures: self.reselection_failures,
        }
    }

    fn outer_cycle(&mut self, history_interval: u64, verbose_interval: u64) {
        for _ in 0..self.ctx.config.gee.sweeps_per_attempt {
            self.solvent_sweep();
            self.step += 1;
            if self.step % history_interval == 0 {
                self.sample_history();
            }
            if self.step % verbose_interval == 0 {
                debug!(
                    step = self.step,
                    stage = self.stage,
                    phase = ?self.phase,
                    solvent_acceptance = self.solvent_moves.acceptance_rate(),
                    gee_acceptance = self.gee_moves.acceptance_rate(),
                    "Walker status."
                );
            }
        }

        self.attempt_stage_move();
        self.visits[self.stage] += 1;

        match self.phase {
            GrowthPhase::Shrinking if self.stage == 0 => {
                self.reselect();
                self.phase = GrowthPhase::Growing;
            }
            GrowthPhase::Growing if self.stage == self.ctx.schedule.max_stage() => {
                self.phase = GrowthPhase::Shrinking;
            }
            _ => {}
        }
    }

    /// One Metropolis trial per solvent particle, in index order, at the current stage.
    fn solvent_sweep(&mut self) {
        let config = self.ctx.config;
        let params = &config.forcefield;
        let beta = config.beta();
        let lambda = self.ctx.schedule.lambda(self.stage);
        let simulation_box = *self.solvent.simulation_box();

        for index in 0..self.solvent.len() {
            let delta = random_displacement(config.solvent.max_displacement, &mut self.rng);
            let current = self.solvent.positions()[index];
            let trial = simulation_box.wrap(current + delta);
            let u_current = solvent_particle_energy(
                &self.polymer,
                &self.solvent,
                index,
                &current,
                lambda,
                params,
            );
            let u_trial =
                solvent_particle_energy(&self.polymer, &self.solvent, index, &trial, lambda, params);

            let accepted = metropolis_accept(beta * (u_trial - u_current), &mut self.rng);
            if accepted {
                self.solvent.displace(index, delta);
            }
            self.solvent_moves.record(accepted);
        }
    }

    fn candidate_stage(&self) -> Option<usize> {
        match self.phase {
            GrowthPhase::Growing if self.stage < self.ctx.schedule.max_stage() => {
                Some(self.stage + 1)
            }
            GrowthPhase::Shrinking if self.stage > 0 => Some(self.stage - 1),
            _ => None,
        }
    }

    fn coupling_energy(&self, stage: usize) -> f64 {
        soft_core_polymer_solvent_energy(
            &self.polymer,
            &self.solvent,
            self.ctx.schedule.lambda(stage),
            &self.ctx.config.forcefield.coupling,
        )
    }

    fn attempt_stage_move(&mut self) {
        let config = self.ctx.config;
        let beta = config.beta();
        let from = self.stage;

        let solvent_term = solvent_solvent_energy(
            &self.solvent,
            &config.forcefield.solvent,
            config.forcefield.solvent_cutoff_sq(),
        );
        let u_from = self.coupling_energy(from) + solvent_term;
        let eta_from = self.eta.get(from);

        let Some(to) = self.candidate_stage() else {
            self.collection.record_attempt(from, None, 0.0);
            self.log_attempt(GeeAttemptRecord {
                step: self.step,
                from_stage: from,
                to_stage: None,
                u_from,
                u_to: None,
                delta_u: None,
                eta_from,
                eta_to: None,
                eta_ratio: None,
                boltzmann_factor: None,
                boundary_correction: 0.0,
                acceptance_probability: 0.0,
                accepted: false,
                collection_weight: None,
            });
            return;
        };

        let u_to = self.coupling_energy(to) + solvent_term;
        let delta_u = u_to - u_from;
        let beta_delta_u = beta * delta_u;
        let correction = self.ctx.schedule.boundary_correction(from, to);
        let eta_to = self.eta.get(to);

        let weight = collection_weight(beta_delta_u, correction);
        self.collection
            .record_attempt(from, Transition::between(from, to), weight);

        let probability = acceptance_probability(eta_from, eta_to, beta_delta_u, correction);
        let accepted = self.rng.r#gen::<f64>() < probability;
        if accepted {
            self.stage = to;
        }
        self.gee_moves.record(accepted);

        self.log_attempt(GeeAttemptRecord {
            step: self.step,
            from_stage: from,
            to_stage: Some(to),
            u_from,
            u_to: Some(u_to),
            delta_u: Some(delta_u),
            eta_from,
            eta_to: Some(eta_to),
            eta_ratio: Some(log_bias_ratio(eta_from, eta_to, beta_delta_u).exp()),
            boltzmann_factor: Some((-beta_delta_u).exp()),
            boundary_correction: correction,
            acceptance_probability: probability,
            accepted,
            collection_weight: Some(weight),
        });
    }

    fn log_attempt(&mut self, record: GeeAttemptRecord) {
        trace!(
            step = record.step,
            from = record.from_stage,
            to = ?record.to_stage,
            delta_u = ?record.delta_u,
            eta_from = record.eta_from,
            eta_to = ?record.eta_to,
            correction = record.boundary_correction,
            probability = record.acceptance_probability,
            accepted = record.accepted,
            weight = ?record.collection_weight,
            "GEE attempt."
        );
        if self.keep_diagnostics {
            self.attempts.push(record);
        }
    }

    /// Swaps in a new conformation and restores the run-start solvent after a
    /// round trip.
    ///
    /// A failed load keeps both the current conformation and the current solvent.
    fn reselect(&mut self) {
        self.reselections += 1;
        match fetch_conformation(self.ctx.source, self.entries, self.bin, &mut self.rng) {
            Ok((conformation, original_index)) => {
                trace!(original_index, "Reselected conformation.");
                self.polymer = conformation;
                self.solvent = self.start_solvent.clone();
                self.failure_streak = 0;
            }
            Err(e) => {
                self.reselection_failures += 1;
                self.failure_streak += 1;
                debug!(error = %e, "Conformation reselection failed; keeping the current one.");
                if self.failure_streak % RESELECTION_WARNING_STREAK == 0 {
                    warn!(
                        bin = self.bin,
                        consecutive_failures = self.failure_streak,
                        "Conformation reselection keeps failing."
                    );
                }
            }
        }
    }

    fn sample_history(&mut self) {
        if !self.keep_diagnostics {
            return;
        }
        self.history.push(StageSample {
            step: self.step,
            stage: self.stage,
            lambda: self.ctx.schedule.lambda(self.stage),
        });
    }
}

fn initial_solvent<S: ConformationSource + ?Sized>(
    ctx: &WalkerContext<'_, S>,
    rng: &mut impl Rng,
) -> SolventConfiguration {
    match ctx.solvent_template {
        Some(template) => template.clone(),
        None => SolventConfiguration::random(
            ctx.config.solvent.count,
            SimulationBox::new(ctx.config.solvent.box_length),
            rng,
        ),
    }
}
