use crate::core::forcefield::params::ForcefieldParams;
use crate::core::library::cv::CvKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermodynamicsConfig {
    /// Temperature of the simulation in reduced units (`k_B = 1`).
    pub target_temperature: f64,
    /// Temperature at which the conformation library was generated.
    pub library_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolventConfig {
    pub count: usize,
    pub box_length: f64,
    /// Largest per-axis displacement of a trial solvent move.
    pub max_displacement: f64,
    pub initial_box: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvConfig {
    pub kind: CvKind,
    pub num_bins: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeeConfig {
    pub num_stages: usize,
    pub equilibration_cycles: u64,
    pub production_cycles: u64,
    pub sweeps_per_attempt: u64,
    /// Outer cycles between bias re-estimations; zero disables adaptation.
    pub eta_update_interval: u64,
    pub eta_damping: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Sweeps between stage-trajectory samples; zero derives it from the run length.
    pub history_interval: u64,
    /// Sweeps between status log lines; zero derives it from the run length.
    pub verbose_interval: u64,
}

impl DiagnosticsConfig {
    /// Intervals with zeros replaced by `total_steps / 200` and `total_steps / 100`.
    pub fn resolved(&self, total_steps: u64) -> (u64, u64) {
        let derive = |value: u64, divisor: u64| {
            if value == 0 {
                (total_steps / divisor).max(1)
            } else {
                value
            }
        };
        (
            derive(self.history_interval, 200),
            derive(self.verbose_interval, 100),
        )
    }
}

/// Immutable description of one simulation run, shared by every walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub thermodynamics: ThermodynamicsConfig,
    pub forcefield: ForcefieldParams,
    pub num_monomers: usize,
    pub solvent: SolventConfig,
    pub cv: CvConfig,
    pub gee: GeeConfig,
    pub diagnostics: DiagnosticsConfig,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    #[inline]
    pub fn beta(&self) -> f64 {
        1.0 / self.thermodynamics.target_temperature
    }

    #[inline]
    pub fn total_cycles(&self) -> u64 {
        self.gee.equilibration_cycles + self.gee.production_cycles
    }

    /// Number of solvent sweeps a walker performs over the whole run.
    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_cycles() * self.gee.sweeps_per_attempt
    }

    /// Whether the library was generated at a different temperature.
    pub fn has_temperature_mismatch(&self) -> bool {
        (self.thermodynamics.library_temperature - self.thermodynamics.target_temperature).abs()
            > 1e-3
    }
}

/// Builder for [`SimulationConfig`].
///
/// Temperature, force field, chain length, box length and stage count are
/// required. Everything else falls back to a default:
/// library temperature equal to the target, no solvent, a maximum displacement
/// of 0.15, radius of gyration over 49 bins with bounds taken from the library,
/// no equilibration, one sweep per attempt, no bias adaptation, a damping of
/// 0.2 and derived diagnostic intervals.
#[derive(Default)]
pub struct SimulationConfigBuilder {
    target_temperature: Option<f64>,
    library_temperature: Option<f64>,
    forcefield: Option<ForcefieldParams>,
    num_monomers: Option<usize>,
    solvent_count: Option<usize>,
    box_length: Option<f64>,
    max_displacement: Option<f64>,
    initial_box: Option<PathBuf>,
    cv_kind: Option<CvKind>,
    num_cv_bins: Option<usize>,
    cv_min: Option<f64>,
    cv_max: Option<f64>,
    num_stages: Option<usize>,
    equilibration_cycles: Option<u64>,
    production_cycles: Option<u64>,
    sweeps_per_attempt: Option<u64>,
    eta_update_interval: Option<u64>,
    eta_damping: Option<f64>,
    history_interval: Option<u64>,
    verbose_interval: Option<u64>,
    seed: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_temperature(mut self, temperature: f64) -> Self {
        self.target_temperature = Some(temperature);
        self
    }
    pub fn library_temperature(mut self, temperature: f64) -> Self {
        self.library_temperature = Some(temperature);
        self
    }
    pub fn forcefield(mut self, params: ForcefieldParams) -> Self {
        self.forcefield = Some(params);
        self
    }
    pub fn num_monomers(mut self, n: usize) -> Self {
        self.num_monomers = Some(n);
        self
    }
    pub fn solvent_count(mut self, n: usize) -> Self {
        self.solvent_count = Some(n);
        self
    }
    pub fn box_length(mut self, length: f64) -> Self {
        self.box_length = Some(length);
        self
    }
    pub fn max_displacement(mut self, max: f64) -> Self {
        self.max_displacement = Some(max);
        self
    }
    pub fn initial_box(mut self, path: Option<PathBuf>) -> Self {
        self.initial_box = path;
        self
    }
    pub fn cv_kind(mut self, kind: CvKind) -> Self {
        self.cv_kind = Some(kind);
        self
    }
    pub fn num_cv_bins(mut self, n: usize) -> Self {
        self.num_cv_bins = Some(n);
        self
    }
    pub fn cv_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.cv_min = min;
        self.cv_max = max;
        self
    }
    pub fn num_stages(mut self, n: usize) -> Self {
        self.num_stages = Some(n);
        self
    }
    pub fn equilibration_cycles(mut self, n: u64) -> Self {
        self.equilibration_cycles = Some(n);
        self
    }
    pub fn production_cycles(mut self, n: u64) -> Self {
        self.production_cycles = Some(n);
        self
    }
    pub fn sweeps_per_attempt(mut self, n: u64) -> Self {
        self.sweeps_per_attempt = Some(n);
        self
    }
    pub fn eta_update_interval(mut self, n: u64) -> Self {
        self.eta_update_interval = Some(n);
        self
    }
    pub fn eta_damping(mut self, damping: f64) -> Self {
        self.eta_damping = Some(damping);
        self
    }
    pub fn history_interval(mut self, n: u64) -> Self {
        self.history_interval = Some(n);
        self
    }
    pub fn verbose_interval(mut self, n: u64) -> Self {
        self.verbose_interval = Some(n);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let target_temperature = self
            .target_temperature
            .ok_or(ConfigError::MissingParameter("target_temperature"))?;
        let thermodynamics = ThermodynamicsConfig {
            target_temperature,
            library_temperature: self.library_temperature.unwrap_or(target_temperature),
        };
        let solvent = SolventConfig {
            count: self.solvent_count.unwrap_or(0),
            box_length: self
                .box_length
                .ok_or(ConfigError::MissingParameter("box_length"))?,
            max_displacement: self.max_displacement.unwrap_or(0.15),
            initial_box: self.initial_box,
        };
        let cv = CvConfig {
            kind: self.cv_kind.unwrap_or_default(),
            num_bins: self.num_cv_bins.unwrap_or(49),
            min: self.cv_min,
            max: self.cv_max,
        };
        let gee = GeeConfig {
            num_stages: self
                .num_stages
                .ok_or(ConfigError::MissingParameter("num_stages"))?,
            equilibration_cycles: self.equilibration_cycles.unwrap_or(0),
            production_cycles: self
                .production_cycles
                .ok_or(ConfigError::MissingParameter("production_cycles"))?,
            sweeps_per_attempt: self.sweeps_per_attempt.unwrap_or(1),
            eta_update_interval: self.eta_update_interval.unwrap_or(0),
            eta_damping: self.eta_damping.unwrap_or(0.2),
        };
        let diagnostics = DiagnosticsConfig {
            history_interval: self.history_interval.unwrap_or(0),
            verbose_interval: self.verbose_interval.unwrap_or(0),
        };
        let config = SimulationConfig {
            thermodynamics,
            forcefield: self
                .forcefield
                .ok_or(ConfigError::MissingParameter("forcefield"))?,
            num_monomers: self
                .num_monomers
                .ok_or(ConfigError::MissingParameter("num_monomers"))?,
            solvent,
            cv,
            gee,
            diagnostics,
            seed: self.seed,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive number, got {}", value)))
    }
}

fn validate(config: &SimulationConfig) -> Result<(), ConfigError> {
    positive("target_temperature", config.thermodynamics.target_temperature)?;
    positive(
        "library_temperature",
        config.thermodynamics.library_temperature,
    )?;
    positive("box_length", config.solvent.box_length)?;

    let ff = &config.forcefield;
    positive("bond.r_eq", ff.bond.r_eq)?;
    if !(ff.bond.k.is_finite() && ff.bond.k >= 0.0) {
        return Err(invalid("bond.k", "must be a non-negative number"));
    }
    for (name, lj) in [
        ("polymer.sigma", &ff.polymer),
        ("solvent.sigma", &ff.solvent),
        ("coupling.sigma", &ff.coupling),
    ] {
        positive(name, lj.sigma)?;
    }
    if let Some(cutoff) = ff.solvent_cutoff {
        positive("solvent_cutoff", cutoff)?;
    }

    if !(config.solvent.max_displacement.is_finite() && config.solvent.max_displacement >= 0.0) {
        return Err(invalid("max_displacement", "must be a non-negative number"));
    }
    if config.num_monomers == 0 {
        return Err(invalid("num_monomers", "a polymer needs at least one monomer"));
    }
    if config.cv.num_bins == 0 {
        return Err(invalid("num_cv_bins", "must be at least 1"));
    }
    if let (Some(min), Some(max)) = (config.cv.min, config.cv.max) {
        if min > max {
            return Err(invalid("cv_range", format!("min {} exceeds max {}", min, max)));
        }
    }

    let gee = &config.gee;
    if gee.num_stages < 2 {
        return Err(invalid(
            "num_stages",
            format!("at least two growth stages are required, got {}", gee.num_stages),
        ));
    }
    if gee.production_cycles == 0 {
        return Err(invalid("production_cycles", "must be at least 1"));
    }
    if gee.sweeps_per_attempt == 0 {
        return Err(invalid("sweeps_per_attempt", "must be at least 1"));
    }
    if !(gee.eta_damping > 0.0 && gee.eta_damping < 1.0) {
        return Err(invalid(
            "eta_damping",
            format!("must lie in (0, 1), got {}", gee.eta_damping),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .target_temperature(1.0)
            .forcefield(ForcefieldParams::default())
            .num_monomers(4)
            .box_length(8.9)
            .num_stages(31)
            .production_cycles(10)
    }

    #[test]
    fn minimal_builder_fills_in_defaults() {
        let config = minimal().build().unwrap();
        assert_eq!(config.thermodynamics.library_temperature, 1.0);
        assert_eq!(config.solvent.count, 0);
        assert_eq!(config.cv.num_bins, 49);
        assert_eq!(config.gee.eta_damping, 0.2);
        assert_eq!(config.beta(), 1.0);
        assert!(!config.has_temperature_mismatch());
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let err = SimulationConfigBuilder::new()
            .target_temperature(1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("box_length"));
    }

    #[test]
    fn fewer_than_two_stages_is_rejected() {
        let err = minimal().num_stages(1).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "num_stages",
                ..
            }
        ));
    }

    #[test]
    fn damping_outside_unit_interval_is_rejected() {
        assert!(minimal().eta_damping(0.0).build().is_err());
        assert!(minimal().eta_damping(1.5).build().is_err());
        assert!(minimal().eta_damping(1.0).build().is_err());
        assert!(minimal().eta_damping(0.99).build().is_ok());
    }

    #[test]
    fn non_positive_temperature_is_rejected() {
        assert!(minimal().target_temperature(0.0).build().is_err());
        assert!(minimal().target_temperature(f64::NAN).build().is_err());
    }

    #[test]
    fn temperature_mismatch_beyond_tolerance_is_detected() {
        let config = minimal().library_temperature(1.01).build().unwrap();
        assert!(config.has_temperature_mismatch());
        let config = minimal().library_temperature(1.0005).build().unwrap();
        assert!(!config.has_temperature_mismatch());
    }

    #[test]
    fn zero_diagnostic_intervals_are_derived_from_run_length() {
        let diagnostics = DiagnosticsConfig {
            history_interval: 0,
            verbose_interval: 0,
        };
        assert_eq!(diagnostics.resolved(30_000), (150, 300));
        assert_eq!(diagnostics.resolved(10), (1, 1));

        let explicit = DiagnosticsConfig {
            history_interval: 7,
            verbose_interval: 9,
        };
        assert_eq!(explicit.resolved(30_000), (7, 9));
    }
}
