use crate::core::library::index::LibraryEntry;
use crate::core::library::source::ConformationSource;
use crate::core::models::polymer::PolymerConformation;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use rand::prelude::*;
use tracing::instrument;

const MIN_ETA: f64 = 1e-12;

/// Draws a conformation uniformly from a bin's library subset and loads it.
///
/// # Errors
///
/// Returns [`EngineError::EmptyBin`] when the subset is empty and
/// [`EngineError::ConformationLoad`] when the source cannot supply the entry.
#[instrument(level = "trace", skip(source, entries, rng))]
pub fn fetch_conformation<S: ConformationSource + ?Sized>(
    source: &S,
    entries: &[LibraryEntry],
    bin: usize,
    rng: &mut impl Rng,
) -> Result<(PolymerConformation, usize), EngineError> {
    let entry = entries.choose(rng).ok_or(EngineError::EmptyBin { bin })?;
    let conformation = source
        .load(entry)
        .map_err(|source| EngineError::ConformationLoad { bin, source })?;
    Ok((conformation, entry.original_index))
}

/// Uniform trial displacement in the cube `[-max, max]³`.
pub fn random_displacement(max: f64, rng: &mut impl Rng) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(-max..=max),
        rng.gen_range(-max..=max),
        rng.gen_range(-max..=max),
    )
}

/// Metropolis test `u < min(1, exp(-βΔU))`; always consumes one draw.
pub fn metropolis_accept(beta_delta_u: f64, rng: &mut impl Rng) -> bool {
    let probability = (-beta_delta_u).exp().min(1.0);
    rng.r#gen::<f64>() < probability
}

/// `min(1, exp(-βΔU + c))`, the weight booked in the collection matrix.
pub fn collection_weight(beta_delta_u: f64, correction: f64) -> f64 {
    let w = (-beta_delta_u + correction).exp().min(1.0);
    if w.is_nan() { 0.0 } else { w }
}

/// Log of the bias ratio `η_to / η_from`, or `-∞` when the move must be refused.
///
/// A vanishing `η_from` refuses energetically uphill moves and leaves the
/// others to the Boltzmann term alone.
pub fn log_bias_ratio(eta_from: f64, eta_to: f64, beta_delta_u: f64) -> f64 {
    if eta_from.abs() <= MIN_ETA {
        return if beta_delta_u > 0.0 { f64::NEG_INFINITY } else { 0.0 };
    }
    let ratio = eta_to / eta_from;
    if ratio <= MIN_ETA {
        f64::NEG_INFINITY
    } else {
        ratio.ln()
    }
}

/// `min(1, exp(ln(η_to/η_from) - βΔU + c))`.
pub fn acceptance_probability(
    eta_from: f64,
    eta_to: f64,
    beta_delta_u: f64,
    correction: f64,
) -> f64 {
    let exponent = log_bias_ratio(eta_from, eta_to, beta_delta_u) - beta_delta_u + correction;
    if exponent.is_nan() {
        0.0
    } else if exponent >= 0.0 {
        1.0
    } else {
        exponent.exp()
    }
}
