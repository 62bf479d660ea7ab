use super::collection::CollectionMatrix;
use super::free_energy::cumulative_free_energy;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MIN_PROBABILITY: f64 = 1e-12;
const MIN_NORMALIZER: f64 = 1e-9;

/// Per-stage bias weights η steering the growth-stage walk.
///
/// They shape which stages are visited but never enter the free-energy
/// estimate, which depends on the collection matrix alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasWeights {
    values: Vec<f64>,
}

impl BiasWeights {
    /// All-ones weights.
    pub fn uniform(num_stages: usize) -> Self {
        Self {
            values: vec![1.0; num_stages],
        }
    }

    /// Weights from explicit values, which must be positive.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn get(&self, stage: usize) -> f64 {
        self.values[stage]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Re-estimates η from the collection matrix and blends it in with
    /// `damping`, aiming for a flat visit histogram over stages.
    pub fn update(&mut self, collection: &CollectionMatrix, beta: f64, damping: f64) {
        match target_weights(collection, beta) {
            Some(target) => {
                for (eta, new) in self.values.iter_mut().zip(target) {
                    *eta = (1.0 - damping) * *eta + damping * new;
                }
            }
            None => {
                warn!("No finite free-energy estimate available; resetting bias weights to one.");
                self.values.iter_mut().for_each(|eta| *eta = 1.0);
            }
        }
    }
}

/// Undamped η' = 1/p with p ∝ exp(-βF), scaled so its smallest valid entry is one.
fn target_weights(collection: &CollectionMatrix, beta: f64) -> Option<Vec<f64>> {
    let free_energy = cumulative_free_energy(collection, beta);
    let min_f = free_energy
        .iter()
        .copied()
        .filter(|f| f.is_finite())
        .min_by(f64::total_cmp)?;

    let mut probabilities: Vec<f64> = free_energy
        .iter()
        .map(|&f| {
            let p = (-beta * (f - min_f)).exp();
            if f.is_finite() && p.is_finite() { p } else { 0.0 }
        })
        .collect();
    let total: f64 = probabilities.iter().sum();
    if total > MIN_NORMALIZER {
        probabilities.iter_mut().for_each(|p| *p /= total);
    } else {
        probabilities.iter_mut().for_each(|p| *p = 1.0);
    }

    let mut weights: Vec<f64> = probabilities
        .iter()
        .map(|p| 1.0 / (p + MIN_PROBABILITY))
        .collect();
    let min_valid = probabilities
        .iter()
        .zip(&weights)
        .filter(|&(&p, _)| p > MIN_PROBABILITY)
        .map(|(_, &w)| w)
        .min_by(f64::total_cmp)
        .filter(|&w| w >= MIN_NORMALIZER)
        .unwrap_or(1.0);
    weights.iter_mut().for_each(|w| *w /= min_valid);
    Some(weights)
}
