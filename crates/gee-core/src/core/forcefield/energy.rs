use super::params::{ForcefieldParams, HarmonicBondParams, LennardJonesParams};
use super::potentials;
use super::term::SystemEnergy;
use crate::core::models::polymer::PolymerConformation;
use crate::core::models::solvent::SolventConfiguration;
use itertools::Itertools;
use nalgebra::Point3;

/// Harmonic stretch energy summed over consecutive monomers.
pub fn bonded_energy(conformation: &PolymerConformation, bond: &HarmonicBondParams) -> f64 {
    conformation
        .bonds()
        .map(|(a, b)| potentials::harmonic_bond((b - a).norm(), bond.k, bond.r_eq))
        .sum()
}

/// 12-6 energy between monomers separated by at least two bonds.
///
/// Intramolecular and unconfined: no cutoff and no periodic images.
pub fn non_bonded_polymer_energy(
    conformation: &PolymerConformation,
    lj: &LennardJonesParams,
) -> f64 {
    let monomers = conformation.monomers();
    (0..monomers.len())
        .tuple_combinations()
        .filter(|&(i, j)| j >= i + 2)
        .map(|(i, j)| {
            let dist_sq = (monomers[j] - monomers[i]).norm_squared();
            potentials::lennard_jones_12_6(dist_sq, lj.epsilon, lj.sigma)
        })
        .sum()
}

/// Vacuum internal energy of a conformation (bonded plus non-bonded).
pub fn internal_energy(conformation: &PolymerConformation, params: &ForcefieldParams) -> f64 {
    bonded_energy(conformation, &params.bond)
        + non_bonded_polymer_energy(conformation, &params.polymer)
}

/// 12-6 energy over all solvent pairs under the minimum-image convention.
pub fn solvent_solvent_energy(
    solvent: &SolventConfiguration,
    lj: &LennardJonesParams,
    cutoff_sq: Option<f64>,
) -> f64 {
    let positions = solvent.positions();
    let simulation_box = solvent.simulation_box();
    (0..positions.len())
        .tuple_combinations()
        .map(|(i, j)| {
            let dist_sq = simulation_box.distance_sq(&positions[i], &positions[j]);
            pair_within_cutoff(dist_sq, lj, cutoff_sq)
        })
        .sum()
}

/// λ-scaled soft-core energy between every monomer and every solvent particle.
pub fn soft_core_polymer_solvent_energy(
    polymer: &PolymerConformation,
    solvent: &SolventConfiguration,
    lambda: f64,
    lj: &LennardJonesParams,
) -> f64 {
    if solvent.is_empty() {
        return 0.0;
    }
    solvent
        .positions()
        .iter()
        .map(|p| coupling_energy_at(polymer, solvent, p, lambda, lj))
        .sum()
}

/// λ-dependent part of the energy, broken down by contribution.
pub fn system_energy(
    polymer: &PolymerConformation,
    solvent: &SolventConfiguration,
    lambda: f64,
    params: &ForcefieldParams,
) -> SystemEnergy {
    SystemEnergy::new(
        soft_core_polymer_solvent_energy(polymer, solvent, lambda, &params.coupling),
        solvent_solvent_energy(solvent, &params.solvent, params.solvent_cutoff_sq()),
    )
}

/// Total energy used for stage-transition and solvent-move decisions.
///
/// Excludes the polymer's internal energy, so only differences taken at a
/// fixed conformation are meaningful.
pub fn total_system_energy(
    polymer: &PolymerConformation,
    solvent: &SolventConfiguration,
    lambda: f64,
    params: &ForcefieldParams,
) -> f64 {
    system_energy(polymer, solvent, lambda, params).total()
}

/// Interaction energy of solvent particle `index` if it sat at `position`.
///
/// The difference of this quantity between the trial and the current position
/// equals the change of [`total_system_energy`] for a single-particle move.
pub fn solvent_particle_energy(
    polymer: &PolymerConformation,
    solvent: &SolventConfiguration,
    index: usize,
    position: &Point3<f64>,
    lambda: f64,
    params: &ForcefieldParams,
) -> f64 {
    let simulation_box = solvent.simulation_box();
    let cutoff_sq = params.solvent_cutoff_sq();
    let solvent_term: f64 = solvent
        .positions()
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != index)
        .map(|(_, other)| {
            let dist_sq = simulation_box.distance_sq(position, other);
            pair_within_cutoff(dist_sq, &params.solvent, cutoff_sq)
        })
        .sum();
    solvent_term + coupling_energy_at(polymer, solvent, position, lambda, &params.coupling)
}

#[inline]
fn coupling_energy_at(
    polymer: &PolymerConformation,
    solvent: &SolventConfiguration,
    position: &Point3<f64>,
    lambda: f64,
    lj: &LennardJonesParams,
) -> f64 {
    let simulation_box = solvent.simulation_box();
    polymer
        .monomers()
        .iter()
        .map(|m| {
            let dist_sq = simulation_box.distance_sq(m, position);
            potentials::soft_core_lennard_jones(dist_sq, lambda, lj.epsilon, lj.sigma)
        })
        .sum()
}

#[inline]
fn pair_within_cutoff(dist_sq: f64, lj: &LennardJonesParams, cutoff_sq: Option<f64>) -> f64 {
    match cutoff_sq {
        Some(rc_sq) if dist_sq >= rc_sq => 0.0,
        _ => potentials::lennard_jones_12_6(dist_sq, lj.epsilon, lj.sigma),
    }
}
