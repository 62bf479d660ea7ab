/// Energy returned for numerically coincident particles instead of `inf`/`NaN`.
pub const OVERLAP_PENALTY: f64 = 1e10;

const MIN_DIST_SQ: f64 = 1e-12;
const MIN_SOFT_CORE_DENOMINATOR: f64 = 1e-12;
const MIN_COUPLED_LAMBDA: f64 = 1e-9;

#[inline]
pub fn harmonic_bond(dist: f64, k: f64, r_eq: f64) -> f64 {
    let stretch = dist - r_eq;
    0.5 * k * stretch * stretch
}

#[inline]
pub fn lennard_jones_12_6(dist_sq: f64, epsilon: f64, sigma: f64) -> f64 {
    if dist_sq < MIN_DIST_SQ {
        return OVERLAP_PENALTY;
    }
    let sr6 = (sigma * sigma / dist_sq).powi(3);
    let sr12 = sr6 * sr6;
    4.0 * epsilon * (sr12 - sr6)
}

/// λ-scaled soft-core 12-6 potential, `4λε(1/D² − 1/D)` with
/// `D = ½(1−λ)² + (σ²/r²)³`.
///
/// Stays finite as `r → 0` for any `λ < 1`, and vanishes identically at `λ = 0`.
#[inline]
pub fn soft_core_lennard_jones(dist_sq: f64, lambda: f64, epsilon: f64, sigma: f64) -> f64 {
    let degenerate = || {
        if lambda > MIN_COUPLED_LAMBDA {
            OVERLAP_PENALTY
        } else {
            0.0
        }
    };
    if dist_sq < MIN_DIST_SQ {
        return degenerate();
    }
    let sr6 = (sigma * sigma / dist_sq).powi(3);
    let denominator = 0.5 * (1.0 - lambda).powi(2) + sr6;
    if denominator.abs() < MIN_SOFT_CORE_DENOMINATOR {
        return degenerate();
    }
    4.0 * lambda * epsilon * (1.0 / (denominator * denominator) - 1.0 / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn harmonic_bond_is_zero_at_equilibrium_length() {
        assert!(f64_approx_equal(harmonic_bond(1.1225, 100.0, 1.1225), 0.0));
    }

    #[test]
    fn harmonic_bond_is_quadratic_in_stretch() {
        assert!(f64_approx_equal(harmonic_bond(1.5, 10.0, 1.0), 1.25));
        assert!(f64_approx_equal(harmonic_bond(0.5, 10.0, 1.0), 1.25));
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let r_min_sq = 2f64.powf(1.0 / 3.0);
        assert!(f64_approx_equal(lennard_jones_12_6(r_min_sq, 2.5, 1.0), -2.5));
    }

    #[test]
    fn lennard_jones_is_zero_at_sigma() {
        assert!(f64_approx_equal(lennard_jones_12_6(1.44, 1.0, 1.2), 0.0));
    }

    #[test]
    fn lennard_jones_at_coincident_points_returns_penalty() {
        assert_eq!(lennard_jones_12_6(0.0, 1.0, 1.0), OVERLAP_PENALTY);
        assert_eq!(lennard_jones_12_6(1e-13, 1.0, 1.0), OVERLAP_PENALTY);
    }

    #[test]
    fn soft_core_is_identically_zero_when_decoupled() {
        for &r_sq in &[1e-6, 0.01, 0.5, 1.0, 4.0, 100.0] {
            assert_eq!(soft_core_lennard_jones(r_sq, 0.0, 1.0, 1.0), 0.0);
        }
        assert_eq!(soft_core_lennard_jones(0.0, 0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn soft_core_is_zero_at_sigma_when_fully_coupled() {
        assert!(f64_approx_equal(soft_core_lennard_jones(1.0, 1.0, 1.0, 1.0), 0.0));
    }

    #[test]
    fn soft_core_follows_closed_form_at_partial_coupling() {
        let lambda: f64 = 0.4;
        let r_sq: f64 = 1.5;
        let d = 0.5 * (1.0 - lambda).powi(2) + (1.0 / r_sq).powi(3);
        let expected = 4.0 * lambda * 1.2 * (1.0 / (d * d) - 1.0 / d);
        assert!(f64_approx_equal(
            soft_core_lennard_jones(r_sq, lambda, 1.2, 1.0),
            expected
        ));
    }

    #[test]
    fn soft_core_stays_finite_at_overlap_for_partial_coupling() {
        let energy = soft_core_lennard_jones(1e-10, 0.5, 1.0, 1.0);
        assert!(energy.is_finite());
        assert!(energy < OVERLAP_PENALTY);
    }

    #[test]
    fn soft_core_at_coincident_points_returns_penalty_only_when_coupled() {
        assert_eq!(soft_core_lennard_jones(0.0, 0.3, 1.0, 1.0), OVERLAP_PENALTY);
        assert_eq!(soft_core_lennard_jones(0.0, 1e-12, 1.0, 1.0), 0.0);
    }
}
