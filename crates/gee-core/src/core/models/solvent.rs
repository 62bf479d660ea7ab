use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A cubic periodic simulation cell with edge length `length`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationBox {
    length: f64,
}

impl SimulationBox {
    /// Creates a cubic box.
    ///
    /// # Arguments
    ///
    /// * `length` - Edge length, expected to be strictly positive.
    pub fn new(length: f64) -> Self {
        Self { length }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Applies the minimum-image convention to a separation vector.
    ///
    /// Each component is shifted by the nearest integer multiple of the box
    /// length, so the result lies in `[-L/2, L/2]` per axis.
    #[inline]
    pub fn minimum_image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        let l = self.length;
        delta.map(|d| d - l * (d / l).round_ties_even())
    }

    /// Squared minimum-image distance between two points.
    #[inline]
    pub fn distance_sq(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.minimum_image(b - a).norm_squared()
    }

    /// Wraps a point back into the primary cell `[0, L)³`.
    #[inline]
    pub fn wrap(&self, p: Point3<f64>) -> Point3<f64> {
        let l = self.length;
        p.map(|c| c.rem_euclid(l))
    }
}

/// Positions of the solvent particles inside a periodic box.
///
/// The configuration is owned by a single walker and mutated in place by
/// accepted displacement moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolventConfiguration {
    positions: Vec<Point3<f64>>,
    simulation_box: SimulationBox,
}

impl SolventConfiguration {
    /// Creates a configuration from explicit positions.
    ///
    /// Positions are wrapped into the primary cell.
    ///
    /// # Arguments
    ///
    /// * `positions` - Particle positions, in any periodic image.
    /// * `simulation_box` - The periodic cell.
    pub fn new(positions: Vec<Point3<f64>>, simulation_box: SimulationBox) -> Self {
        let positions = positions
            .into_iter()
            .map(|p| simulation_box.wrap(p))
            .collect();
        Self {
            positions,
            simulation_box,
        }
    }

    /// Creates a configuration with no particles.
    pub fn empty(simulation_box: SimulationBox) -> Self {
        Self {
            positions: Vec::new(),
            simulation_box,
        }
    }

    /// Places `count` particles uniformly at random in the box.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of particles.
    /// * `simulation_box` - The periodic cell.
    /// * `rng` - Source of randomness.
    ///
    /// # Return
    ///
    /// Returns a configuration whose positions are independent and uniform in `[0, L)³`.
    pub fn random(count: usize, simulation_box: SimulationBox, rng: &mut impl Rng) -> Self {
        let l = simulation_box.length();
        let positions = (0..count)
            .map(|_| {
                Point3::new(
                    rng.r#gen::<f64>() * l,
                    rng.r#gen::<f64>() * l,
                    rng.r#gen::<f64>() * l,
                )
            })
            .collect();
        Self {
            positions,
            simulation_box,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    #[inline]
    pub fn simulation_box(&self) -> &SimulationBox {
        &self.simulation_box
    }

    /// Moves particle `index` by `delta`, wrapping through the periodic boundary.
    ///
    /// # Return
    ///
    /// Returns the previous position so that a rejected move can be undone
    /// with [`SolventConfiguration::restore`].
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn displace(&mut self, index: usize, delta: Vector3<f64>) -> Point3<f64> {
        let old = self.positions[index];
        self.positions[index] = self.simulation_box.wrap(old + delta);
        old
    }

    /// Puts particle `index` back at `position` without wrapping.
    pub fn restore(&mut self, index: usize, position: Point3<f64>) {
        self.positions[index] = position;
    }

    /// Translates every particle by the same vector, without wrapping.
    ///
    /// Energies computed under the minimum-image convention are unchanged by a
    /// translation through a whole number of box lengths.
    pub fn translate(&mut self, delta: Vector3<f64>) {
        for p in &mut self.positions {
            *p += delta;
        }
    }
}
