use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Coordinates of a linear bead-spring chain, monomer `i` bonded to `i + 1`.
///
/// A conformation is replaced wholesale when a walker reselects from its
/// library subset; it is never partially moved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolymerConformation {
    monomers: Vec<Point3<f64>>,
}

impl PolymerConformation {
    pub fn new(monomers: Vec<Point3<f64>>) -> Self {
        Self { monomers }
    }

    pub fn from_coordinates(coords: &[[f64; 3]]) -> Self {
        Self {
            monomers: coords
                .iter()
                .map(|&[x, y, z]| Point3::new(x, y, z))
                .collect(),
        }
    }

    #[inline]
    pub fn monomers(&self) -> &[Point3<f64>] {
        &self.monomers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }

    pub fn bonds(&self) -> impl Iterator<Item = (&Point3<f64>, &Point3<f64>)> {
        self.monomers.iter().zip(self.monomers.iter().skip(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonds_yield_consecutive_monomer_pairs() {
        let conf = PolymerConformation::from_coordinates(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        ]);
        let bonds: Vec<_> = conf.bonds().map(|(a, b)| (a.x, b.x)).collect();
        assert_eq!(bonds, vec![(0.0, 1.0), (1.0, 2.0)]);
    }

    #[test]
    fn coordinates_survive_toml() {
        let conf = PolymerConformation::from_coordinates(&[[0.0, 0.5, -1.0], [1.1, 0.0, 0.0]]);
        let text = toml::to_string(&conf).unwrap();
        let back: PolymerConformation = toml::from_str(&text).unwrap();
        assert_eq!(back, conf);
    }

    #[test]
    fn single_monomer_has_no_bonds() {
        let conf = PolymerConformation::from_coordinates(&[[0.0, 0.0, 0.0]]);
        assert_eq!(conf.bonds().count(), 0);
        assert_eq!(conf.len(), 1);
    }
}
