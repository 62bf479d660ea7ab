use crate::core::models::polymer::PolymerConformation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar descriptor of a conformation used to bin the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CvKind {
    /// Radius of gyration measured about the first monomer.
    #[default]
    RadiusOfGyration,
    EndToEndDistance,
}

impl CvKind {
    pub fn compute(&self, conformation: &PolymerConformation) -> f64 {
        match self {
            Self::RadiusOfGyration => radius_of_gyration(conformation),
            Self::EndToEndDistance => end_to_end_distance(conformation),
        }
    }
}

impl fmt::Display for CvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RadiusOfGyration => "radius-of-gyration",
            Self::EndToEndDistance => "end-to-end-distance",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCvKindError;

impl fmt::Display for ParseCvKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected 'radius-of-gyration' or 'end-to-end-distance'"
        )
    }
}

impl std::error::Error for ParseCvKindError {}

impl FromStr for CvKind {
    type Err = ParseCvKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "radius-of-gyration" | "rg" => Ok(Self::RadiusOfGyration),
            "end-to-end-distance" | "end-to-end" | "ree" => Ok(Self::EndToEndDistance),
            _ => Err(ParseCvKindError),
        }
    }
}

/// `sqrt(Σ|r_i − r_0|² / N)`; zero for an empty conformation.
pub fn radius_of_gyration(conformation: &PolymerConformation) -> f64 {
    let monomers = conformation.monomers();
    let Some(first) = monomers.first() else {
        return 0.0;
    };
    let sum_sq: f64 = monomers.iter().map(|p| (p - first).norm_squared()).sum();
    (sum_sq / monomers.len() as f64).sqrt()
}

pub fn end_to_end_distance(conformation: &PolymerConformation) -> f64 {
    match conformation.monomers() {
        [first, .., last] => (last - first).norm(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rod() -> PolymerConformation {
        PolymerConformation::from_coordinates(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        ])
    }

    #[test]
    fn radius_of_gyration_is_measured_about_the_first_monomer() {
        // (0 + 1 + 4) / 3
        assert!(f64_approx_equal(
            radius_of_gyration(&rod()),
            (5.0f64 / 3.0).sqrt()
        ));
    }

    #[test]
    fn end_to_end_distance_spans_first_and_last_monomer() {
        assert!(f64_approx_equal(end_to_end_distance(&rod()), 2.0));
    }

    #[test]
    fn degenerate_chains_have_zero_cv() {
        let single = PolymerConformation::from_coordinates(&[[3.0, 1.0, 2.0]]);
        assert_eq!(end_to_end_distance(&single), 0.0);
        assert_eq!(radius_of_gyration(&single), 0.0);
        assert_eq!(radius_of_gyration(&PolymerConformation::default()), 0.0);
    }

    #[test]
    fn cv_kind_parses_short_and_long_names() {
        assert_eq!("rg".parse(), Ok(CvKind::RadiusOfGyration));
        assert_eq!(
            "end-to-end-distance".parse(),
            Ok(CvKind::EndToEndDistance)
        );
        assert_eq!("volume".parse::<CvKind>(), Err(ParseCvKindError));
    }

    #[test]
    fn display_matches_the_serialized_name() {
        assert_eq!(CvKind::RadiusOfGyration.to_string(), "radius-of-gyration");
        assert_eq!(CvKind::EndToEndDistance.to_string(), "end-to-end-distance");
    }
}
