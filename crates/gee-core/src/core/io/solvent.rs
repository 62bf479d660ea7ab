use crate::core::models::solvent::{SimulationBox, SolventConfiguration};
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolventBoxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: expected three numeric columns")]
    Parse { line: usize },
    #[error("Solvent box holds {found} particles but {required} are required")]
    TooFewParticles { found: usize, required: usize },
}

/// Reads a pre-equilibrated solvent box from whitespace-separated `x y z` rows.
///
/// Blank lines and lines starting with `#` are ignored. Only the first
/// `count` rows are used; every row up to that point must be well formed.
pub fn read_solvent_box(
    reader: &mut impl BufRead,
    count: usize,
    simulation_box: SimulationBox,
) -> Result<SolventConfiguration, SolventBoxError> {
    let mut positions = Vec::with_capacity(count);
    for (line_num, line_res) in reader.lines().enumerate() {
        if positions.len() == count {
            break;
        }
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let values: Vec<f64> = trimmed
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| SolventBoxError::Parse { line: line_num + 1 })?;
        if values.len() != 3 {
            return Err(SolventBoxError::Parse { line: line_num + 1 });
        }
        positions.push(Point3::new(values[0], values[1], values[2]));
    }
    if positions.len() < count {
        return Err(SolventBoxError::TooFewParticles {
            found: positions.len(),
            required: count,
        });
    }
    Ok(SolventConfiguration::new(positions, simulation_box))
}

pub fn read_solvent_box_from_path(
    path: &Path,
    count: usize,
    simulation_box: SimulationBox,
) -> Result<SolventConfiguration, SolventBoxError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_solvent_box(&mut reader, count, simulation_box)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_first_count_rows_and_wraps_them() {
        let text = "# box\n0.5 0.5 0.5\n\n5.5 1.0 1.0\n2.0 2.0 2.0\n";
        let solvent =
            read_solvent_box(&mut Cursor::new(text), 2, SimulationBox::new(5.0)).unwrap();
        assert_eq!(solvent.len(), 2);
        assert!((solvent.positions()[1].x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn too_short_file_is_an_error() {
        let text = "0.5 0.5 0.5\n";
        let err = read_solvent_box(&mut Cursor::new(text), 3, SimulationBox::new(5.0)).unwrap_err();
        assert!(matches!(
            err,
            SolventBoxError::TooFewParticles {
                found: 1,
                required: 3
            }
        ));
    }

    #[test]
    fn malformed_row_reports_its_line() {
        let text = "0.5 0.5 0.5\n1.0 2.0\n";
        let err = read_solvent_box(&mut Cursor::new(text), 2, SimulationBox::new(5.0)).unwrap_err();
        assert!(matches!(err, SolventBoxError::Parse { line: 2 }));
    }

    #[test]
    fn rows_after_the_requested_count_are_not_parsed() {
        let text = "0.5 0.5 0.5\nnot a row\n";
        let solvent =
            read_solvent_box(&mut Cursor::new(text), 1, SimulationBox::new(5.0)).unwrap();
        assert_eq!(solvent.len(), 1);
    }
}
