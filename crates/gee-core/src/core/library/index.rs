use super::cv::CvKind;
use crate::core::forcefield::energy::internal_energy;
use crate::core::forcefield::params::ForcefieldParams;
use crate::core::io::conformations::{ConformationRecord, LibraryError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One indexed conformation: where it lives in the library file and its
/// precomputed descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub original_index: usize,
    pub start_line: usize,
    pub byte_offset: u64,
    pub cv: f64,
    /// Vacuum internal energy (bonded plus intra-chain non-bonded).
    pub energy: f64,
}

/// Library entries sorted by ascending CV, ties broken by original index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryIndex {
    entries: Vec<LibraryEntry>,
}

impl LibraryIndex {
    pub fn from_entries(mut entries: Vec<LibraryEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.cv.total_cmp(&b.cv)
                .then(a.original_index.cmp(&b.original_index))
        });
        Self { entries }
    }

    /// Computes CV and internal energy for every record and sorts by CV.
    pub fn build<I>(
        records: I,
        cv_kind: CvKind,
        params: &ForcefieldParams,
    ) -> Result<Self, LibraryError>
    where
        I: IntoIterator<Item = Result<ConformationRecord, LibraryError>>,
    {
        let entries = records
            .into_iter()
            .map(|record| {
                let record = record?;
                Ok(LibraryEntry {
                    original_index: record.index,
                    start_line: record.start_line,
                    byte_offset: record.byte_offset,
                    cv: cv_kind.compute(&record.conformation),
                    energy: internal_energy(&record.conformation, params),
                })
            })
            .collect::<Result<Vec<_>, LibraryError>>()?;
        info!(count = entries.len(), cv = %cv_kind, "Indexed conformation library.");
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest and largest CV, or `None` for an empty index.
    pub fn cv_range(&self) -> Option<(f64, f64)> {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => Some((first.cv, last.cv)),
            _ => None,
        }
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), LibraryError> {
        let csv_error = |source| LibraryError::Csv {
            path: path.display().to_string(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        for entry in &self.entries {
            writer.serialize(entry).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| LibraryError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn read_csv(path: &Path) -> Result<Self, LibraryError> {
        let csv_error = |source| LibraryError::Csv {
            path: path.display().to_string(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<LibraryEntry>, _>>()
            .map_err(csv_error)?;
        Ok(Self::from_entries(entries))
    }
}
