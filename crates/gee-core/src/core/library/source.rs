use super::cv::CvKind;
use super::index::{LibraryEntry, LibraryIndex};
use crate::core::forcefield::params::ForcefieldParams;
use crate::core::io::conformations::{ConformationRecord, LibraryError, LibraryFile};
use crate::core::models::polymer::PolymerConformation;
use std::collections::HashMap;

/// Supplies full coordinates for an indexed library entry.
pub trait ConformationSource: Send + Sync {
    fn load(&self, entry: &LibraryEntry) -> Result<PolymerConformation, LibraryError>;
}

impl ConformationSource for LibraryFile {
    fn load(&self, entry: &LibraryEntry) -> Result<PolymerConformation, LibraryError> {
        self.read_at(entry.byte_offset)
    }
}

/// A library held entirely in memory, keyed by original index.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    conformations: HashMap<usize, PolymerConformation>,
}

impl MemoryLibrary {
    pub fn from_conformations(conformations: Vec<PolymerConformation>) -> Self {
        Self {
            conformations: conformations.into_iter().enumerate().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.conformations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conformations.is_empty()
    }

    /// Builds an index whose entries point back into this library.
    pub fn index(&self, cv_kind: CvKind, params: &ForcefieldParams) -> LibraryIndex {
        let records = self.conformations.iter().map(|(&index, conformation)| {
            Ok(ConformationRecord {
                index,
                start_line: 0,
                byte_offset: 0,
                conformation: conformation.clone(),
            })
        });
        LibraryIndex::build(records, cv_kind, params).unwrap_or_default()
    }
}

impl ConformationSource for MemoryLibrary {
    fn load(&self, entry: &LibraryEntry) -> Result<PolymerConformation, LibraryError> {
        self.conformations
            .get(&entry.original_index)
            .cloned()
            .ok_or(LibraryError::UnknownConformation(entry.original_index))
    }
}
