use crate::core::models::polymer::PolymerConformation;
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const RECORD_TAG: &str = "# Conformation";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("I/O error while reading conformation library: {0}")]
    Stream(#[from] io::Error),
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("No complete conformation record at byte offset {offset} of '{path}'")]
    MissingRecord { path: String, offset: u64 },
    #[error("Conformation {0} is not present in the library")]
    UnknownConformation(usize),
}

/// One parsed block of a conformation library file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformationRecord {
    /// Zero-based position among the valid records of the file.
    pub index: usize,
    /// One-based line number of the record's header line.
    pub start_line: usize,
    /// Byte offset of the header line, usable to seek straight back to it.
    pub byte_offset: u64,
    pub conformation: PolymerConformation,
}

enum ReadState {
    Scanning,
    InRecord {
        start_line: usize,
        byte_offset: u64,
        coords: Vec<Point3<f64>>,
    },
}

/// Lazy reader over a conformation library.
///
/// The format is a `# Conformation ...` header line followed by one
/// `x y z` line per monomer. Blank lines inside a block are ignored. Blocks
/// with unparsable or wrongly shaped lines, and blocks cut short by a new
/// header or the end of input, are skipped with a warning and counted in
/// [`ConformationReader::skipped`].
pub struct ConformationReader<R> {
    reader: R,
    num_monomers: usize,
    line_num: usize,
    byte_pos: u64,
    next_index: usize,
    skipped: usize,
    state: ReadState,
    buf: String,
    done: bool,
}

impl<R: BufRead> ConformationReader<R> {
    pub fn new(reader: R, num_monomers: usize) -> Self {
        Self::starting_at(reader, num_monomers, 0, 0)
    }

    fn starting_at(reader: R, num_monomers: usize, line_num: usize, byte_pos: u64) -> Self {
        Self {
            reader,
            num_monomers,
            line_num,
            byte_pos,
            next_index: 0,
            skipped: 0,
            state: ReadState::Scanning,
            buf: String::new(),
            done: false,
        }
    }

    /// Number of malformed or incomplete blocks skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip_block(&mut self, start_line: usize, reason: &str) {
        warn!(
            line = self.line_num,
            block_start = start_line,
            "Skipping conformation block: {}",
            reason
        );
        self.skipped += 1;
        self.state = ReadState::Scanning;
    }

    fn read_record(&mut self) -> Result<Option<ConformationRecord>, LibraryError> {
        loop {
            self.buf.clear();
            let line_offset = self.byte_pos;
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                if let ReadState::InRecord { start_line, coords, .. } = &self.state {
                    if !coords.is_empty() {
                        let start_line = *start_line;
                        self.skip_block(start_line, "end of file inside an incomplete record");
                    }
                }
                return Ok(None);
            }
            self.byte_pos += n as u64;
            self.line_num += 1;
            let line = self.buf.trim();

            if line.starts_with(RECORD_TAG) {
                if let ReadState::InRecord { start_line, .. } = &self.state {
                    let start_line = *start_line;
                    self.skip_block(start_line, "new record began before this one was complete");
                }
                self.state = ReadState::InRecord {
                    start_line: self.line_num,
                    byte_offset: line_offset,
                    coords: Vec::with_capacity(self.num_monomers),
                };
                if self.num_monomers == 0 {
                    return Ok(Some(self.finish_record()));
                }
                continue;
            }

            let ReadState::InRecord { start_line, .. } = &self.state else {
                continue;
            };
            let start_line = *start_line;
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                self.skip_block(start_line, "expected exactly three coordinates");
                continue;
            }
            let parsed: Result<Vec<f64>, _> = parts.iter().map(|p| p.parse::<f64>()).collect();
            let Ok(xyz) = parsed else {
                self.skip_block(start_line, "coordinate is not a number");
                continue;
            };

            if let ReadState::InRecord { coords, .. } = &mut self.state {
                coords.push(Point3::new(xyz[0], xyz[1], xyz[2]));
                if coords.len() == self.num_monomers {
                    return Ok(Some(self.finish_record()));
                }
            }
        }
    }

    fn finish_record(&mut self) -> ConformationRecord {
        let state = std::mem::replace(&mut self.state, ReadState::Scanning);
        let ReadState::InRecord {
            start_line,
            byte_offset,
            coords,
        } = state
        else {
            unreachable!("finish_record is only called inside a record");
        };
        let index = self.next_index;
        self.next_index += 1;
        ConformationRecord {
            index,
            start_line,
            byte_offset,
            conformation: PolymerConformation::new(coords),
        }
    }
}

impl<R: BufRead> Iterator for ConformationReader<R> {
    type Item = Result<ConformationRecord, LibraryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A conformation library on disk.
///
/// Reading is restartable: every call to [`LibraryFile::records`] opens the
/// file afresh.
#[derive(Debug, Clone)]
pub struct LibraryFile {
    path: PathBuf,
    num_monomers: usize,
}

impl LibraryFile {
    pub fn new(path: impl Into<PathBuf>, num_monomers: usize) -> Self {
        Self {
            path: path.into(),
            num_monomers,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_monomers(&self) -> usize {
        self.num_monomers
    }

    pub fn records(&self) -> Result<ConformationReader<BufReader<File>>, LibraryError> {
        let file = self.open()?;
        Ok(ConformationReader::new(BufReader::new(file), self.num_monomers))
    }

    /// Reads the single record whose header starts at `byte_offset`.
    pub fn read_at(&self, byte_offset: u64) -> Result<PolymerConformation, LibraryError> {
        let mut file = self.open()?;
        file.seek(SeekFrom::Start(byte_offset))
            .map_err(|source| self.io_error(source))?;
        let mut reader = ConformationReader::starting_at(
            BufReader::new(file),
            self.num_monomers,
            0,
            byte_offset,
        );
        match reader.next() {
            Some(Ok(record)) if record.byte_offset == byte_offset => Ok(record.conformation),
            Some(Err(e)) => Err(e),
            _ => Err(LibraryError::MissingRecord {
                path: self.path.display().to_string(),
                offset: byte_offset,
            }),
        }
    }

    fn open(&self) -> Result<File, LibraryError> {
        File::open(&self.path).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> LibraryError {
        LibraryError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
