use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::conformations::LibraryError;
use crate::core::models::schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("CV bin {bin} has no library conformations")]
    EmptyBin { bin: usize },

    #[error("Failed to load a conformation for CV bin {bin}: {source}")]
    ConformationLoad {
        bin: usize,
        #[source]
        source: LibraryError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Conformation library error: {source}")]
    Library {
        #[from]
        source: LibraryError,
    },

    #[error("Growth schedule error: {source}")]
    Schedule {
        #[from]
        source: ScheduleError,
    },
}
