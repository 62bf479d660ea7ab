use crate::error::{CliError, Result};
use geetmmc::core::library::cv::CvKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub library: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub thermodynamics: Option<FileThermodynamicsConfig>,
    pub polymer: Option<FilePolymerConfig>,
    pub solvent: Option<FileSolventConfig>,
    pub coupling: Option<FileCouplingConfig>,
    pub collective_variable: Option<FileCvConfig>,
    pub gee: Option<FileGeeConfig>,
    pub diagnostics: Option<FileDiagnosticsConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileThermodynamicsConfig {
    pub temperature: Option<f64>,
    pub library_temperature: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePolymerConfig {
    pub num_monomers: Option<usize>,
    pub bond_k: Option<f64>,
    pub bond_r_eq: Option<f64>,
    pub epsilon: Option<f64>,
    pub sigma: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSolventConfig {
    pub count: Option<usize>,
    pub box_length: Option<f64>,
    pub epsilon: Option<f64>,
    pub sigma: Option<f64>,
    pub cutoff: Option<f64>,
    pub max_displacement: Option<f64>,
    pub initial_box: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileCouplingConfig {
    pub epsilon: Option<f64>,
    pub sigma: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileCvConfig {
    pub kind: Option<CvKind>,
    pub num_bins: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileGeeConfig {
    pub num_stages: Option<usize>,
    pub equilibration_cycles: Option<u64>,
    pub production_cycles: Option<u64>,
    pub sweeps_per_attempt: Option<u64>,
    pub eta_update_interval: Option<u64>,
    pub eta_damping: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDiagnosticsConfig {
    pub history_interval: Option<u64>,
    pub verbose_interval: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CliError::FileParsing { source, .. } => CliError::FileParsing {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::FileParsing {
            path: PathBuf::from("<inline>"),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn full_file_parses_into_every_section() {
        let config = FileConfig::from_toml_str(
            r#"
            library = "confs.txt"
            output-dir = "out"
            seed = 11

            [thermodynamics]
            temperature = 1.2
            library-temperature = 1.0

            [polymer]
            num-monomers = 10
            bond-k = 100.0

            [solvent]
            count = 64
            box-length = 6.0
            cutoff = 2.5
            initial-box = "box.txt"

            [coupling]
            epsilon = 0.5

            [collective-variable]
            kind = "end-to-end-distance"
            num-bins = 7
            min = 0.5

            [gee]
            num-stages = 11
            eta-damping = 0.3

            [diagnostics]
            history-interval = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.library, Some(PathBuf::from("confs.txt")));
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.thermodynamics.unwrap().library_temperature, Some(1.0));
        assert_eq!(config.polymer.unwrap().num_monomers, Some(10));
        let solvent = config.solvent.unwrap();
        assert_eq!(solvent.cutoff, Some(2.5));
        assert_eq!(solvent.initial_box, Some(PathBuf::from("box.txt")));
        assert_eq!(config.coupling.unwrap().epsilon, Some(0.5));
        let cv = config.collective_variable.unwrap();
        assert_eq!(cv.kind, Some(CvKind::EndToEndDistance));
        assert_eq!(cv.max, None);
        assert_eq!(config.gee.unwrap().num_stages, Some(11));
        assert_eq!(config.diagnostics.unwrap().history_interval, Some(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = FileConfig::from_toml_str("[gee]\nnum-lambdas = 3\n");
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn from_file_reports_the_offending_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "seed = \"not a number\"").unwrap();
        match FileConfig::from_file(file.path()) {
            Err(CliError::FileParsing { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected a parsing error, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_yields_all_none() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.library.is_none());
        assert!(config.gee.is_none());
    }
}
