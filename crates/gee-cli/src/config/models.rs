use geetmmc::core::forcefield::params::ForcefieldParams;
use geetmmc::core::library::cv::CvKind;
use geetmmc::engine::config::SimulationConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub library_path: PathBuf,
    pub index_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub core_config: SimulationConfig,
}

pub struct IndexConfig {
    pub library_path: PathBuf,
    pub num_monomers: usize,
    pub cv_kind: CvKind,
    pub forcefield: ForcefieldParams,
}
