use geetmmc::core::library::cv::CvKind;

pub struct DefaultsConfig {
    pub temperature: f64,
    pub num_monomers: usize,
    pub bond_k: f64,
    pub bond_r_eq: f64,
    pub polymer_epsilon: f64,
    pub polymer_sigma: f64,
    pub solvent_count: usize,
    pub box_length: f64,
    pub solvent_epsilon: f64,
    pub solvent_sigma: f64,
    pub max_displacement: f64,
    pub coupling_epsilon: f64,
    pub coupling_sigma: f64,
    pub cv_kind: CvKind,
    pub num_cv_bins: usize,
    pub num_stages: usize,
    pub equilibration_cycles: u64,
    pub production_cycles: u64,
    pub sweeps_per_attempt: u64,
    pub eta_update_interval: u64,
    pub eta_damping: f64,
    pub history_interval: u64,
    pub verbose_interval: u64,
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            num_monomers: 20,
            bond_k: 3.8e7,
            bond_r_eq: 1.1225,
            polymer_epsilon: 1.0,
            polymer_sigma: 1.0,
            solvent_count: 0,
            box_length: 8.9,
            solvent_epsilon: 1.0,
            solvent_sigma: 1.0,
            max_displacement: 0.15,
            coupling_epsilon: 1.0,
            coupling_sigma: 1.0,
            cv_kind: CvKind::RadiusOfGyration,
            num_cv_bins: 49,
            num_stages: 31,
            equilibration_cycles: 1000,
            production_cycles: 2000,
            sweeps_per_attempt: 10,
            eta_update_interval: 100,
            eta_damping: 0.2,
            history_interval: 100,
            verbose_interval: 500,
            output_dir: "./gee_output".to_string(),
        }
    }
}
