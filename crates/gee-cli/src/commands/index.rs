use crate::cli::IndexArgs;
use crate::config::builder::build_index_config;
use crate::error::{CliError, Result};
use geetmmc::core::forcefield::params::ForcefieldParams;
use geetmmc::core::io::conformations::LibraryFile;
use geetmmc::core::library::cv::CvKind;
use geetmmc::core::library::index::LibraryIndex;
use std::fs;
use tracing::info;

pub fn run(args: IndexArgs) -> Result<()> {
    let config = build_index_config(&args)?;
    let library = LibraryFile::new(&config.library_path, config.num_monomers);

    let index = index_library(&library, config.cv_kind, &config.forcefield)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    index.write_csv(&args.output)?;

    let (lo, hi) = index.cv_range().unwrap_or((0.0, 0.0));
    println!(
        "✓ Indexed {} conformation(s), {} in [{:.4}, {:.4}], written to: {}",
        index.len(),
        config.cv_kind,
        lo,
        hi,
        args.output.display()
    );
    Ok(())
}

/// Reads every valid record of `library` and indexes it by `cv_kind`.
pub fn index_library(
    library: &LibraryFile,
    cv_kind: CvKind,
    params: &ForcefieldParams,
) -> Result<LibraryIndex> {
    info!(
        "Indexing conformation library {:?} ({} monomers per chain)",
        library.path(),
        library.num_monomers()
    );
    let index = LibraryIndex::build(library.records()?, cv_kind, params)?;
    if index.is_empty() {
        return Err(CliError::Argument(format!(
            "No valid conformations of {} monomers found in {}",
            library.num_monomers(),
            library.path().display()
        )));
    }
    Ok(index)
}
