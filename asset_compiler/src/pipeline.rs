use crate::asset_path::AssetRoot;
use crate::config::Config;
use crate::manifest::{read_manifest, resolve};
use crate::output::{BuildError, BuildReport, OutputTree};
use log::{info, warn};
use std::path::Path;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BuildOutcome {
    /// The manifest selected no files. The target is left alone.
    NothingToDo,
    Built(BuildReport),
}

/// Resolves `manifest` against the configured asset root and builds the
/// selected assets into `target`.
pub fn run(manifest: &Path, target: &Path, config: &Config) -> Result<BuildOutcome, BuildError> {
    let root = AssetRoot::new(&config.asset_root)?;
    let entries = read_manifest(manifest)?;
    let assets = resolve(&entries, &root)?;

    if assets.is_empty() {
        warn!("{} selects no assets under {}", manifest.display(), root.path().display());
        return Ok(BuildOutcome::NothingToDo);
    }
    info!("building {} assets from {}", assets.len(), root.path().display());

    OutputTree::new(&root, &config.registry)
        .build(&assets, target)
        .map(BuildOutcome::Built)
}
