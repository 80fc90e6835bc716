//! Builds the output tree: compiled descriptors plus verbatim copies of
//! everything else, mirrored from the asset root.

use crate::asset_path::AssetRoot;
use crate::{puzzle, tiled};
use log::{debug, info};
use map_asset::{AssetError, AssetResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompilerKind {
    Map,
    Puzzle,
}

impl CompilerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "map" => Some(Self::Map),
            "puzzle" => Some(Self::Puzzle),
            _ => None,
        }
    }

    /// Compiles `source` fully into memory.
    pub fn compile(self, source: &Path, root: &AssetRoot) -> AssetResult<Vec<u8>> {
        let mut bytes = Vec::new();
        match self {
            Self::Map => tiled::compile_map(source, root, &mut bytes)?,
            Self::Puzzle => puzzle::compile_puzzle(source, &mut bytes)?,
        }
        Ok(bytes)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompileRule {
    pub kind: CompilerKind,
    pub output_extension: String,
}

/// Source extension (lowercase, without the dot) to compile rule.
#[derive(Clone, Debug)]
pub struct CompilerRegistry {
    rules: BTreeMap<String, CompileRule>,
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("tmx", CompilerKind::Map, "bin");
        registry
    }
}

impl CompilerRegistry {
    pub fn empty() -> Self {
        Self { rules: BTreeMap::new() }
    }

    pub fn register(&mut self, extension: &str, kind: CompilerKind, output_extension: &str) {
        self.rules.insert(
            extension.to_ascii_lowercase(),
            CompileRule {
                kind,
                output_extension: output_extension.to_owned(),
            },
        );
    }

    /// Files with this extension are copied verbatim afterwards.
    pub fn unregister(&mut self, extension: &str) {
        self.rules.remove(&extension.to_ascii_lowercase());
    }

    pub fn rule_for(&self, path: &Path) -> Option<&CompileRule> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.rules.get(&extension)
    }
}

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct BuildReport {
    pub compiled: usize,
    pub copied: usize,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Fatal(#[from] AssetError),
    #[error("failed to build {asset}")]
    Asset {
        asset: String,
        #[source]
        source: AssetError,
    },
    #[error("cannot write {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    fn output(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Output {
            path: path.to_owned(),
            source,
        }
    }
}

pub struct OutputTree<'a> {
    root: &'a AssetRoot,
    registry: &'a CompilerRegistry,
}

impl<'a> OutputTree<'a> {
    pub fn new(root: &'a AssetRoot, registry: &'a CompilerRegistry) -> Self {
        Self { root, registry }
    }

    /// Builds `assets` (absolute paths under the root) into `target`.
    ///
    /// Work happens in [`staging_dir`], which replaces `target` only once every
    /// asset succeeded. On failure the staging directory is left behind and
    /// `target` keeps its previous contents.
    pub fn build(&self, assets: &[PathBuf], target: &Path) -> Result<BuildReport, BuildError> {
        let target: PathBuf = target.components().collect();
        let staging = staging_dir(&target);

        if staging.exists() {
            debug!("removing stale staging directory {}", staging.display());
            fs::remove_dir_all(&staging).map_err(BuildError::output(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(BuildError::output(&staging))?;

        let mut report = BuildReport::default();
        for asset in assets {
            self.build_asset(asset, &staging, &mut report)?;
        }

        if target.exists() {
            fs::remove_dir_all(&target).map_err(BuildError::output(&target))?;
        }
        fs::rename(&staging, &target).map_err(BuildError::output(&target))?;

        info!(
            "built {}: {} compiled, {} copied",
            target.display(),
            report.compiled,
            report.copied
        );
        Ok(report)
    }

    fn build_asset(&self, asset: &Path, staging: &Path, report: &mut BuildReport) -> Result<(), BuildError> {
        let failed = |source: AssetError| BuildError::Asset {
            asset: asset.display().to_string(),
            source,
        };
        let relative = self.root.relative_path(asset).map_err(failed)?;
        let destination = staging.join(relative);

        match self.registry.rule_for(asset) {
            Some(rule) => {
                let bytes = rule.kind.compile(asset, self.root).map_err(|source| BuildError::Asset {
                    asset: relative.display().to_string(),
                    source,
                })?;
                let destination = destination.with_extension(&rule.output_extension);
                write_file(&destination, &bytes).map_err(BuildError::output(&destination))?;
                info!("compiled {} ({} bytes)", relative.display(), bytes.len());
                report.compiled += 1;
            }
            None => {
                copy_preserving_mtime(asset, &destination).map_err(BuildError::output(&destination))?;
                debug!("copied {}", relative.display());
                report.copied += 1;
            }
        }
        Ok(())
    }
}

/// `<target>.partial`, next to the target.
pub fn staging_dir(target: &Path) -> PathBuf {
    let mut staging = target.as_os_str().to_owned();
    staging.push(".partial");
    PathBuf::from(staging)
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    create_parent(path)?;
    fs::write(path, bytes)
}

fn copy_preserving_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    create_parent(destination)?;
    fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    // The copy inherits read-only permissions, so only open it for reading.
    File::open(destination)?.set_modified(modified)
}
