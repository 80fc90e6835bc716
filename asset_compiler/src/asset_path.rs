use map_asset::{AssetError, AssetResult};
use normalize_path::NormalizePath;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// The directory every asset path is expressed relative to.
///
/// Always absolute and canonical, so lexically resolved paths can be compared
/// against it with a plain prefix check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRoot(PathBuf);

impl AssetRoot {
    pub fn new(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let root = fs::canonicalize(path)
            .map_err(|err| AssetError::unresolved(path, format!("asset root is not accessible: {err}")))?;
        if !root.is_dir() {
            return Err(AssetError::unresolved(path, "asset root is not a directory"));
        }
        Ok(Self(root))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path of `path` below the root. Fails if it lies outside.
    pub fn relative_path<'a>(&self, path: &'a Path) -> AssetResult<&'a Path> {
        path.strip_prefix(&self.0).map_err(|_| {
            AssetError::unresolved(
                path,
                format!("path is outside the asset root {}", self.0.display()),
            )
        })
    }

    /// Posix form of `path` relative to the root, as written into compiled assets.
    pub fn asset_path(&self, path: &Path) -> AssetResult<String> {
        let relative = self.relative_path(path)?;
        let segments = relative
            .components()
            .map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AssetError::unresolved(path, "path is not valid UTF-8"))?;
        Ok(segments.join("/"))
    }

    /// Resolves `reference`, written inside the descriptor at `descriptor`, to an
    /// existing file under the root and returns its asset path.
    pub fn resolve_reference(&self, descriptor: &Path, reference: &str) -> AssetResult<String> {
        let target = resolve_sibling(descriptor, reference);
        let asset_path = self.asset_path(&target)?;
        if !target.is_file() {
            return Err(AssetError::unresolved(&target, "referenced file does not exist"));
        }
        Ok(asset_path)
    }
}

/// Canonical path of an existing descriptor file.
pub fn locate_file(path: &Path) -> AssetResult<PathBuf> {
    let located = fs::canonicalize(path)
        .map_err(|err| AssetError::unresolved(path, format!("file is not accessible: {err}")))?;
    if !located.is_file() {
        return Err(AssetError::unresolved(path, "not a file"));
    }
    Ok(located)
}

/// Joins `reference` onto the directory containing `descriptor` and collapses
/// `.` and `..` without touching the filesystem.
pub fn resolve_sibling(descriptor: &Path, reference: &str) -> PathBuf {
    let base = descriptor.parent().unwrap_or(Path::new(""));
    base.join(reference).normalize()
}
