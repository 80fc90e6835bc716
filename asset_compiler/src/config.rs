//! Optional `assets.toml`:
//!
//! ```toml
//! asset_root = "assets"
//!
//! [compile]
//! tmx = { kind = "map", output = "bin" }
//! xml = { kind = "puzzle", output = "puz" }
//! tsx = { kind = "copy" }
//! ```
//!
//! Relative paths are taken from the directory holding the file.

use crate::output::{CompilerKind, CompilerRegistry};
use map_asset::{AssetError, AssetResult};
use std::io;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike};

#[derive(Clone, Debug)]
pub struct Config {
    pub asset_root: PathBuf,
    pub registry: CompilerRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            registry: CompilerRegistry::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> AssetResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => AssetError::unresolved(path, "config file does not exist"),
            _ => AssetError::Io(err),
        })?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::from_toml(&text, base_dir, path)
    }

    /// `path` only labels errors.
    pub fn from_toml(text: &str, base_dir: &Path, path: &Path) -> AssetResult<Self> {
        let doc: DocumentMut = text
            .parse()
            .map_err(|err: toml_edit::TomlError| AssetError::malformed(path, err.to_string()))?;

        let mut config = Self::default();
        if let Some(item) = doc.get("asset_root") {
            let root = item
                .as_str()
                .ok_or_else(|| AssetError::malformed(path, "asset_root must be a string"))?;
            config.asset_root = base_dir.join(root);
        }

        if let Some(compile) = doc.get("compile") {
            let table = compile
                .as_table_like()
                .ok_or_else(|| AssetError::malformed(path, "[compile] must be a table"))?;
            for (extension, rule) in table.iter() {
                apply_rule(&mut config.registry, extension, rule, path)?;
            }
        }

        Ok(config)
    }
}

fn apply_rule(registry: &mut CompilerRegistry, extension: &str, rule: &Item, path: &Path) -> AssetResult<()> {
    let rule = rule
        .as_table_like()
        .ok_or_else(|| AssetError::malformed(path, format!("compile.{extension} must be a table")))?;
    let kind = string_field(rule, "kind", extension, path)?;

    if kind == "copy" {
        registry.unregister(extension);
        return Ok(());
    }
    let kind = CompilerKind::from_name(kind).ok_or_else(|| {
        AssetError::malformed(
            path,
            format!("compile.{extension}: unknown compiler kind '{kind}'"),
        )
    })?;
    let output = string_field(rule, "output", extension, path)?;
    registry.register(extension, kind, output);
    Ok(())
}

fn string_field<'a>(rule: &'a dyn TableLike, key: &str, extension: &str, path: &Path) -> AssetResult<&'a str> {
    rule.get(key)
        .and_then(Item::as_str)
        .ok_or_else(|| AssetError::malformed(path, format!("compile.{extension}.{key} must be a string")))
}
