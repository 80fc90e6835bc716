//! Asset manifests: which files under the asset root go into a build.
//!
//! One glob per line. A leading `-` turns the line into an exclusion. The
//! result is every included file that no exclusion matched, so line order
//! does not matter.

use crate::asset_path::AssetRoot;
use hashbrown::HashSet;
use itertools::Itertools;
use log::{debug, warn};
use map_asset::{AssetError, AssetResult};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Polarity {
    Include,
    Exclude,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ManifestEntry {
    pub pattern: String,
    pub polarity: Polarity,
}

impl ManifestEntry {
    /// Parses one manifest line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (polarity, pattern) = match line.strip_prefix('-') {
            Some(pattern) => (Polarity::Exclude, pattern.trim_start()),
            None => (Polarity::Include, line),
        };
        Some(Self {
            pattern: pattern.to_owned(),
            polarity,
        })
    }
}

pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    text.lines().filter_map(ManifestEntry::parse_line).collect()
}

pub fn read_manifest(path: &Path) -> AssetResult<Vec<ManifestEntry>> {
    let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => AssetError::unresolved(path, "manifest does not exist"),
        _ => AssetError::Io(err),
    })?;
    Ok(parse_manifest(&text))
}

/// A glob over `/`-separated paths relative to the asset root.
///
/// `*` and `?` stay inside one path segment, `[...]` is a character class
/// (`[!...]` negates) and a `**` segment matches any number of directories.
#[derive(Clone, Debug)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> AssetResult<Self> {
        let regex = Regex::new(&glob_to_regex(pattern))
            .map_err(|err| AssetError::malformed(pattern, format!("invalid glob: {err}")))?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, asset_path: &str) -> bool {
        self.regex.is_match(asset_path)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let normalized = pattern.replace('\\', "/");
    let segments = normalized
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>();

    let mut regex = String::from("^");
    for (idx, segment) in segments.iter().enumerate() {
        let last = idx + 1 == segments.len();
        if *segment == "**" {
            regex.push_str(if last { ".*" } else { "(?:[^/]+/)*" });
            continue;
        }

        let mut chars = segment.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' => regex.push_str("[^/]*"),
                '?' => regex.push_str("[^/]"),
                '[' => {
                    let class: String = chars.clone().take_while(|c| *c != ']').collect();
                    if chars.clone().nth(class.chars().count()) == Some(']') && !class.is_empty() {
                        chars.nth(class.chars().count());
                        regex.push('[');
                        let class = match class.strip_prefix('!') {
                            Some(rest) => {
                                regex.push('^');
                                rest.to_owned()
                            }
                            None => class,
                        };
                        for c in class.chars() {
                            if matches!(c, '\\' | '[' | '^') {
                                regex.push('\\');
                            }
                            regex.push(c);
                        }
                        regex.push(']');
                    } else {
                        regex.push_str(r"\[");
                    }
                }
                c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }

        if !last {
            regex.push('/');
        }
    }
    regex.push('$');
    regex
}

/// Expands `entries` against `root` and returns the absolute paths of the
/// selected files, sorted.
pub fn resolve(entries: &[ManifestEntry], root: &AssetRoot) -> AssetResult<Vec<PathBuf>> {
    let files = WalkDir::new(root.path())
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map_err(io::Error::from))
        .filter_ok(|entry| entry.file_type().is_file())
        .map(|entry| {
            let path = entry?.into_path();
            let asset_path = root.asset_path(&path)?;
            Ok((asset_path, path))
        })
        .collect::<AssetResult<Vec<_>>>()?;

    let mut inclusions = HashSet::new();
    let mut exclusions = HashSet::new();

    for entry in entries {
        let glob = Glob::new(&entry.pattern)?;
        let matches = files
            .iter()
            .filter(|(asset_path, _)| glob.is_match(asset_path))
            .map(|(_, path)| path)
            .collect_vec();

        if matches.is_empty() {
            warn!("manifest pattern '{}' matched nothing", glob.pattern());
        } else {
            debug!("manifest pattern '{}' matched {} files", glob.pattern(), matches.len());
        }

        match entry.polarity {
            Polarity::Include => inclusions.extend(matches),
            Polarity::Exclude => exclusions.extend(matches),
        }
    }

    Ok(inclusions
        .difference(&exclusions)
        .map(|path| (*path).clone())
        .sorted()
        .collect())
}
