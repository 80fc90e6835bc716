//! Reading Tiled `.tmx` and `.tsx` descriptors into [`map_asset`] types.

pub mod map;
pub mod tileset;

pub use map::{compile_map, read_map};
pub use tileset::read_tileset;

use map_asset::{AssetError, AssetResult};
use roxmltree::{Document, Node};
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::str::FromStr;

pub(crate) fn read_descriptor(path: &Path) -> AssetResult<String> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => AssetError::unresolved(path, "descriptor does not exist"),
        io::ErrorKind::InvalidData => AssetError::malformed(path, "descriptor is not valid UTF-8"),
        _ => AssetError::Io(err),
    })
}

pub(crate) fn parse_document<'input>(path: &Path, text: &'input str) -> AssetResult<Document<'input>> {
    Document::parse(text).map_err(|err| AssetError::malformed(path, err.to_string()))
}

/// The document element, which must be `<tag>`.
pub(crate) fn root_element<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &str,
    path: &Path,
) -> AssetResult<Node<'a, 'input>> {
    let root = doc.root_element();
    if !root.has_tag_name(tag) {
        return Err(AssetError::malformed(
            path,
            format!("expected <{tag}> root element, found <{}>", root.tag_name().name()),
        ));
    }
    Ok(root)
}

pub(crate) fn required_attr<'a>(node: Node<'a, '_>, name: &str, path: &Path) -> AssetResult<&'a str> {
    node.attribute(name).ok_or_else(|| {
        AssetError::malformed(
            path,
            format!("<{}> is missing attribute '{name}'", node.tag_name().name()),
        )
    })
}

pub(crate) fn parse_value<T>(value: &str, what: &str, path: &Path) -> AssetResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| AssetError::malformed(path, format!("invalid {what} '{value}': {err}")))
}

pub(crate) fn parse_attr<T>(node: Node, name: &str, path: &Path) -> AssetResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = required_attr(node, name, path)?;
    parse_value(value, name, path)
}

pub(crate) fn parse_attr_or<T>(node: Node, name: &str, default: T, path: &Path) -> AssetResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match node.attribute(name) {
        Some(value) => parse_value(value, name, path),
        None => Ok(default),
    }
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

pub(crate) fn children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| child.has_tag_name(tag))
}

/// One `<property>` of a `<properties>` block.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Property<'a> {
    pub name: &'a str,
    /// The declared type. Absent means `string`.
    pub kind: Option<&'a str>,
    pub value: &'a str,
}

impl Property<'_> {
    pub fn as_bool(&self) -> Option<bool> {
        match (self.kind, self.value) {
            (Some("bool") | None, "true") => Some(true),
            (Some("bool") | None, "false") => Some(false),
            _ => None,
        }
    }
}

/// Properties declared directly on `node`, in document order.
pub(crate) fn properties<'a>(node: Node<'a, '_>, path: &Path) -> AssetResult<Vec<Property<'a>>> {
    children(node, "properties")
        .flat_map(|block| children(block, "property"))
        .map(|property| {
            Ok(Property {
                name: required_attr(property, "name", path)?,
                kind: property.attribute("type"),
                value: property.attribute("value").or(property.text()).unwrap_or(""),
            })
        })
        .collect()
}
