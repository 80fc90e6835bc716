use crate::asset_path::{AssetRoot, locate_file};
use crate::tiled::{children, parse_attr, parse_document, properties, read_descriptor, required_attr, root_element};
use log::debug;
use map_asset::tileset::{TileFlags, TileProperty, Tileset};
use map_asset::{AssetError, AssetResult};
use roxmltree::Node;
use std::path::Path;

/// Reads an external `.tsx` tileset.
///
/// The image reference is resolved against the tileset's own directory and must
/// land on an existing file under `root`. Every tile property has to be one of
/// the [`TileProperty`] names holding a boolean.
pub fn read_tileset(descriptor: &Path, root: &AssetRoot) -> AssetResult<Tileset> {
    let descriptor = locate_file(descriptor)?;
    let text = read_descriptor(&descriptor)?;
    let doc = parse_document(&descriptor, &text)?;
    let node = root_element(&doc, "tileset", &descriptor)?;

    let tile_count: u16 = parse_attr(node, "tilecount", &descriptor)?;
    let image = children(node, "image")
        .next()
        .ok_or_else(|| AssetError::malformed(&descriptor, "tileset has no <image>"))?;
    let image_path = root.resolve_reference(&descriptor, required_attr(image, "source", &descriptor)?)?;

    let mut tileset = Tileset::new(image_path, tile_count);
    for tile in children(node, "tile") {
        let tile_id: u16 = parse_attr(tile, "id", &descriptor)?;
        let flags = tile_flags(tile, tile_id, &descriptor)?;
        tileset.set_flags(tile_id, flags)?;
    }

    debug!(
        "tileset {}: {} tiles, {} flagged, image {}",
        descriptor.display(),
        tileset.tile_count,
        tileset.flagged_tiles().count(),
        tileset.image_path
    );
    Ok(tileset)
}

fn tile_flags(tile: Node, tile_id: u16, descriptor: &Path) -> AssetResult<TileFlags> {
    properties(tile, descriptor)?
        .into_iter()
        .try_fold(TileFlags::empty(), |flags, property| {
            let kind: TileProperty = property.name.parse()?;
            match property.as_bool() {
                Some(true) => Ok(flags | kind.flag()),
                Some(false) => Ok(flags),
                None => Err(AssetError::schema(format!(
                    "tile {tile_id} property '{}' must be a bool, found '{}'",
                    property.name, property.value
                ))),
            }
        })
}
