use crate::asset_path::{AssetRoot, locate_file, resolve_sibling};
use crate::tiled::{
    child, children, parse_attr, parse_attr_or, parse_document, parse_value, properties, read_descriptor,
    read_tileset, required_attr, root_element,
};
use log::debug;
use map_asset::tilemap::{Layer, MapBounds, SpawnPoint, SpawnRole, TileMap, Zone};
use map_asset::tileset::TilesetRef;
use map_asset::{AssetError, AssetResult};
use roxmltree::Node;
use std::io::Write;
use std::path::Path;

const SPAWN_GROUP: &str = "Spawns";
const ZONE_GROUP: &str = "Zones";
const SPAWN_TYPE: &str = "spawn";
const BOUND_PROPERTIES: [&str; 4] = ["map_min_x", "map_min_y", "map_max_x", "map_max_y"];

/// Reads a `.tmx` map and every tileset it references.
pub fn read_map(descriptor: &Path, root: &AssetRoot) -> AssetResult<TileMap> {
    let descriptor = locate_file(descriptor)?;
    let text = read_descriptor(&descriptor)?;
    let doc = parse_document(&descriptor, &text)?;
    let node = root_element(&doc, "map", &descriptor)?;
    let path = descriptor.as_path();

    if let Some(orientation) = node.attribute("orientation") {
        if orientation != "orthogonal" {
            return Err(AssetError::schema(format!(
                "only orthogonal maps are supported, found '{orientation}'"
            )));
        }
    }
    if node.attribute("infinite") == Some("1") {
        return Err(AssetError::schema("infinite maps are not supported"));
    }

    let tile_size: u16 = parse_attr(node, "tilewidth", path)?;
    let tile_height: u16 = parse_attr(node, "tileheight", path)?;
    if tile_size != tile_height {
        return Err(AssetError::schema(format!(
            "tiles must be square, found {tile_size}x{tile_height}"
        )));
    }

    let map = TileMap {
        tile_size,
        width: parse_attr(node, "width", path)?,
        height: parse_attr(node, "height", path)?,
        layers: read_layers(node, path)?,
        tilesets: read_tileset_refs(node, path, root)?,
        bounds: read_bounds(node, path)?,
        spawns: read_spawns(node, tile_size, path)?,
        zones: read_zones(node, tile_size, path)?,
    };

    debug!(
        "map {}: {}x{} tiles of {}px, {} layers, {} spawns, {} zones",
        path.display(),
        map.width,
        map.height,
        map.tile_size,
        map.layers.len(),
        map.spawns.len(),
        map.zones.len()
    );
    Ok(map)
}

/// Reads, validates and writes a map. Nothing is written unless the whole map is valid,
/// apart from an [`AssetError::EncodingOverflow`] discovered while writing.
pub fn compile_map<W: Write + ?Sized>(descriptor: &Path, root: &AssetRoot, out: &mut W) -> AssetResult<()> {
    let map = read_map(descriptor, root)?;
    map.write(out)
}

/// Tile layers in document order, including those nested in group layers.
fn read_layers(map: Node, path: &Path) -> AssetResult<Vec<Layer>> {
    map.descendants()
        .filter(|node| node.has_tag_name("layer"))
        .map(|layer| {
            let name = layer.attribute("name").unwrap_or_default();
            let data = child(layer, "data")
                .ok_or_else(|| AssetError::malformed(path, format!("layer '{name}' has no <data>")))?;

            match data.attribute("encoding") {
                Some("csv") => {}
                other => {
                    return Err(AssetError::malformed(
                        path,
                        format!(
                            "layer '{name}' uses encoding {}, only csv is supported",
                            other.unwrap_or("none")
                        ),
                    ));
                }
            }

            let tiles = data
                .text()
                .unwrap_or_default()
                .split(',')
                .map(|gid| parse_value::<u16>(gid, "tile id", path))
                .collect::<AssetResult<Vec<_>>>()?;

            Ok(Layer {
                name: name.to_owned(),
                tiles,
            })
        })
        .collect()
}

fn read_tileset_refs(map: Node, path: &Path, root: &AssetRoot) -> AssetResult<Vec<TilesetRef>> {
    let mut tilesets = children(map, "tileset")
        .map(|node| {
            let first_gid: u32 = parse_attr(node, "firstgid", path)?;
            if first_gid == 0 || first_gid > u32::from(u16::MAX) {
                return Err(AssetError::malformed(
                    path,
                    format!("tileset firstgid {first_gid} is outside 1..={}", u16::MAX),
                ));
            }
            let source = node.attribute("source").ok_or_else(|| {
                AssetError::malformed(path, format!("tileset at gid {first_gid} is embedded, only external tilesets are supported"))
            })?;
            let tileset = read_tileset(&resolve_sibling(path, source), root)?;
            Ok(TilesetRef { first_gid, tileset })
        })
        .collect::<AssetResult<Vec<_>>>()?;

    tilesets.sort_by_key(|tileset| tileset.first_gid);
    Ok(tilesets)
}

fn read_bounds(map: Node, path: &Path) -> AssetResult<Option<MapBounds>> {
    let mut values = [None; 4];
    for property in properties(map, path)? {
        if let Some(idx) = BOUND_PROPERTIES.iter().position(|name| *name == property.name) {
            values[idx] = Some(parse_value::<u16>(property.value, property.name, path)?);
        }
    }

    match values {
        [Some(min_x), Some(min_y), Some(max_x), Some(max_y)] => Ok(Some(MapBounds { min_x, min_y, max_x, max_y })),
        [None, None, None, None] => Ok(None),
        _ => Err(AssetError::malformed(
            path,
            "map bounds need all of map_min_x, map_min_y, map_max_x and map_max_y",
        )),
    }
}

fn object_group<'a, 'input>(map: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    map.descendants()
        .find(|node| node.has_tag_name("objectgroup") && node.attribute("name") == Some(name))
}

/// Tiled 1.9 renamed the object `type` attribute to `class`.
fn object_type<'a>(object: Node<'a, '_>) -> Option<&'a str> {
    object.attribute("type").or_else(|| object.attribute("class"))
}

fn object_label(object: Node) -> String {
    match (object.attribute("id"), object.attribute("name")) {
        (Some(id), Some(name)) => format!("object {id} '{name}'"),
        (Some(id), None) => format!("object {id}"),
        (None, name) => format!("object '{}'", name.unwrap_or_default()),
    }
}

fn read_spawns(map: Node, tile_size: u16, path: &Path) -> AssetResult<Vec<SpawnPoint>> {
    let Some(group) = object_group(map, SPAWN_GROUP) else {
        return Ok(Vec::new());
    };

    children(group, "object")
        .map(|object| {
            let kind = object_type(object).unwrap_or_default();
            if kind != SPAWN_TYPE {
                return Err(AssetError::schema(format!(
                    "{} in '{SPAWN_GROUP}' has type '{kind}', expected '{SPAWN_TYPE}'",
                    object_label(object)
                )));
            }

            let name = object.attribute("name").unwrap_or_default();
            let role = SpawnRole::from_name(name).ok_or_else(|| {
                AssetError::schema(format!(
                    "{} has an unknown spawn name, expected 'player' or 'ai'",
                    object_label(object)
                ))
            })?;

            let x = parse_attr_or(object, "x", 0.0, path)?;
            let y = parse_attr_or(object, "y", 0.0, path)?;
            Ok(SpawnPoint::from_pixels(role, x, y, tile_size))
        })
        .collect()
}

fn read_zones(map: Node, tile_size: u16, path: &Path) -> AssetResult<Vec<Zone>> {
    let Some(group) = object_group(map, ZONE_GROUP) else {
        return Ok(Vec::new());
    };

    children(group, "object")
        .map(|object| {
            let is_rect = object.attribute("width").is_some()
                && object.attribute("height").is_some()
                && !object.children().any(|shape| {
                    ["ellipse", "point", "polygon", "polyline", "text"]
                        .iter()
                        .any(|tag| shape.has_tag_name(*tag))
                });
            if !is_rect {
                return Err(AssetError::schema(format!(
                    "{} in '{ZONE_GROUP}' is not a rectangle",
                    object_label(object)
                )));
            }

            let rect = (
                parse_attr_or(object, "x", 0.0, path)?,
                parse_attr_or(object, "y", 0.0, path)?,
                parse_attr(object, "width", path)?,
                parse_attr(object, "height", path)?,
            );
            let name = object.attribute("name").unwrap_or_default();
            Ok(Zone::from_pixels(name, rect, tile_size))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use crate::tiled::map::{read_bounds, read_layers, read_spawns, read_zones};
    use crate::tiled::parse_document;
    use map_asset::AssetError;
    use map_asset::tilemap::{MapBounds, SpawnRole};
    use std::path::Path;

    const PATH: &str = "inline.tmx";

    #[test]
    pub fn layers_keep_raw_gids_in_document_order() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map>
                <layer name="ground"><data encoding="csv">
1,2,
3,0
</data></layer>
                <group name="decor">
                    <layer name="props"><data encoding="csv">0,0,7,65535</data></layer>
                </group>
            </map>"#,
        )
        .unwrap();

        let layers = read_layers(doc.root_element(), path).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "ground");
        assert_eq!(layers[0].tiles, [1, 2, 3, 0]);
        assert_eq!(layers[1].tiles, [0, 0, 7, 65535]);
    }

    #[test]
    pub fn flipped_gid_does_not_fit() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><layer name="l"><data encoding="csv">2147483649</data></layer></map>"#,
        )
        .unwrap();
        let err = read_layers(doc.root_element(), path).unwrap_err();
        assert!(matches!(err, AssetError::MalformedDescriptor { .. }));
    }

    #[test]
    pub fn base64_layers_are_rejected() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><layer name="l"><data encoding="base64">AQAAAA==</data></layer></map>"#,
        )
        .unwrap();
        let err = read_layers(doc.root_element(), path).unwrap_err();
        assert!(matches!(err, AssetError::MalformedDescriptor { .. }));
    }

    #[test]
    pub fn bounds_need_all_four_properties() {
        let path = Path::new(PATH);
        let full = parse_document(
            path,
            r#"<map><properties>
                <property name="map_min_x" type="int" value="1"/>
                <property name="map_min_y" type="int" value="2"/>
                <property name="map_max_x" type="int" value="30"/>
                <property name="map_max_y" type="int" value="40"/>
                <property name="music" value="theme.ogg"/>
            </properties></map>"#,
        )
        .unwrap();
        assert_eq!(
            read_bounds(full.root_element(), path).unwrap(),
            Some(MapBounds { min_x: 1, min_y: 2, max_x: 30, max_y: 40 })
        );

        let partial = parse_document(
            path,
            r#"<map><properties><property name="map_min_x" type="int" value="1"/></properties></map>"#,
        )
        .unwrap();
        assert!(matches!(
            read_bounds(partial.root_element(), path),
            Err(AssetError::MalformedDescriptor { .. })
        ));

        let none = parse_document(path, "<map/>").unwrap();
        assert_eq!(read_bounds(none.root_element(), path).unwrap(), None);
    }

    #[test]
    pub fn spawns_are_partitioned_by_name() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><objectgroup id="3" name="Spawns">
                <object id="1" name="player" type="spawn" x="48" y="16"/>
                <object id="2" name="ai" class="spawn" x="64" y="96"><point/></object>
            </objectgroup></map>"#,
        )
        .unwrap();

        let spawns = read_spawns(doc.root_element(), 32, path).unwrap();
        assert_eq!(spawns.len(), 2);
        assert_eq!((spawns[0].role, spawns[0].x, spawns[0].y), (SpawnRole::Player, 1.5, 0.5));
        assert_eq!((spawns[1].role, spawns[1].x, spawns[1].y), (SpawnRole::Ai, 2.0, 3.0));
    }

    #[test]
    pub fn spawn_position_defaults_to_origin() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><objectgroup name="Spawns"><object id="1" name="player" type="spawn" y="64"/></objectgroup></map>"#,
        )
        .unwrap();

        let spawns = read_spawns(doc.root_element(), 32, path).unwrap();
        assert_eq!((spawns[0].x, spawns[0].y), (0.0, 2.0));
    }

    #[test]
    pub fn unknown_spawn_objects_are_rejected() {
        let path = Path::new(PATH);
        let wrong_type = parse_document(
            path,
            r#"<map><objectgroup name="Spawns"><object id="1" name="player" type="chest" x="0" y="0"/></objectgroup></map>"#,
        )
        .unwrap();
        assert!(matches!(
            read_spawns(wrong_type.root_element(), 32, path),
            Err(AssetError::SchemaViolation(_))
        ));

        let wrong_name = parse_document(
            path,
            r#"<map><objectgroup name="Spawns"><object id="1" name="boss" type="spawn" x="0" y="0"/></objectgroup></map>"#,
        )
        .unwrap();
        assert!(matches!(
            read_spawns(wrong_name.root_element(), 32, path),
            Err(AssetError::SchemaViolation(_))
        ));
    }

    #[test]
    pub fn zones_convert_pixels_to_tiles() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><objectgroup name="Zones">
                <object id="7" name="exit" x="32" y="64" width="64" height="32"/>
            </objectgroup></map>"#,
        )
        .unwrap();

        let zones = read_zones(doc.root_element(), 32, path).unwrap();
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.name, "exit");
        assert_eq!((zone.x, zone.y, zone.width, zone.height), (1.0, 2.0, 2.0, 1.0));
    }

    #[test]
    pub fn non_rectangular_zone_is_rejected() {
        let path = Path::new(PATH);
        let doc = parse_document(
            path,
            r#"<map><objectgroup name="Zones">
                <object id="7" name="pond" x="32" y="64" width="64" height="32"><ellipse/></object>
            </objectgroup></map>"#,
        )
        .unwrap();
        assert!(matches!(
            read_zones(doc.root_element(), 32, path),
            Err(AssetError::SchemaViolation(_))
        ));
    }
}
