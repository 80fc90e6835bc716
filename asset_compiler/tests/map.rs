mod common;

use asset_compiler::tiled::{compile_map, read_map};
use common::{BLOCKING_TILE, Fixture, Reader, SPAWNS_AND_ZONES, tileset_tsx, write_map_assets};
use map_asset::AssetError;
use map_asset::tilemap::{SpawnPoint, SpawnRole};
use map_asset::tileset::{Tileset, TilesetRef};

fn compile(fixture: &Fixture, map: &std::path::Path) -> Result<Vec<u8>, AssetError> {
    let mut bytes = Vec::new();
    compile_map(map, &fixture.root("assets"), &mut bytes)?;
    Ok(bytes)
}

#[test]
fn compiled_map_decodes_back() {
    let fixture = Fixture::new("map-decode");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, BLOCKING_TILE);
    let bytes = compile(&fixture, &map).unwrap();

    let mut reader = Reader::new(&bytes);
    assert_eq!(reader.take(4), b" PAM");
    assert_eq!((reader.u16(), reader.u16(), reader.u16()), (32, 3, 2));

    let ground: Vec<u16> = (0..6).map(|_| reader.u16()).collect();
    let props: Vec<u16> = (0..6).map(|_| reader.u16()).collect();
    assert_eq!(ground, [1, 2, 0, 0, 3, 4]);
    assert_eq!(props, [0, 0, 0, 4, 0, 0]);

    assert_eq!([reader.u16(), reader.u16(), reader.u16(), reader.u16()], [0, 1, 3, 2]);

    assert_eq!((reader.f32(), reader.f32()), (0.5, 1.0));
    assert_eq!(reader.u16(), 1);
    assert_eq!((reader.f32(), reader.f32()), (1.5, 0.0));

    assert_eq!(reader.u16(), 1);
    assert_eq!(
        [reader.f32(), reader.f32(), reader.f32(), reader.f32()],
        [1.0, 2.0, 2.0, 1.0]
    );
    assert_eq!(reader.string(), "spawn_room");

    assert_eq!(reader.string(), "textures/world.png");
    assert_eq!(reader.u16(), 4);
    assert_eq!((reader.u16(), reader.u8(), reader.u8()), (1, 10, 0));
    assert!(reader.is_empty());
}

#[test]
fn compiling_twice_is_byte_identical() {
    let fixture = Fixture::new("map-deterministic");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, BLOCKING_TILE);
    assert_eq!(compile(&fixture, &map).unwrap(), compile(&fixture, &map).unwrap());
}

#[test]
fn model_matches_descriptor() {
    let fixture = Fixture::new("map-model");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, BLOCKING_TILE);
    let map = read_map(&map, &fixture.root("assets")).unwrap();

    assert_eq!(map.layers.len(), 2);
    assert_eq!(map.layers[1].name, "props");
    assert_eq!(map.tilesets[0].first_gid, 1);
    assert_eq!(map.tilesets[0].tileset.image_path, "textures/world.png");
    assert_eq!(
        map.player_spawn().unwrap(),
        &SpawnPoint {
            role: SpawnRole::Player,
            x: 0.5,
            y: 1.0
        }
    );
    assert_eq!(map.zones[0].name, "spawn_room");
}

#[test]
fn player_spawn_must_be_unique() {
    let fixture = Fixture::new("map-player");

    let missing = write_map_assets(&fixture, "", "");
    assert!(matches!(compile(&fixture, &missing), Err(AssetError::SchemaViolation(_))));

    let doubled = write_map_assets(
        &fixture,
        r#" <objectgroup name="Spawns">
  <object id="1" name="player" type="spawn" x="0" y="0"/>
  <object id="2" name="player" type="spawn" x="32" y="0"/>
 </objectgroup>"#,
        "",
    );
    assert!(matches!(compile(&fixture, &doubled), Err(AssetError::SchemaViolation(_))));
}

#[test]
fn image_outside_root_is_rejected() {
    let fixture = Fixture::new("map-outside");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, "");
    fixture.write("elsewhere.png", b"outside");
    fixture.write("assets/tilesets/world.tsx", tileset_tsx("../../elsewhere.png", ""));

    assert!(matches!(compile(&fixture, &map), Err(AssetError::PathResolution { .. })));
}

#[test]
fn missing_image_is_rejected() {
    let fixture = Fixture::new("map-missing-image");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, "");
    fixture.write("assets/tilesets/world.tsx", tileset_tsx("../textures/gone.png", ""));

    assert!(matches!(compile(&fixture, &map), Err(AssetError::PathResolution { .. })));
}

#[test]
fn unknown_tile_property_is_rejected() {
    let fixture = Fixture::new("map-property");
    let map = write_map_assets(
        &fixture,
        SPAWNS_AND_ZONES,
        r#" <tile id="0"><properties><property name="slippery" type="bool" value="true"/></properties></tile>"#,
    );

    let err = compile(&fixture, &map).unwrap_err();
    assert!(matches!(err, AssetError::SchemaViolation(_)));
    assert!(err.to_string().contains("slippery"));
}

#[test]
fn first_gid_beyond_u16_is_rejected() {
    let fixture = Fixture::new("map-firstgid");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, "");
    let text = std::fs::read_to_string(&map)
        .unwrap()
        .replace(r#"firstgid="1""#, r#"firstgid="4294967295""#);
    std::fs::write(&map, text).unwrap();

    assert!(matches!(
        compile(&fixture, &map),
        Err(AssetError::MalformedDescriptor { .. })
    ));
}

#[test]
fn oversized_image_path_overflows() {
    let fixture = Fixture::new("map-overflow");
    let map = write_map_assets(&fixture, SPAWNS_AND_ZONES, "");
    let mut map = read_map(&map, &fixture.root("assets")).unwrap();
    map.tilesets = vec![TilesetRef {
        first_gid: 1,
        tileset: Tileset::new("a/".repeat(40_000), 4),
    }];

    assert!(matches!(
        map.to_bytes(),
        Err(AssetError::EncodingOverflow { len: 80_000, .. })
    ));
}
