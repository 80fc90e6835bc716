#![allow(dead_code)]

use asset_compiler::asset_path::AssetRoot;
use std::fs;
use std::path::{Path, PathBuf};

/// A scratch directory under the system temp dir, removed on drop.
pub struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("asset_compiler-{name}-{}", std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.join(relative)
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn root(&self, relative: &str) -> AssetRoot {
        AssetRoot::new(self.join(relative)).unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

pub fn tileset_tsx(image: &str, tiles: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="world" tilewidth="32" tileheight="32" tilecount="4" columns="2">
 <image source="{image}" width="64" height="64"/>
{tiles}
</tileset>"#
    )
}

/// A 3x2 map of 32px tiles using `tilesets/world.tsx`.
pub fn map_tmx(objects: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="3" height="2" tilewidth="32" tileheight="32" infinite="0">
 <properties>
  <property name="map_min_x" type="int" value="0"/>
  <property name="map_min_y" type="int" value="1"/>
  <property name="map_max_x" type="int" value="3"/>
  <property name="map_max_y" type="int" value="2"/>
 </properties>
 <tileset firstgid="1" source="../tilesets/world.tsx"/>
 <layer id="1" name="ground" width="3" height="2">
  <data encoding="csv">
1,2,0,
0,3,4
</data>
 </layer>
 <group id="2" name="decor">
  <layer id="3" name="props" width="3" height="2">
   <data encoding="csv">
0,0,0,
4,0,0
</data>
  </layer>
 </group>
{objects}
</map>"#
    )
}

pub const SPAWNS_AND_ZONES: &str = r#" <objectgroup id="4" name="Spawns">
  <object id="1" name="player" type="spawn" x="16" y="32"/>
  <object id="2" name="ai" class="spawn" x="48" y="0"/>
 </objectgroup>
 <objectgroup id="5" name="Zones">
  <object id="3" name="spawn_room" x="32" y="64" width="64" height="32"/>
 </objectgroup>"#;

pub const BLOCKING_TILE: &str = r#" <tile id="1">
  <properties>
   <property name="blocks_los" type="bool" value="true"/>
   <property name="blocks_ai" type="bool" value="true"/>
   <property name="blocks_bullets" type="bool" value="false"/>
  </properties>
 </tile>"#;

/// Lays out `maps/level.tmx`, `tilesets/world.tsx` and `textures/world.png`
/// under `assets/` and returns the map path.
pub fn write_map_assets(fixture: &Fixture, objects: &str, tiles: &str) -> PathBuf {
    fixture.write("assets/textures/world.png", b"\x89PNG fake");
    fixture.write(
        "assets/tilesets/world.tsx",
        tileset_tsx("../textures/world.png", tiles),
    );
    fixture.write("assets/maps/level.tmx", map_tmx(objects))
}

/// Little-endian reader over a compiled blob.
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn take(&mut self, len: usize) -> &'a [u8] {
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        head
    }

    pub fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    pub fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    pub fn string(&mut self) -> String {
        let len = self.u16() as usize;
        String::from_utf8(self.take(len).to_vec()).unwrap()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
