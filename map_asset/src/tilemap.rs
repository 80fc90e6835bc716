use crate::tileset::TilesetRef;
use crate::wire::{FourCC, WireWrite};
use crate::{AssetError, AssetResult};
use std::io::Write;

/// A map ready to be written in the engine's `MAP ` format.
///
/// Built from a descriptor, checked with [`TileMap::validate`] and written once
/// with [`TileMap::write`]. Spawn and zone coordinates are tile-fractional.
#[derive(Clone, PartialEq, Debug)]
pub struct TileMap {
    /// Edge length of a (square) tile in pixels.
    pub tile_size: u16,
    /// Width in tiles.
    pub width: u16,
    /// Height in tiles.
    pub height: u16,
    pub layers: Vec<Layer>,
    /// Ordered by ascending `first_gid`.
    pub tilesets: Vec<TilesetRef>,
    pub bounds: Option<MapBounds>,
    pub spawns: Vec<SpawnPoint>,
    pub zones: Vec<Zone>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
    /// Only used for diagnostics, never written.
    pub name: String,
    /// Row-major global tile ids, `0` meaning empty.
    pub tiles: Vec<u16>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MapBounds {
    pub min_x: u16,
    pub min_y: u16,
    pub max_x: u16,
    pub max_y: u16,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SpawnRole {
    Player,
    Ai,
}

impl SpawnRole {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "player" => Some(SpawnRole::Player),
            "ai" => Some(SpawnRole::Ai),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SpawnPoint {
    pub role: SpawnRole,
    pub x: f32,
    pub y: f32,
}

impl SpawnPoint {
    pub fn from_pixels(role: SpawnRole, x: f32, y: f32, tile_size: u16) -> Self {
        Self {
            role,
            x: to_tiles(x, tile_size),
            y: to_tiles(y, tile_size),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Zone {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Zone {
    pub fn from_pixels(
        name: impl Into<String>,
        (x, y, width, height): (f32, f32, f32, f32),
        tile_size: u16,
    ) -> Self {
        Self {
            name: name.into(),
            x: to_tiles(x, tile_size),
            y: to_tiles(y, tile_size),
            width: to_tiles(width, tile_size),
            height: to_tiles(height, tile_size),
        }
    }
}

/// Converts a pixel distance into tiles.
pub fn to_tiles(pixels: f32, tile_size: u16) -> f32 {
    pixels / f32::from(tile_size)
}

impl TileMap {
    pub fn area(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// The tileset owning `gid`: the one with the greatest `first_gid <= gid`,
    /// provided `gid` falls inside its range.
    pub fn tileset_for_gid(&self, gid: u16) -> Option<&TilesetRef> {
        let idx = self
            .tilesets
            .partition_point(|tileset| tileset.first_gid <= u32::from(gid));
        let candidate = self.tilesets.get(idx.checked_sub(1)?)?;
        candidate.contains(gid).then_some(candidate)
    }

    pub fn player_spawn(&self) -> AssetResult<&SpawnPoint> {
        let mut players = self.spawns.iter().filter(|s| s.role == SpawnRole::Player);
        match (players.next(), players.next()) {
            (Some(player), None) => Ok(player),
            _ => {
                let count = self.spawns.iter().filter(|s| s.role == SpawnRole::Player).count();
                Err(AssetError::schema(format!(
                    "zero or multiple player spawns (found {count}, expected exactly one)"
                )))
            }
        }
    }

    pub fn ai_spawns(&self) -> impl Iterator<Item = &SpawnPoint> {
        self.spawns.iter().filter(|s| s.role == SpawnRole::Ai)
    }

    pub fn validate(&self) -> AssetResult<()> {
        if self.tile_size == 0 || self.width == 0 || self.height == 0 {
            return Err(AssetError::schema(format!(
                "tile size and map dimensions must be positive (tile size {}, {}x{})",
                self.tile_size, self.width, self.height
            )));
        }

        let area = self.area();
        for layer in &self.layers {
            if layer.tiles.len() != area {
                return Err(AssetError::schema(format!(
                    "layer '{}' has {} tiles, expected {}x{} = {area}",
                    layer.name,
                    layer.tiles.len(),
                    self.width,
                    self.height
                )));
            }
        }

        let mut previous_end = 1;
        for tileset in &self.tilesets {
            if tileset.first_gid < previous_end {
                return Err(AssetError::schema(format!(
                    "tileset '{}' starts at gid {}, overlapping the previous range ending at {}",
                    tileset.tileset.image_path, tileset.first_gid, previous_end
                )));
            }
            previous_end = tileset.end_gid();
        }

        for layer in &self.layers {
            if let Some(gid) = layer
                .tiles
                .iter()
                .copied()
                .find(|gid| *gid != 0 && self.tileset_for_gid(*gid).is_none())
            {
                return Err(AssetError::schema(format!(
                    "layer '{}' uses gid {gid}, which no tileset owns",
                    layer.name
                )));
            }
        }

        self.player_spawn()?;

        let spawn_coords = self.spawns.iter().flat_map(|s| [s.x, s.y]);
        let zone_coords = self.zones.iter().flat_map(|z| [z.x, z.y, z.width, z.height]);
        if spawn_coords.chain(zone_coords).any(|v| !v.is_finite()) {
            return Err(AssetError::schema("spawn or zone coordinate is not finite"));
        }

        Ok(())
    }

    /// Validates the map and writes it. The format carries a single tileset whose
    /// flag records run to the end of the blob, so exactly one is required.
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> AssetResult<()> {
        self.validate()?;
        let [tileset] = self.tilesets.as_slice() else {
            return Err(AssetError::schema(format!(
                "map references {} tilesets, the map format holds exactly one",
                self.tilesets.len()
            )));
        };
        let player = self.player_spawn()?;

        out.write_magic(FourCC::MAP)?;
        out.write_u16(self.tile_size)?;
        out.write_u16(self.width)?;
        out.write_u16(self.height)?;

        for layer in &self.layers {
            for gid in &layer.tiles {
                out.write_u16(*gid)?;
            }
        }

        if let Some(bounds) = self.bounds {
            out.write_u16(bounds.min_x)?;
            out.write_u16(bounds.min_y)?;
            out.write_u16(bounds.max_x)?;
            out.write_u16(bounds.max_y)?;
        }

        out.write_f32(player.x)?;
        out.write_f32(player.y)?;

        out.write_count("ai spawn list", self.ai_spawns().count())?;
        for spawn in self.ai_spawns() {
            out.write_f32(spawn.x)?;
            out.write_f32(spawn.y)?;
        }

        out.write_count("zone list", self.zones.len())?;
        for zone in &self.zones {
            out.write_f32(zone.x)?;
            out.write_f32(zone.y)?;
            out.write_f32(zone.width)?;
            out.write_f32(zone.height)?;
            out.write_str(&zone.name)?;
        }

        tileset.tileset.write(out)
    }

    pub fn to_bytes(&self) -> AssetResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }
}
