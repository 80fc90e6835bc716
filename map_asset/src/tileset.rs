use crate::wire::WireWrite;
use crate::{AssetError, AssetResult};
use bitflags::bitflags;
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

bitflags! {
    /// Gameplay behaviour of a single tile, as read by the engine's collision and AI code.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
    pub struct TileFlags: u8 {
        const BLOCKS_MOVABLES = 0x01;
        const BLOCKS_LOS      = 0x02;
        const BLOCKS_BULLETS  = 0x04;
        const BLOCKS_AI       = 0x08;
    }
}

/// A tile property name the compiler understands.
///
/// Every property on a tile must be one of these; anything else is rejected so
/// a typo in the editor can't silently drop collision data.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TileProperty {
    BlocksMovables,
    BlocksLos,
    BlocksBullets,
    BlocksAi,
}

impl TileProperty {
    pub const ALL: [TileProperty; 4] = [
        TileProperty::BlocksMovables,
        TileProperty::BlocksLos,
        TileProperty::BlocksBullets,
        TileProperty::BlocksAi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TileProperty::BlocksMovables => "blocks_movables",
            TileProperty::BlocksLos => "blocks_los",
            TileProperty::BlocksBullets => "blocks_bullets",
            TileProperty::BlocksAi => "blocks_ai",
        }
    }

    pub fn flag(self) -> TileFlags {
        match self {
            TileProperty::BlocksMovables => TileFlags::BLOCKS_MOVABLES,
            TileProperty::BlocksLos => TileFlags::BLOCKS_LOS,
            TileProperty::BlocksBullets => TileFlags::BLOCKS_BULLETS,
            TileProperty::BlocksAi => TileFlags::BLOCKS_AI,
        }
    }
}

impl FromStr for TileProperty {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TileProperty::ALL
            .into_iter()
            .find(|property| property.name() == s)
            .ok_or_else(|| {
                AssetError::schema(format!(
                    "unrecognized tile property '{s}' (expected one of blocks_movables, blocks_los, blocks_bullets, blocks_ai)"
                ))
            })
    }
}

/// A compiled tileset: where its image lives and which tiles carry flags.
#[derive(Clone, PartialEq, Debug)]
pub struct Tileset {
    /// Image path relative to the asset root, with `/` separators.
    pub image_path: String,
    pub tile_count: u16,
    /// Sparse: only tiles with at least one flag are present.
    flags: BTreeMap<u16, TileFlags>,
}

impl Tileset {
    pub fn new(image_path: impl Into<String>, tile_count: u16) -> Self {
        Self {
            image_path: image_path.into(),
            tile_count,
            flags: BTreeMap::new(),
        }
    }

    /// Sets the flags of a local tile id. Empty flags remove the tile from the table.
    pub fn set_flags(&mut self, tile_id: u16, flags: TileFlags) -> AssetResult<()> {
        if tile_id >= self.tile_count {
            return Err(AssetError::schema(format!(
                "tile id {tile_id} is outside a tileset of {} tiles",
                self.tile_count
            )));
        }

        if flags.is_empty() {
            self.flags.remove(&tile_id);
        } else {
            self.flags.insert(tile_id, flags);
        }
        Ok(())
    }

    pub fn flags(&self, tile_id: u16) -> TileFlags {
        self.flags.get(&tile_id).copied().unwrap_or_default()
    }

    /// Flagged tiles in ascending id order.
    pub fn flagged_tiles(&self) -> impl Iterator<Item = (u16, TileFlags)> + '_ {
        self.flags.iter().map(|(id, flags)| (*id, *flags))
    }

    /// Writes the image path, the tile count and one `{id:16, flags:8, pad:8}`
    /// record per flagged tile.
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> AssetResult<()> {
        out.write_str(&self.image_path)?;
        out.write_u16(self.tile_count)?;
        for (tile_id, flags) in self.flagged_tiles() {
            out.write_u16(tile_id)?;
            out.write_u8(flags.bits())?;
            out.write_u8(0)?;
        }
        Ok(())
    }
}

/// A tileset as referenced from a map, owning the global ids
/// `first_gid..first_gid + tile_count`.
#[derive(Clone, PartialEq, Debug)]
pub struct TilesetRef {
    pub first_gid: u32,
    pub tileset: Tileset,
}

impl TilesetRef {
    pub fn end_gid(&self) -> u32 {
        self.first_gid.saturating_add(u32::from(self.tileset.tile_count))
    }

    pub fn contains(&self, gid: u16) -> bool {
        (self.first_gid..self.end_gid()).contains(&u32::from(gid))
    }
}
