pub mod error;
pub mod puzzle;
pub mod tilemap;
pub mod tileset;
pub mod wire;

pub use error::{AssetError, AssetResult};
pub use wire::{FourCC, WireWrite};
