pub mod asset_path;
pub mod config;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod puzzle;
pub mod tiled;
