//! Little-endian primitives every compiled asset is written with.
//!
//! Strings are UTF-8 with a `u16` byte-length prefix. Counted sequences use the
//! same `u16` prefix, so anything longer than [`u16::MAX`] is rejected with
//! [`AssetError::EncodingOverflow`] instead of being truncated.

use crate::{AssetError, AssetResult};
use std::io::Write;

/// A four character format tag.
///
/// The engine reads the tag as a little-endian `u32` and compares it against
/// `(c0 << 24) | (c1 << 16) | (c2 << 8) | c3`, so `MAP ` lands on disk as ` PAM`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MAP: Self = Self(*b"MAP ");
    pub const PUZZLE: Self = Self(*b"PUZZ");

    pub const fn value(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl core::fmt::Display for FourCC {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "'{}'", self.0.escape_ascii())
    }
}

/// Checks that `len` fits a `u16` length prefix.
pub fn encode_len(what: &'static str, len: usize) -> AssetResult<u16> {
    u16::try_from(len).map_err(|_| AssetError::EncodingOverflow { what, len })
}

pub trait WireWrite: Write {
    fn write_u8(&mut self, value: u8) -> AssetResult<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> AssetResult<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> AssetResult<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_f32(&mut self, value: f32) -> AssetResult<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_magic(&mut self, tag: FourCC) -> AssetResult<()> {
        self.write_u32(tag.value())
    }

    /// Writes the `u16` element count of a sequence.
    fn write_count(&mut self, what: &'static str, len: usize) -> AssetResult<()> {
        let len = encode_len(what, len)?;
        self.write_u16(len)
    }

    /// Writes a length-prefixed UTF-8 string. Nothing is written if it is too long.
    fn write_str(&mut self, value: &str) -> AssetResult<()> {
        let len = encode_len("string", value.len())?;
        self.write_u16(len)?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + ?Sized> WireWrite for W {}
