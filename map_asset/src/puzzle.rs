use crate::AssetResult;
use crate::wire::{FourCC, WireWrite};
use std::io::Write;

/// A CPU puzzle: a title, a description and the register/RAM states a
/// solution is checked against.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Puzzle {
    pub title: String,
    pub description: String,
    pub tests: Vec<PuzzleTest>,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct PuzzleTest {
    pub initial_state: CpuState,
    pub pass_state: CpuState,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct CpuState {
    pub program_counter: u16,
    pub status_register: u8,
    pub accumulator: u8,
    pub index_register: u8,
    pub ram: Vec<RamFragment>,
}

/// A run of bytes starting at `base_address`.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RamFragment {
    pub base_address: u16,
    pub data: Vec<u8>,
}

impl Puzzle {
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> AssetResult<()> {
        out.write_magic(FourCC::PUZZLE)?;
        out.write_str(&self.title)?;
        out.write_str(&self.description)?;
        out.write_count("puzzle test list", self.tests.len())?;
        for test in &self.tests {
            test.initial_state.write(out)?;
            test.pass_state.write(out)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> AssetResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }
}

impl CpuState {
    fn write<W: Write + ?Sized>(&self, out: &mut W) -> AssetResult<()> {
        out.write_u16(self.program_counter)?;
        out.write_u8(self.status_register)?;
        out.write_u8(self.accumulator)?;
        out.write_u8(self.index_register)?;
        out.write_count("RAM fragment list", self.ram.len())?;
        for fragment in &self.ram {
            out.write_u16(fragment.base_address)?;
            out.write_count("RAM fragment", fragment.data.len())?;
            out.write_all(&fragment.data)?;
        }
        Ok(())
    }
}
