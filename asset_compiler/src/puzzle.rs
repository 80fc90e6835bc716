use crate::asset_path::locate_file;
use crate::tiled::{child, children, parse_document, read_descriptor, required_attr, root_element};
use map_asset::puzzle::{CpuState, Puzzle, PuzzleTest, RamFragment};
use map_asset::{AssetError, AssetResult};
use roxmltree::Node;
use std::io::Write;
use std::path::Path;

/// Reads a puzzle definition:
///
/// ```xml
/// <puzzle>
///   <title>LDA indirect</title>
///   <description>...</description>
///   <tests>
///     <test>
///       <initial_state pc="1"><ram addr="0x2080">10,20</ram></initial_state>
///       <pass_state pc="3" a="10"/>
///     </test>
///   </tests>
/// </puzzle>
/// ```
///
/// All numbers are hexadecimal. Missing registers default to zero.
pub fn read_puzzle(descriptor: &Path) -> AssetResult<Puzzle> {
    let descriptor = locate_file(descriptor)?;
    let text = read_descriptor(&descriptor)?;
    let doc = parse_document(&descriptor, &text)?;
    let node = root_element(&doc, "puzzle", &descriptor)?;
    let path = descriptor.as_path();

    let tests = child(node, "tests")
        .into_iter()
        .flat_map(|tests| children(tests, "test"))
        .map(|test| {
            Ok(PuzzleTest {
                initial_state: read_state(required_child(test, "initial_state", path)?, path)?,
                pass_state: read_state(required_child(test, "pass_state", path)?, path)?,
            })
        })
        .collect::<AssetResult<Vec<_>>>()?;

    Ok(Puzzle {
        title: element_text(node, "title", path)?,
        description: element_text(node, "description", path)?,
        tests,
    })
}

pub fn compile_puzzle<W: Write + ?Sized>(descriptor: &Path, out: &mut W) -> AssetResult<()> {
    read_puzzle(descriptor)?.write(out)
}

fn required_child<'a, 'input>(node: Node<'a, 'input>, tag: &str, path: &Path) -> AssetResult<Node<'a, 'input>> {
    child(node, tag).ok_or_else(|| {
        AssetError::malformed(
            path,
            format!("<{}> is missing <{tag}>", node.tag_name().name()),
        )
    })
}

/// The element must exist, its text may be empty.
fn element_text(node: Node, tag: &str, path: &Path) -> AssetResult<String> {
    let element = required_child(node, tag, path)?;
    Ok(element.text().unwrap_or_default().to_owned())
}

fn read_state(node: Node, path: &Path) -> AssetResult<CpuState> {
    Ok(CpuState {
        program_counter: hex_attr(node, "pc", path)?,
        status_register: hex_attr(node, "p", path)?,
        accumulator: hex_attr(node, "a", path)?,
        index_register: hex_attr(node, "x", path)?,
        ram: children(node, "ram")
            .map(|ram| {
                let base_address = parse_hex(required_attr(ram, "addr", path)?, path)?;
                let data = ram
                    .text()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(|text| {
                        text.split(',')
                            .map(|byte| parse_hex(byte, path))
                            .collect::<AssetResult<Vec<u8>>>()
                    })
                    .transpose()?
                    .unwrap_or_default();
                Ok(RamFragment { base_address, data })
            })
            .collect::<AssetResult<Vec<_>>>()?,
    })
}

fn hex_attr<T: TryFrom<u32>>(node: Node, name: &str, path: &Path) -> AssetResult<T> {
    parse_hex(node.attribute(name).unwrap_or("0"), path)
}

fn parse_hex<T: TryFrom<u32>>(value: &str, path: &Path) -> AssetResult<T> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    // from_str_radix takes a leading '+', bytes and registers never carry a sign
    Some(digits)
        .filter(|digits| !digits.starts_with('+'))
        .and_then(|digits| u32::from_str_radix(digits, 16).ok())
        .and_then(|wide| T::try_from(wide).ok())
        .ok_or_else(|| {
            AssetError::malformed(
                path,
                format!("'{value}' is not a {}-bit hexadecimal value", size_of::<T>() * 8),
            )
        })
}
