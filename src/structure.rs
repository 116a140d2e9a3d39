//! The logical contents of one on-disk piece, and its neutral-tree mapping.
//!
//! `StructureFile <-> NbtTree` conversion lives here rather than in
//! `codec.rs` — the codec only knows tagged-binary bytes and the neutral
//! tree; this module is where that tree gets a schema. Grounded on the
//! compound-tree assembly pattern in the teacher's `formats/litematic.rs`.

use crate::block::BlockData;
use crate::config::DEFAULT_DATA_VERSION;
use crate::tree::{NbtTree, NbtValue};
use std::collections::BTreeMap;

/// `(gx, gy, gz)`. `gy` is reserved — current splitting always produces `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCoordinate {
    pub gx: i32,
    pub gy: i32,
    pub gz: i32,
}

impl GridCoordinate {
    pub fn new(gx: i32, gy: i32, gz: i32) -> Self {
        GridCoordinate { gx, gy, gz }
    }

    pub fn is_origin(&self) -> bool {
        self.gx == 0 && self.gy == 0 && self.gz == 0
    }

    pub fn filename(&self) -> String {
        format!("{}.{}.{}.nbt", self.gx, self.gy, self.gz)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    pub pos: (i32, i32, i32),
    pub state: usize,
    pub nbt: Option<NbtTree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityEntry {
    pub block_pos: (i32, i32, i32),
    pub pos: (f64, f64, f64),
    pub nbt: NbtTree,
}

/// Axis extent that may omit `y` (vertical splitting is experimental, per
/// spec.md §9's open question on `grid_size_y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisExtent {
    pub x: i32,
    pub z: i32,
    pub y: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargeMetadata {
    pub requires: Vec<String>,
    pub piece_size: AxisExtent,
    pub grid_size: AxisExtent,
    pub total_size: (i32, i32, i32),
}

impl LargeMetadata {
    /// `∏ grid_size_axis`, derived as spec.md §4.9's `get_large_metadata` requires.
    pub fn piece_count(&self) -> i64 {
        let y = self.grid_size.y.unwrap_or(1) as i64;
        self.grid_size.x as i64 * y * self.grid_size.z as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureFile {
    pub data_version: i32,
    pub size: (i32, i32, i32),
    pub palette: Vec<BlockData>,
    pub blocks: Vec<BlockEntry>,
    pub entities: Vec<EntityEntry>,
    pub metadata: Option<BTreeMap<String, String>>,
    pub large: Option<LargeMetadata>,
}

impl StructureFile {
    pub fn new(size: (i32, i32, i32)) -> Self {
        StructureFile {
            data_version: DEFAULT_DATA_VERSION,
            size,
            palette: Vec::new(),
            blocks: Vec::new(),
            entities: Vec::new(),
            metadata: None,
            large: None,
        }
    }

    pub fn to_nbt_tree(&self) -> NbtTree {
        let mut root = NbtTree::new();
        root.insert("DataVersion", NbtValue::Int(self.data_version));
        root.insert(
            "size",
            NbtValue::IntArray(vec![self.size.0, self.size.1, self.size.2]),
        );
        root.insert(
            "palette",
            NbtValue::List(self.palette.iter().map(BlockData::to_nbt_value).collect()),
        );
        root.insert(
            "blocks",
            NbtValue::List(self.blocks.iter().map(block_entry_to_value).collect()),
        );
        root.insert(
            "entities",
            NbtValue::List(self.entities.iter().map(entity_entry_to_value).collect()),
        );

        if let Some(metadata) = &self.metadata {
            let mut tree = NbtTree::new();
            for (k, v) in metadata {
                tree.insert(k.clone(), NbtValue::String(v.clone()));
            }
            root.insert("metadata", NbtValue::Compound(tree));
        }

        if let Some(large) = &self.large {
            root.insert("large", large_to_value(large));
        }

        root
    }

    pub fn from_nbt_tree(tree: &NbtTree) -> Result<Self, String> {
        let data_version = tree.get_int("DataVersion").unwrap_or(DEFAULT_DATA_VERSION);
        let size = match tree.get("size") {
            Some(NbtValue::IntArray(arr)) if arr.len() == 3 => (arr[0], arr[1], arr[2]),
            _ => return Err("structure file is missing a 3-element 'size'".into()),
        };

        let palette = match tree.get("palette") {
            Some(NbtValue::List(items)) => items
                .iter()
                .map(BlockData::from_nbt_value)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let blocks = match tree.get("blocks") {
            Some(NbtValue::List(items)) => items
                .iter()
                .map(block_entry_from_value)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let entities = match tree.get("entities") {
            Some(NbtValue::List(items)) => items
                .iter()
                .map(entity_entry_from_value)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let metadata = match tree.get("metadata") {
            Some(NbtValue::Compound(m)) => Some(
                m.iter()
                    .filter_map(|(k, v)| match v {
                        NbtValue::String(s) => Some((k.clone(), s.clone())),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        };

        let large = match tree.get("large") {
            Some(v @ NbtValue::Compound(_)) => Some(large_from_value(v)?),
            _ => None,
        };

        Ok(StructureFile {
            data_version,
            size,
            palette,
            blocks,
            entities,
            metadata,
            large,
        })
    }
}

fn block_entry_to_value(entry: &BlockEntry) -> NbtValue {
    let mut tree = NbtTree::new();
    tree.insert(
        "pos",
        NbtValue::IntArray(vec![entry.pos.0, entry.pos.1, entry.pos.2]),
    );
    tree.insert("state", NbtValue::Int(entry.state as i32));
    if let Some(nbt) = &entry.nbt {
        tree.insert("nbt", NbtValue::Compound(nbt.clone()));
    }
    NbtValue::Compound(tree)
}

fn block_entry_from_value(value: &NbtValue) -> Result<BlockEntry, String> {
    let NbtValue::Compound(tree) = value else {
        return Err("block entry is not a compound".into());
    };
    let pos = match tree.get("pos") {
        Some(NbtValue::IntArray(arr)) if arr.len() == 3 => (arr[0], arr[1], arr[2]),
        _ => return Err("block entry is missing 'pos'".into()),
    };
    let state = tree
        .get_int("state")
        .ok_or_else(|| "block entry is missing 'state'".to_string())? as usize;
    let nbt = match tree.get("nbt") {
        Some(NbtValue::Compound(c)) => Some(c.clone()),
        _ => None,
    };
    Ok(BlockEntry { pos, state, nbt })
}

fn entity_entry_to_value(entry: &EntityEntry) -> NbtValue {
    let mut tree = NbtTree::new();
    tree.insert(
        "blockPos",
        NbtValue::IntArray(vec![entry.block_pos.0, entry.block_pos.1, entry.block_pos.2]),
    );
    tree.insert(
        "pos",
        NbtValue::List(vec![
            NbtValue::Double(entry.pos.0),
            NbtValue::Double(entry.pos.1),
            NbtValue::Double(entry.pos.2),
        ]),
    );
    tree.insert("nbt", NbtValue::Compound(entry.nbt.clone()));
    NbtValue::Compound(tree)
}

fn entity_entry_from_value(value: &NbtValue) -> Result<EntityEntry, String> {
    let NbtValue::Compound(tree) = value else {
        return Err("entity entry is not a compound".into());
    };
    let block_pos = match tree.get("blockPos") {
        Some(NbtValue::IntArray(arr)) if arr.len() == 3 => (arr[0], arr[1], arr[2]),
        _ => return Err("entity entry is missing 'blockPos'".into()),
    };
    let pos = match tree.get("pos") {
        Some(NbtValue::List(items)) if items.len() == 3 => {
            let get = |v: &NbtValue| match v {
                NbtValue::Double(d) => Some(*d),
                _ => None,
            };
            (
                get(&items[0]).ok_or("entity pos[0] is not a double")?,
                get(&items[1]).ok_or("entity pos[1] is not a double")?,
                get(&items[2]).ok_or("entity pos[2] is not a double")?,
            )
        }
        _ => return Err("entity entry is missing 'pos'".into()),
    };
    let nbt = match tree.get("nbt") {
        Some(NbtValue::Compound(c)) => c.clone(),
        _ => NbtTree::new(),
    };
    Ok(EntityEntry { block_pos, pos, nbt })
}

fn axis_extent_to_value(extent: &AxisExtent) -> NbtValue {
    let mut tree = NbtTree::new();
    tree.insert("x", NbtValue::Int(extent.x));
    tree.insert("z", NbtValue::Int(extent.z));
    if let Some(y) = extent.y {
        tree.insert("y", NbtValue::Int(y));
    }
    NbtValue::Compound(tree)
}

fn axis_extent_from_value(value: &NbtValue) -> Result<AxisExtent, String> {
    let NbtValue::Compound(tree) = value else {
        return Err("axis extent is not a compound".into());
    };
    Ok(AxisExtent {
        x: tree.get_int("x").ok_or("axis extent missing 'x'")?,
        z: tree.get_int("z").ok_or("axis extent missing 'z'")?,
        y: tree.get_int("y"),
    })
}

fn large_to_value(large: &LargeMetadata) -> NbtValue {
    let mut tree = NbtTree::new();
    tree.insert(
        "requires",
        NbtValue::List(
            large
                .requires
                .iter()
                .map(|s| NbtValue::String(s.clone()))
                .collect(),
        ),
    );
    tree.insert("pieceSize", axis_extent_to_value(&large.piece_size));
    tree.insert("gridSize", axis_extent_to_value(&large.grid_size));
    tree.insert(
        "totalSize",
        NbtValue::IntArray(vec![
            large.total_size.0,
            large.total_size.1,
            large.total_size.2,
        ]),
    );
    NbtValue::Compound(tree)
}

fn large_from_value(value: &NbtValue) -> Result<LargeMetadata, String> {
    let NbtValue::Compound(tree) = value else {
        return Err("'large' is not a compound".into());
    };
    let requires = match tree.get("requires") {
        Some(NbtValue::List(items)) => items
            .iter()
            .filter_map(|v| match v {
                NbtValue::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let piece_size = axis_extent_from_value(
        tree.get("pieceSize")
            .ok_or("'large' is missing 'pieceSize'")?,
    )?;
    let grid_size = axis_extent_from_value(
        tree.get("gridSize").ok_or("'large' is missing 'gridSize'")?,
    )?;
    let total_size = match tree.get("totalSize") {
        Some(NbtValue::IntArray(arr)) if arr.len() == 3 => (arr[0], arr[1], arr[2]),
        _ => return Err("'large' is missing 'totalSize'".into()),
    };
    Ok(LargeMetadata {
        requires,
        piece_size,
        grid_size,
        total_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_coordinate_filename_format() {
        assert_eq!(GridCoordinate::new(1, 0, 2).filename(), "1.0.2.nbt");
        assert!(GridCoordinate::new(0, 0, 0).is_origin());
    }

    #[test]
    fn structure_file_round_trips_through_nbt_tree() {
        let mut file = StructureFile::new((2, 1, 1));
        file.palette.push(BlockData::new("minecraft:stone"));
        file.blocks.push(BlockEntry {
            pos: (0, 0, 0),
            state: 0,
            nbt: None,
        });
        file.large = Some(LargeMetadata {
            requires: vec!["minecraft".into()],
            piece_size: AxisExtent { x: 48, z: 48, y: None },
            grid_size: AxisExtent { x: 1, z: 1, y: None },
            total_size: (2, 1, 1),
        });

        let tree = file.to_nbt_tree();
        let restored = StructureFile::from_nbt_tree(&tree).unwrap();
        assert_eq!(file, restored);
        assert_eq!(restored.large.unwrap().piece_count(), 1);
    }
}
