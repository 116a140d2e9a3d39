//! Pure logic: piece-size validation, palette construction, single-piece
//! assembly, grid partitioning, and large-structure metadata. None of this
//! module touches the disk or the world adapter — see spec.md §4.2.

use crate::block::BlockData;
use crate::config::MAX_SINGLE_PIECE_AXIS;
use crate::error::Result;
use crate::positioned::{PositionedBlock, PositionedEntity};
use crate::region::Region;
use crate::structure::{AxisExtent, BlockEntry, EntityEntry, GridCoordinate, LargeMetadata, StructureFile};
use rustc_hash::FxHashMap;

/// Signed-integer ceiling division. `i32::div_ceil` is still gated behind the
/// unstable `int_roundings` feature on stable Rust; this mirrors its exact
/// semantics (quotient rounded toward positive infinity).
fn div_ceil_i32(lhs: i32, rhs: i32) -> i32 {
    let d = lhs / rhs;
    let r = lhs % rhs;
    if (r > 0 && rhs > 0) || (r < 0 && rhs < 0) {
        d + 1
    } else {
        d
    }
}

pub struct StructureBuilder;

impl StructureBuilder {
    pub fn validate_single_size(region: &Region) -> Result<()> {
        region.validate_single_piece_size(MAX_SINGLE_PIECE_AXIS)
    }

    /// Builds a deduplicated palette in first-occurrence order, plus the
    /// index each input block was assigned.
    pub fn build_palette(blocks: &[BlockData]) -> (Vec<BlockData>, Vec<usize>) {
        let mut palette = Vec::new();
        let mut index_of: FxHashMap<BlockData, usize> = FxHashMap::default();
        let mut indices = Vec::with_capacity(blocks.len());

        for block in blocks {
            let index = *index_of.entry(block.clone()).or_insert_with(|| {
                palette.push(block.clone());
                palette.len() - 1
            });
            indices.push(index);
        }

        (palette, indices)
    }

    pub fn build_structure_data(
        region: &Region,
        blocks: &[PositionedBlock],
        entities: &[PositionedEntity],
        data_version: i32,
    ) -> StructureFile {
        let (min_x, min_y, min_z) = region.min();
        let block_states: Vec<BlockData> = blocks.iter().map(|b| b.block.clone()).collect();
        let (palette, indices) = Self::build_palette(&block_states);

        let mut entries: Vec<BlockEntry> = blocks
            .iter()
            .zip(indices)
            .map(|(b, state)| BlockEntry {
                pos: (b.x - min_x, b.y - min_y, b.z - min_z),
                state,
                nbt: b.block_entity.clone(),
            })
            .collect();
        entries.sort_by_key(|e| (e.pos.1, e.pos.2, e.pos.0));

        let entity_entries: Vec<EntityEntry> = entities
            .iter()
            .map(|e| EntityEntry {
                block_pos: (e.block_x - min_x, e.block_y - min_y, e.block_z - min_z),
                pos: (
                    e.world_x - min_x as f64,
                    e.world_y - min_y as f64,
                    e.world_z - min_z as f64,
                ),
                nbt: e.entity_nbt.clone(),
            })
            .collect();

        let mut file = StructureFile::new(region.size());
        file.data_version = data_version;
        file.palette = palette;
        file.blocks = entries;
        file.entities = entity_entries;
        file
    }

    /// Partitions `region` into a grid of at-most-`piece_size_x`×`piece_size_z`
    /// sub-regions; `piece_size_y`, if given, splits vertically too (the
    /// experimental path noted in spec.md §9).
    pub fn split_into_grid(
        region: &Region,
        piece_size_x: i32,
        piece_size_z: i32,
        piece_size_y: Option<i32>,
    ) -> Vec<(GridCoordinate, Region)> {
        match piece_size_y {
            None => region
                .split_into_grid(piece_size_x, piece_size_z)
                .into_iter()
                .map(|((gx, gy, gz), r)| (GridCoordinate::new(gx, gy, gz), r))
                .collect(),
            Some(step_y) => {
                let (_, size_y, _) = region.size();
                let (_min_x, min_y, _min_z) = region.min();
                let rows = region.split_into_grid(piece_size_x, piece_size_z);
                let y_steps = div_ceil_i32(size_y, step_y);
                let mut out = Vec::with_capacity(rows.len() * y_steps as usize);
                for gy in 0..y_steps {
                    let y0 = min_y + gy * step_y;
                    let y1 = (y0 + step_y - 1).min(region.max().1);
                    for ((gx, _, gz), xz_region) in &rows {
                        let (min, max) = (xz_region.min(), xz_region.max());
                        let piece = Region::from_corners((min.0, y0, min.2), (max.0, y1, max.2));
                        out.push((GridCoordinate::new(*gx, gy, *gz), piece));
                    }
                }
                out
            }
        }
    }

    /// Assembles the `large` metadata sub-map embedded only in piece `0.0.0`.
    pub fn create_large_structure_metadata(
        region: &Region,
        piece_size_x: i32,
        piece_size_z: i32,
        piece_size_y: Option<i32>,
        required_mods: Vec<String>,
    ) -> LargeMetadata {
        let (size_x, size_y, size_z) = region.size();
        let grid_x = div_ceil_i32(size_x, piece_size_x);
        let grid_z = div_ceil_i32(size_z, piece_size_z);
        let grid_y = piece_size_y.map(|step| div_ceil_i32(size_y, step));

        LargeMetadata {
            requires: required_mods,
            piece_size: AxisExtent {
                x: piece_size_x,
                z: piece_size_z,
                y: piece_size_y,
            },
            grid_size: AxisExtent {
                x: grid_x,
                z: grid_z,
                y: grid_y,
            },
            total_size: (size_x, size_y, size_z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NbtTree;

    #[test]
    fn palette_assigns_first_occurrence_indices() {
        let blocks = vec![
            BlockData::new("minecraft:stone"),
            BlockData::new("minecraft:dirt"),
            BlockData::new("minecraft:stone"),
        ];
        let (palette, indices) = StructureBuilder::build_palette(&blocks);
        assert_eq!(palette.len(), 2);
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn build_structure_data_shifts_to_relative_coords_and_sorts_yzx() {
        let region = Region::from_corners((10, 60, 10), (11, 60, 11));
        let blocks = vec![
            PositionedBlock::new(11, 60, 10, BlockData::new("minecraft:dirt")),
            PositionedBlock::new(10, 60, 10, BlockData::new("minecraft:stone")),
        ];
        let file = StructureBuilder::build_structure_data(&region, &blocks, &[], 3700);
        assert_eq!(file.size, (2, 1, 2));
        assert_eq!(file.blocks[0].pos, (0, 0, 0));
        assert_eq!(file.blocks[1].pos, (1, 0, 0));
    }

    #[test]
    fn large_metadata_matches_scenario_from_spec() {
        let region = Region::from_corners((1000, 60, 1000), (1099, 109, 1099));
        let meta = StructureBuilder::create_large_structure_metadata(&region, 48, 48, None, vec![]);
        assert_eq!(meta.grid_size.x, 3);
        assert_eq!(meta.grid_size.z, 3);
        assert_eq!(meta.total_size, (100, 50, 100));
        assert_eq!(meta.piece_count(), 9);
    }

    #[test]
    fn block_entity_nbt_is_preserved_verbatim() {
        let region = Region::from_corners((0, 0, 0), (0, 0, 0));
        let mut nbt = NbtTree::new();
        nbt.insert("Items", crate::tree::NbtValue::List(vec![]));
        let blocks = vec![PositionedBlock::new(0, 0, 0, BlockData::new("minecraft:chest"))
            .with_block_entity(nbt.clone())];
        let file = StructureBuilder::build_structure_data(&region, &blocks, &[], 3700);
        assert_eq!(file.blocks[0].nbt, Some(nbt));
    }
}
