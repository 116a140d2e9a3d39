//! Single-piece capture/place/list/replace over one archive file. See
//! spec.md §4.8. Every suspending operation returns a future; compute-heavy
//! work runs on a blocking worker so the caller's executor thread is never
//! blocked on file I/O (spec.md §5).

use crate::builder::StructureBuilder;
use crate::config::{EngineConfig, MAX_SINGLE_PIECE_AXIS};
use crate::error::{LseError, Result};
use crate::positioned::PositionedBlock;
use crate::region::Region;
use crate::replacer::BlockReplacer;
use crate::rotation::{normalize_rotation, RotationHelper};
use crate::store::NbtStore;
use crate::structure::StructureFile;
use crate::world_adapter::WorldAdapter;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlaceOptions {
    pub rotation: i32,
    pub centered: bool,
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub blocks_placed: usize,
    pub origin: (i32, i32, i32),
}

/// What `place` would do, without calling `set_blocks_in_region`.
#[derive(Debug, Clone)]
pub struct DryRunResult {
    pub blocks_affected: usize,
    pub origin: (i32, i32, i32),
    pub bounds: Region,
}

/// A read-only summary of a structure's contents, without materializing a
/// full `StructureFile` on the caller's side.
#[derive(Debug, Clone)]
pub struct StructureDescription {
    pub palette_size: usize,
    pub block_count: usize,
    pub entity_count: usize,
    pub size: (i32, i32, i32),
}

pub struct StructureApi<W: WorldAdapter> {
    store: Arc<NbtStore>,
    adapter: Arc<W>,
    config: EngineConfig,
}

impl<W: WorldAdapter> StructureApi<W> {
    pub fn new(store: Arc<NbtStore>, adapter: Arc<W>, config: EngineConfig) -> Self {
        StructureApi { store, adapter, config }
    }

    /// Captures `region` from `dimension` into a [`StructureFile`], failing
    /// [`LseError::OversizedPiece`] if any axis exceeds 48.
    pub async fn capture(&self, region: Region, dimension: &str) -> Result<StructureFile> {
        region.validate_single_piece_size(MAX_SINGLE_PIECE_AXIS)?;

        let handle = self
            .adapter
            .get_level(dimension)
            .await?
            .ok_or_else(|| LseError::UnknownDimension(dimension.to_string()))?;
        let blocks = self.adapter.get_blocks_in_region(&handle, &region).await?;
        let entities = self.adapter.get_entities_in_region(&handle, &region).await?;

        let data_version = self.config.data_version;
        let file = tokio::task::spawn_blocking(move || {
            StructureBuilder::build_structure_data(&region, &blocks, &entities, data_version)
        })
        .await
        .map_err(|e| LseError::AdapterFailure(e.to_string()))?;

        Ok(file)
    }

    pub async fn capture_to_file(&self, region: Region, dimension: &str, name: &str) -> Result<()> {
        let file = self.capture(region, dimension).await?;
        let tree = file.to_nbt_tree();
        let store = Arc::clone(&self.store);
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.write(&name, &tree, true))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))?
    }

    /// Rotates and translates every block in `file` and writes the result
    /// through the adapter in one call (preserving atomicity from the
    /// host's perspective, per spec.md §5).
    pub async fn place(
        &self,
        file: &StructureFile,
        origin: (i32, i32, i32),
        dimension: &str,
        options: PlaceOptions,
    ) -> Result<ApplyResult> {
        let rotation = normalize_rotation(options.rotation)?;
        let (size_x, _, size_z) = file.size;

        let effective_origin = if options.centered {
            (origin.0 - size_x / 2, origin.1, origin.2 - size_z / 2)
        } else {
            origin
        };

        let placed_blocks = place_piece_blocks(file, effective_origin, rotation);
        let count = placed_blocks.len();

        let handle = self
            .adapter
            .get_level(dimension)
            .await?
            .ok_or_else(|| LseError::UnknownDimension(dimension.to_string()))?;
        self.adapter
            .set_blocks_in_region(&handle, placed_blocks, true)
            .await?;

        Ok(ApplyResult {
            blocks_placed: count,
            origin: effective_origin,
        })
    }

    /// Computes the same rotated, translated block list `place` would
    /// write, without ever calling `set_blocks_in_region` — lets a caller
    /// check a placement's footprint before committing it.
    pub async fn place_dry_run(&self, file: &StructureFile, origin: (i32, i32, i32), options: PlaceOptions) -> Result<DryRunResult> {
        let rotation = normalize_rotation(options.rotation)?;
        let (size_x, _, size_z) = file.size;

        let effective_origin = if options.centered {
            (origin.0 - size_x / 2, origin.1, origin.2 - size_z / 2)
        } else {
            origin
        };

        let placed_blocks = place_piece_blocks(file, effective_origin, rotation);
        let bounds = placed_blocks
            .iter()
            .fold(None, |acc: Option<Region>, b| {
                let point = Region::from_corners(b.position(), b.position());
                Some(match acc {
                    Some(r) => Region::from_corners(
                        (r.min().0.min(point.min().0), r.min().1.min(point.min().1), r.min().2.min(point.min().2)),
                        (r.max().0.max(point.max().0), r.max().1.max(point.max().1), r.max().2.max(point.max().2)),
                    ),
                    None => point,
                })
            })
            .unwrap_or_else(|| Region::from_corners(effective_origin, effective_origin));

        Ok(DryRunResult {
            blocks_affected: placed_blocks.len(),
            origin: effective_origin,
            bounds,
        })
    }

    /// A read-only summary of `name`'s contents, without exposing the full
    /// decoded `StructureFile` to the caller.
    pub async fn describe(&self, name: &str) -> Result<StructureDescription> {
        let file = self.read_file(name).await?;
        Ok(StructureDescription {
            palette_size: file.palette.len(),
            block_count: file.blocks.len(),
            entity_count: file.entities.len(),
            size: file.size,
        })
    }

    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let store = Arc::clone(&self.store);
        let prefix = prefix.map(str::to_string);
        tokio::task::spawn_blocking(move || store.list(prefix.as_deref()))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))?
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.read_file(name).await {
            Ok(_) => Ok(true),
            Err(LseError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn remove(&self, name: &str) -> Result<bool> {
        let store = Arc::clone(&self.store);
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.remove(&name))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))?
    }

    pub async fn blocks_list(&self, name: &str) -> Result<BTreeMap<String, u64>> {
        let file = self.read_file(name).await?;
        Ok(BlockReplacer::count_blocks(&file))
    }

    pub async fn blocks_replace(
        &self,
        name: &str,
        map: FxHashMap<String, String>,
    ) -> Result<()> {
        let file = self.read_file(name).await?;
        let replaced = BlockReplacer::replace_blocks(&file, &map);
        let tree = replaced.to_nbt_tree();
        let store = Arc::clone(&self.store);
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.write(&name, &tree, false))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))?
    }

    pub async fn blocks_replace_vanilla(
        &self,
        name: &str,
        wood_type: &str,
    ) -> Result<Vec<String>> {
        let file = self.read_file(name).await?;
        let ids: Vec<String> = file.palette.iter().map(|b| b.name.to_string()).collect();
        let (map, warnings) = BlockReplacer::generate_vanilla_replacement_map(&ids, wood_type);
        let name_only_map: FxHashMap<String, String> = file
            .palette
            .iter()
            .filter_map(|b| map.get(b.name.as_str()).map(|t| (b.name.to_string(), t.clone())))
            .collect();
        self.blocks_replace(name, name_only_map).await?;
        Ok(warnings)
    }

    async fn read_file(&self, name: &str) -> Result<StructureFile> {
        let store = Arc::clone(&self.store);
        let name = name.to_string();
        let tree = tokio::task::spawn_blocking(move || store.read(&name))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))??;
        StructureFile::from_nbt_tree(&tree).map_err(LseError::CorruptArchive)
    }
}

/// Rotates every block in `file` and translates it to world coordinates
/// under `origin`. Shared between single-piece and per-piece large placement.
pub(crate) fn place_piece_blocks(
    file: &StructureFile,
    origin: (i32, i32, i32),
    rotation: i32,
) -> Vec<PositionedBlock> {
    let (size_x, _, size_z) = file.size;
    file.blocks
        .iter()
        .filter_map(|entry| {
            let block = file.palette.get(entry.state)?;
            let (rx, rz) =
                RotationHelper::rotate_position(entry.pos.0, entry.pos.2, rotation, size_x, size_z);
            let rotated_block = RotationHelper::rotate_block_state(block, rotation);
            let mut positioned = PositionedBlock::new(
                origin.0 + rx,
                origin.1 + entry.pos.1,
                origin.2 + rz,
                rotated_block,
            );
            positioned.block_entity = entry.nbt.clone();
            Some(positioned)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockData;
    use crate::structure::BlockEntry;

    #[test]
    fn centered_origin_subtracts_half_extent_per_spec_scenario() {
        let mut file = StructureFile::new((3, 3, 3));
        file.palette.push(BlockData::new("minecraft:diamond_block"));
        file.blocks.push(BlockEntry { pos: (0, 0, 0), state: 0, nbt: None });

        let (size_x, _, size_z) = file.size;
        let origin = (100, 60, 100);
        let effective = (origin.0 - size_x / 2, origin.1, origin.2 - size_z / 2);
        assert_eq!(effective, (99, 60, 99));
    }

    #[test]
    fn place_piece_blocks_rotates_relative_positions() {
        let mut file = StructureFile::new((3, 1, 3));
        file.palette.push(BlockData::new("minecraft:diamond_block"));
        file.blocks.push(BlockEntry { pos: (0, 0, 0), state: 0, nbt: None });

        let placed = place_piece_blocks(&file, (20, 60, 0), 90);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].position(), (22, 60, 0));
    }
}
