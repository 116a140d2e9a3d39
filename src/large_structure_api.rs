//! Multi-piece capture/place/list/replace over a grid directory. See
//! spec.md §4.9. Piece order is always `gx` outer, `gy` middle, `gz` inner
//! (spec.md §5's ordering guarantee).

use crate::builder::StructureBuilder;
use crate::config::EngineConfig;
use crate::error::{LseError, Result};
use crate::positioned::PositionedBlock;
use crate::region::Region;
use crate::replacer::BlockReplacer;
use crate::rotation::{normalize_rotation, RotationHelper};
use crate::store::NbtStore;
use crate::structure::{GridCoordinate, LargeMetadata, StructureFile};
use crate::structure_api::place_piece_blocks;
use crate::world_adapter::WorldAdapter;
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CaptureLargeOptions {
    pub piece_size_x: Option<i32>,
    pub piece_size_z: Option<i32>,
    pub piece_size_y: Option<i32>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureLargeSummary {
    pub name: String,
    pub namespace: String,
    pub pieces: usize,
    pub requires: Vec<String>,
    pub path: PathBuf,
}

/// Overwrite everything (`Replace`, the default); skip writing air source
/// blocks (`KeepAir`); or skip writing over non-air targets (`Overlay`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    #[default]
    Replace,
    KeepAir,
    Overlay,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceLargeOptions {
    pub rotation: i32,
    pub centered: bool,
    pub mode: ReplaceMode,
}

#[derive(Debug, Clone)]
pub struct PlaceLargeResult {
    pub pieces_placed: usize,
    pub blocks_placed: usize,
    pub metadata: LargeMetadata,
    pub rotation: i32,
    pub position: (i32, i32, i32),
}

#[derive(Debug, Clone)]
pub struct VanillaReplaceLargeResult {
    pub pieces_modified: usize,
    pub warnings: Vec<String>,
}

/// A read-only summary of a large structure's contents, aggregated across
/// every readable piece.
#[derive(Debug, Clone)]
pub struct LargeStructureDescription {
    pub pieces: usize,
    pub block_count: usize,
    pub entity_count: usize,
    pub total_size: (i32, i32, i32),
    pub requires: Vec<String>,
}

pub struct LargeStructureApi<W: WorldAdapter> {
    store: Arc<NbtStore>,
    adapter: Arc<W>,
    config: EngineConfig,
    directory_locks: AsyncMutex<FxHashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl<W: WorldAdapter> LargeStructureApi<W> {
    pub fn new(store: Arc<NbtStore>, adapter: Arc<W>, config: EngineConfig) -> Self {
        LargeStructureApi {
            store,
            adapter,
            config,
            directory_locks: AsyncMutex::new(FxHashMap::default()),
        }
    }

    fn piece_name(&self, namespace: &str, structure_name: &str, coord: GridCoordinate) -> String {
        format!(
            "{namespace}:rjs-large/{structure_name}/{}",
            coord.filename().trim_end_matches(".nbt")
        )
    }

    async fn lock_for(&self, directory_key: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self.directory_locks.lock().await;
        locks
            .entry(directory_key.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Partitions `region` into a grid, captures every piece in
    /// `(gx, gy, gz)` order, and writes `0.0.0` with the embedded `large`
    /// metadata. On cancellation or a mid-capture failure the partial
    /// directory is left on disk — callers retry via `remove_large`.
    pub async fn capture_large(
        &self,
        region: Region,
        dimension: &str,
        name: &str,
        options: CaptureLargeOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<CaptureLargeSummary> {
        let namespace = options.namespace.unwrap_or_else(|| self.config.home_namespace.clone());
        let piece_x = options.piece_size_x.unwrap_or(crate::config::DEFAULT_PIECE_SIZE);
        let piece_z = options.piece_size_z.unwrap_or(crate::config::DEFAULT_PIECE_SIZE);

        let directory_key = PathBuf::from(format!("{namespace}/rjs-large/{name}"));
        let guard_lock = self.lock_for(&directory_key).await;
        let _guard = guard_lock.lock().await;

        let mut pieces = StructureBuilder::split_into_grid(&region, piece_x, piece_z, options.piece_size_y);
        pieces.sort_by_key(|(c, _)| (c.gx, c.gy, c.gz));

        let handle = self
            .adapter
            .get_level(dimension)
            .await?
            .ok_or_else(|| LseError::UnknownDimension(dimension.to_string()))?;

        let mut required_mods: Vec<String> = Vec::new();
        let mut piece_files: Vec<(GridCoordinate, StructureFile)> = Vec::with_capacity(pieces.len());

        for (coord, piece_region) in &pieces {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(LseError::Cancelled);
                }
            }

            let blocks = self.adapter.get_blocks_in_region(&handle, piece_region).await?;
            let entities = self.adapter.get_entities_in_region(&handle, piece_region).await?;

            for block in &blocks {
                if !block.block.is_vanilla() {
                    if let Some((ns, _)) = block.block.name.split_once(':') {
                        if !required_mods.contains(&ns.to_string()) {
                            required_mods.push(ns.to_string());
                        }
                    }
                }
            }

            let file = StructureBuilder::build_structure_data(
                piece_region,
                &blocks,
                &entities,
                self.config.data_version,
            );
            piece_files.push((*coord, file));
        }

        required_mods.sort();

        let metadata = StructureBuilder::create_large_structure_metadata(
            &region,
            piece_x,
            piece_z,
            options.piece_size_y,
            required_mods.clone(),
        );

        for (coord, file) in &mut piece_files {
            if coord.is_origin() {
                file.large = Some(metadata.clone());
            }
            let piece_name = self.piece_name(&namespace, name, *coord);
            let tree = file.to_nbt_tree();
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || store.write(&piece_name, &tree, true))
                .await
                .map_err(|e| LseError::AdapterFailure(e.to_string()))??;
        }

        Ok(CaptureLargeSummary {
            name: name.to_string(),
            namespace: namespace.clone(),
            pieces: piece_files.len(),
            requires: required_mods,
            path: PathBuf::from(format!("structures/{namespace}/rjs-large/{name}")),
        })
    }

    /// Reads `0.0.0`'s `large` metadata, builds a piece-origin calculator,
    /// and applies every piece's blocks with `update_neighbors=false` to
    /// suppress cascading physics mid-placement.
    pub async fn place_large(
        &self,
        origin: (i32, i32, i32),
        namespace: &str,
        name: &str,
        dimension: &str,
        options: PlaceLargeOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<PlaceLargeResult> {
        let rotation = normalize_rotation(options.rotation)?;
        let root_file = self.read_piece(namespace, name, GridCoordinate::new(0, 0, 0)).await?;
        let metadata = root_file
            .large
            .clone()
            .ok_or_else(|| LseError::MissingMetadata(name.to_string()))?;

        let effective_origin = if options.centered {
            let (total_x, _, total_z) = metadata.total_size;
            let (hx, hz) = RotationHelper::rotate_vector(total_x / 2, total_z / 2, rotation);
            (origin.0 - hx, origin.1, origin.2 - hz)
        } else {
            origin
        };

        let piece_size = (
            metadata.piece_size.x,
            metadata.piece_size.z,
            metadata.piece_size.y,
        );
        let origin_fn = RotationHelper::piece_origin_calculator(effective_origin, rotation, piece_size);

        let handle = self
            .adapter
            .get_level(dimension)
            .await?
            .ok_or_else(|| LseError::UnknownDimension(dimension.to_string()))?;

        let grid_x = metadata.grid_size.x;
        let grid_z = metadata.grid_size.z;
        let grid_y = metadata.grid_size.y.unwrap_or(1);

        let mut pieces_placed = 0usize;
        let mut blocks_placed = 0usize;

        for gx in 0..grid_x {
            for gy in 0..grid_y {
                for gz in 0..grid_z {
                    if let Some(token) = cancel {
                        if token.is_cancelled() {
                            return Err(LseError::Cancelled);
                        }
                    }

                    let coord = GridCoordinate::new(gx, gy, gz);
                    let file = match self.read_piece(namespace, name, coord).await {
                        Ok(f) => f,
                        Err(e) => {
                            warn!("place_large: skipping unreadable piece {coord:?}: {e}");
                            continue;
                        }
                    };

                    let piece_origin = origin_fn(coord);
                    let mut blocks = place_piece_blocks(&file, piece_origin, rotation);
                    apply_local_replace_filters(&mut blocks, options.mode);
                    if options.mode == ReplaceMode::Overlay {
                        self.drop_occupied_targets(&handle, &mut blocks).await?;
                    }

                    blocks_placed += blocks.len();
                    self.adapter.set_blocks_in_region(&handle, blocks, false).await?;
                    pieces_placed += 1;
                }
            }
        }

        Ok(PlaceLargeResult {
            pieces_placed,
            blocks_placed,
            metadata,
            rotation,
            position: effective_origin,
        })
    }

    /// Computes piece origins and block counts the way `place_large` would,
    /// reading every piece (and, under `Overlay`, the destination region
    /// too) but never calling `set_blocks_in_region`.
    pub async fn place_large_dry_run(
        &self,
        origin: (i32, i32, i32),
        namespace: &str,
        name: &str,
        dimension: &str,
        options: PlaceLargeOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<PlaceLargeResult> {
        let rotation = normalize_rotation(options.rotation)?;
        let root_file = self.read_piece(namespace, name, GridCoordinate::new(0, 0, 0)).await?;
        let metadata = root_file
            .large
            .clone()
            .ok_or_else(|| LseError::MissingMetadata(name.to_string()))?;

        let effective_origin = if options.centered {
            let (total_x, _, total_z) = metadata.total_size;
            let (hx, hz) = RotationHelper::rotate_vector(total_x / 2, total_z / 2, rotation);
            (origin.0 - hx, origin.1, origin.2 - hz)
        } else {
            origin
        };

        let piece_size = (
            metadata.piece_size.x,
            metadata.piece_size.z,
            metadata.piece_size.y,
        );
        let origin_fn = RotationHelper::piece_origin_calculator(effective_origin, rotation, piece_size);

        let handle = self
            .adapter
            .get_level(dimension)
            .await?
            .ok_or_else(|| LseError::UnknownDimension(dimension.to_string()))?;

        let mut pieces_placed = 0usize;
        let mut blocks_placed = 0usize;

        for coord in grid_coordinates(&metadata) {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(LseError::Cancelled);
                }
            }

            let file = match self.read_piece(namespace, name, coord).await {
                Ok(f) => f,
                Err(e) => {
                    warn!("place_large_dry_run: skipping unreadable piece {coord:?}: {e}");
                    continue;
                }
            };

            let piece_origin = origin_fn(coord);
            let mut blocks = place_piece_blocks(&file, piece_origin, rotation);
            apply_local_replace_filters(&mut blocks, options.mode);
            if options.mode == ReplaceMode::Overlay {
                self.drop_occupied_targets(&handle, &mut blocks).await?;
            }

            blocks_placed += blocks.len();
            pieces_placed += 1;
        }

        Ok(PlaceLargeResult {
            pieces_placed,
            blocks_placed,
            metadata,
            rotation,
            position: effective_origin,
        })
    }

    /// A read-only summary of a large structure's contents, without placing
    /// anything. Aggregates per-piece block and entity counts.
    pub async fn describe_large(&self, namespace: &str, name: &str) -> Result<LargeStructureDescription> {
        let metadata = self.get_large_metadata(namespace, name).await?;
        let mut block_count = 0usize;
        let mut entity_count = 0usize;
        for coord in grid_coordinates(&metadata) {
            match self.read_piece(namespace, name, coord).await {
                Ok(file) => {
                    block_count += file.blocks.len();
                    entity_count += file.entities.len();
                }
                Err(e) => warn!("describe_large: skipping unreadable piece {coord:?}: {e}"),
            }
        }
        Ok(LargeStructureDescription {
            pieces: metadata.piece_count() as usize,
            block_count,
            entity_count,
            total_size: metadata.total_size,
            requires: metadata.requires.clone(),
        })
    }

    pub async fn get_large_metadata(&self, namespace: &str, name: &str) -> Result<LargeMetadata> {
        let root = self.read_piece(namespace, name, GridCoordinate::new(0, 0, 0)).await?;
        root.large.ok_or_else(|| LseError::MissingMetadata(name.to_string()))
    }

    pub async fn blocks_list_large(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, u64>> {
        let metadata = self.get_large_metadata(namespace, name).await?;
        let mut merged = BTreeMap::new();
        for coord in grid_coordinates(&metadata) {
            match self.read_piece(namespace, name, coord).await {
                Ok(file) => {
                    for (id, count) in BlockReplacer::count_blocks(&file) {
                        *merged.entry(id).or_insert(0) += count;
                    }
                }
                Err(e) => warn!("blocks_list_large: skipping unreadable piece {coord:?}: {e}"),
            }
        }
        Ok(merged)
    }

    pub async fn blocks_replace_large(
        &self,
        namespace: &str,
        name: &str,
        map: FxHashMap<String, String>,
    ) -> Result<usize> {
        let metadata = self.get_large_metadata(namespace, name).await?;
        let mut modified = 0usize;
        for coord in grid_coordinates(&metadata) {
            let file = match self.read_piece(namespace, name, coord).await {
                Ok(f) => f,
                Err(e) => {
                    warn!("blocks_replace_large: skipping unreadable piece {coord:?}: {e}");
                    continue;
                }
            };
            let replaced = BlockReplacer::replace_blocks(&file, &map);
            let piece_name = self.piece_name(namespace, name, coord);
            let tree = replaced.to_nbt_tree();
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || store.write(&piece_name, &tree, false))
                .await
                .map_err(|e| LseError::AdapterFailure(e.to_string()))??;
            modified += 1;
        }
        Ok(modified)
    }

    pub async fn blocks_replace_large_vanilla(
        &self,
        namespace: &str,
        name: &str,
        wood_type: &str,
    ) -> Result<VanillaReplaceLargeResult> {
        let merged = self.blocks_list_large(namespace, name).await?;
        let ids: Vec<String> = merged.keys().cloned().collect();
        let (map, warnings) = BlockReplacer::generate_vanilla_replacement_map(&ids, wood_type);
        let pieces_modified = self.blocks_replace_large(namespace, name, map).await?;
        Ok(VanillaReplaceLargeResult { pieces_modified, warnings })
    }

    /// Scans the resource listing for `*/rjs-large/*/0.0.0.nbt` roots.
    pub async fn list_large(&self, namespace: Option<&str>) -> Result<Vec<(String, String)>> {
        use crate::world_adapter::ResourceKind;
        let entries = self
            .adapter
            .list_resources(ResourceKind::LargeStructureRoot, "rjs-large/*/0.0.0.nbt")
            .await?;
        Ok(entries
            .into_iter()
            .filter(|e| namespace.map(|ns| ns == e.namespace).unwrap_or(true))
            .filter_map(|e| {
                e.relative_path
                    .strip_prefix("rjs-large/")
                    .and_then(|rest| rest.strip_suffix("/0.0.0.nbt"))
                    .map(|name| (e.namespace.clone(), name.to_string()))
            })
            .collect())
    }

    pub async fn remove_large(&self, namespace: &str, name: &str) -> Result<bool> {
        let directory_key = PathBuf::from(format!("{namespace}/rjs-large/{name}"));
        let guard_lock = self.lock_for(&directory_key).await;
        let _guard = guard_lock.lock().await;

        let metadata = match self.get_large_metadata(namespace, name).await {
            Ok(m) => m,
            Err(LseError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let mut removed_any = false;
        for coord in grid_coordinates(&metadata) {
            let piece_name = self.piece_name(namespace, name, coord);
            let store = Arc::clone(&self.store);
            let removed = tokio::task::spawn_blocking(move || store.remove(&piece_name))
                .await
                .map_err(|e| LseError::AdapterFailure(e.to_string()))??;
            removed_any |= removed;
        }
        Ok(removed_any)
    }

    /// `Overlay` mode: reads back the blocks' bounding region and drops any
    /// position whose current world block isn't air, so placement never
    /// overwrites an already-occupied target.
    async fn drop_occupied_targets(&self, handle: &W::Handle, blocks: &mut Vec<PositionedBlock>) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        let region = bounding_region(blocks);
        let existing = self.adapter.get_blocks_in_region(handle, &region).await?;
        let occupied: FxHashSet<(i32, i32, i32)> = existing
            .into_iter()
            .filter(|b| b.block.name != "minecraft:air")
            .map(|b| (b.x, b.y, b.z))
            .collect();
        blocks.retain(|b| !occupied.contains(&(b.x, b.y, b.z)));
        Ok(())
    }

    async fn read_piece(&self, namespace: &str, name: &str, coord: GridCoordinate) -> Result<StructureFile> {
        let piece_name = self.piece_name(namespace, name, coord);
        let store = Arc::clone(&self.store);
        let tree = tokio::task::spawn_blocking(move || store.read(&piece_name))
            .await
            .map_err(|e| LseError::AdapterFailure(e.to_string()))??;
        StructureFile::from_nbt_tree(&tree).map_err(LseError::CorruptArchive)
    }
}

fn grid_coordinates(metadata: &LargeMetadata) -> Vec<GridCoordinate> {
    let grid_y = metadata.grid_size.y.unwrap_or(1);
    let mut out = Vec::with_capacity((metadata.grid_size.x * grid_y * metadata.grid_size.z) as usize);
    for gx in 0..metadata.grid_size.x {
        for gy in 0..grid_y {
            for gz in 0..metadata.grid_size.z {
                out.push(GridCoordinate::new(gx, gy, gz));
            }
        }
    }
    out
}

/// Filters that don't need to read the world: `KeepAir` drops air sources
/// before they're ever sent to the adapter. `Overlay` needs a destination
/// read and is handled separately by `LargeStructureApi::drop_occupied_targets`.
fn apply_local_replace_filters(blocks: &mut Vec<PositionedBlock>, mode: ReplaceMode) {
    if mode == ReplaceMode::KeepAir {
        blocks.retain(|b| b.block.name != "minecraft:air");
    }
}

/// The tightest region spanning every block's position.
fn bounding_region(blocks: &[PositionedBlock]) -> Region {
    let mut min = (i32::MAX, i32::MAX, i32::MAX);
    let mut max = (i32::MIN, i32::MIN, i32::MIN);
    for b in blocks {
        min = (min.0.min(b.x), min.1.min(b.y), min.2.min(b.z));
        max = (max.0.max(b.x), max.1.max(b.y), max.2.max(b.z));
    }
    Region::from_corners(min, max)
}
