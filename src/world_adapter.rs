//! The platform-facing seam (spec.md §4.7). The engine depends only on this
//! trait's operations — never on host world types — so the host owns its
//! handles and the engine owns only value-type inputs/outputs.

use crate::error::Result;
use crate::positioned::{PositionedBlock, PositionedEntity};
use crate::region::Region;
use async_trait::async_trait;
use std::fmt::Debug;

/// Opaque handle to a resolved dimension/level. The engine never inspects
/// this beyond passing it back to the adapter that minted it.
pub trait LevelHandle: Debug + Send + Sync {}

/// What `list_resources` is enumerating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    SingleStructure,
    LargeStructureRoot,
}

/// A namespaced resource path, as returned by [`WorldAdapter::list_resources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub namespace: String,
    pub relative_path: String,
}

/// The host-facing seam: reading/writing world state and resolving
/// dimensions and resource listings. All methods dispatch internally to the
/// host's world-mutation thread (spec.md §5) — callers never need to know
/// which thread they're called from.
#[async_trait]
pub trait WorldAdapter: Send + Sync {
    type Handle: LevelHandle;

    async fn get_level(&self, dimension_name: &str) -> Result<Option<Self::Handle>>;

    async fn get_blocks_in_region(
        &self,
        handle: &Self::Handle,
        region: &Region,
    ) -> Result<Vec<PositionedBlock>>;

    async fn get_entities_in_region(
        &self,
        handle: &Self::Handle,
        region: &Region,
    ) -> Result<Vec<PositionedEntity>>;

    async fn set_blocks_in_region(
        &self,
        handle: &Self::Handle,
        blocks: Vec<PositionedBlock>,
        update_neighbors: bool,
    ) -> Result<()>;

    async fn list_resources(
        &self,
        kind: ResourceKind,
        predicate: &str,
    ) -> Result<Vec<ResourceEntry>>;
}
