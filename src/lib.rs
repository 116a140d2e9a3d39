//! Large Structure Engine: capture, grid-partition, rotate, and re-place
//! large voxel-world structures from palette-compressed tagged-binary
//! archives, independent of any specific host world implementation.
//!
//! The core is split leaf-first: [`tree`] and [`codec`] handle the on-disk
//! format; [`block`], [`region`], [`positioned`], and [`structure`] are pure
//! value types; [`builder`], [`rotation`], and [`replacer`] are pure
//! algorithms over those types; [`store`] is the file-system layer; and
//! [`world_adapter`] is the seam the host implements. [`structure_api`] and
//! [`large_structure_api`] compose all of the above into the engine's public
//! surface.

pub mod block;
pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod large_structure_api;
pub mod positioned;
pub mod region;
pub mod replacer;
pub mod rotation;
pub mod store;
pub mod structure;
pub mod structure_api;
pub mod tree;
pub mod world_adapter;

pub use block::BlockData;
pub use config::EngineConfig;
pub use error::{LseError, Result};
pub use large_structure_api::LargeStructureApi;
pub use positioned::{PositionedBlock, PositionedEntity};
pub use region::Region;
pub use structure::{GridCoordinate, StructureFile};
pub use structure_api::StructureApi;
pub use world_adapter::WorldAdapter;
