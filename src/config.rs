//! Engine configuration. No file-backed config loading lives here — that is
//! the embedding host's job (see `spec.md` §1) — just the small bag of
//! constants and root paths the engine is constructed with.

use std::path::PathBuf;

/// Maximum size of any axis in a single-piece capture. Matches the host
/// voxel format's native structure-piece limit.
pub const MAX_SINGLE_PIECE_AXIS: i32 = 48;

/// Default grid piece size on the X/Z axes when splitting a large region.
pub const DEFAULT_PIECE_SIZE: i32 = 48;

/// Number of historical backups retained per structure file.
pub const BACKUP_HISTORY_LEN: usize = 5;

/// Filename suffix appended to a piece under its grid directory.
pub const STRUCTURE_EXTENSION: &str = "nbt";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory under which single-piece and large-structure files live.
    pub structures_root: PathBuf,
    /// Root directory that mirrors `structures_root` for timestamped backups.
    pub backups_root: PathBuf,
    /// Namespace assumed when a name carries no explicit `"{namespace}:"` prefix.
    pub home_namespace: String,
    /// `DataVersion` stamped into every captured piece.
    pub data_version: i32,
    /// Number of backups retained per structure file before the oldest is pruned.
    pub backup_history_len: usize,
}

impl EngineConfig {
    pub fn new(structures_root: impl Into<PathBuf>, home_namespace: impl Into<String>) -> Self {
        let structures_root = structures_root.into();
        let backups_root = structures_root
            .parent()
            .map(|p| p.join("backups").join("structures"))
            .unwrap_or_else(|| PathBuf::from("backups/structures"));
        EngineConfig {
            structures_root,
            backups_root,
            home_namespace: home_namespace.into(),
            data_version: DEFAULT_DATA_VERSION,
            backup_history_len: BACKUP_HISTORY_LEN,
        }
    }
}

/// `DataVersion` for the target voxel-world release this engine round-trips against.
pub const DEFAULT_DATA_VERSION: i32 = 3700;

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::new("structures", "minecraft")
    }
}
