//! File-system layer: name resolution, atomic writes with bounded backup
//! rotation, and directory listing. See spec.md §4.6.

use crate::codec::NbtCodec;
use crate::config::EngineConfig;
use crate::error::{LseError, Result};
use crate::tree::NbtTree;
use chrono::Local;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BACKUP_SUFFIX: &str = ".bak";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub struct NbtStore {
    config: EngineConfig,
}

impl NbtStore {
    pub fn new(config: EngineConfig) -> Self {
        NbtStore { config }
    }

    /// Strips an optional `"{namespace}:"` prefix (defaulting to the home
    /// namespace), appends `.nbt` if missing, and rejects `..` segments.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let (namespace, rest) = match name.split_once(':') {
            Some((ns, rest)) => (ns, rest),
            None => (self.config.home_namespace.as_str(), name),
        };

        if rest.split('/').any(|seg| seg == "..") {
            return Err(LseError::PathTraversal(name.to_string()));
        }

        let relative = if rest.ends_with(".nbt") {
            rest.to_string()
        } else {
            format!("{rest}.nbt")
        };

        Ok(self.config.structures_root.join(namespace).join(relative))
    }

    fn backup_path_for(&self, target: &Path) -> Result<PathBuf> {
        let relative = target
            .strip_prefix(&self.config.structures_root)
            .map_err(|_| LseError::PathTraversal(target.display().to_string()))?;
        Ok(self.config.backups_root.join(relative))
    }

    /// Writes `tree` to `name`, first rotating the existing file (if any)
    /// into the backup tree unless `skip_backup` is set. Uses a tempfile in
    /// the target directory plus an atomic rename so a concurrent reader
    /// never observes a partial write.
    pub fn write(&self, name: &str, tree: &NbtTree, skip_backup: bool) -> Result<()> {
        let target = self.resolve(name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = Self::lock_path_for(&target);
        let lock_file = File::create(&lock_path)?;
        lock_file.lock_exclusive()?;

        let result = (|| -> Result<()> {
            if target.exists() && !skip_backup {
                self.rotate_into_backup(&target)?;
            }

            let bytes = NbtCodec::encode(tree)?;
            let parent = target.parent().expect("resolved paths always have a parent");
            let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
            use std::io::Write;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })();

        FileExt::unlock(&lock_file)?;
        result
    }

    fn rotate_into_backup(&self, target: &Path) -> Result<()> {
        let backup_dir = self.backup_path_for(target)?;
        let parent = backup_dir.parent().unwrap_or(&backup_dir).to_path_buf();
        fs::create_dir_all(&parent)?;

        let file_name = target
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LseError::PathTraversal(target.display().to_string()))?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let backup_path = parent.join(format!("{file_name}.{timestamp}{BACKUP_SUFFIX}"));

        fs::rename(target, &backup_path)?;
        self.prune_backups(&parent, file_name, self.config.backup_history_len)?;
        Ok(())
    }

    fn prune_backups(&self, dir: &Path, base_name: &str, keep: usize) -> Result<()> {
        let mut backups = self.list_backups_in(dir, base_name)?;
        if backups.len() <= keep {
            return Ok(());
        }
        backups.sort();
        let excess = backups.len() - keep;
        for old in &backups[..excess] {
            let _ = fs::remove_file(dir.join(old));
        }
        Ok(())
    }

    fn list_backups_in(&self, dir: &Path, base_name: &str) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{base_name}.");
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(file_name) = entry.file_name().to_str() {
                if file_name.starts_with(&prefix) && file_name.ends_with(BACKUP_SUFFIX) {
                    entries.push(file_name.to_string());
                }
            }
        }
        Ok(entries)
    }

    pub fn read(&self, name: &str) -> Result<NbtTree> {
        let target = self.resolve(name)?;
        if !target.exists() {
            return Err(LseError::NotFound(target));
        }
        let bytes = fs::read(&target)?;
        NbtCodec::decode(&bytes)
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        let target = self.resolve(name)?;
        if !target.exists() {
            return Ok(false);
        }
        fs::remove_file(&target)?;
        Ok(true)
    }

    /// Structure names relative to the root, without extension, sorted
    /// lexicographically, excluding backup files.
    pub fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        if !self.config.structures_root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.config.structures_root)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("nbt") {
                continue;
            }
            let relative = path
                .strip_prefix(&self.config.structures_root)
                .unwrap_or(path)
                .with_extension("");
            let name = relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
            if let Some(prefix) = prefix {
                if !name.starts_with(prefix) {
                    continue;
                }
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Backup filenames for `name`, newest first.
    pub fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let target = self.resolve(name)?;
        let backup_dir = self.backup_path_for(&target)?;
        let file_name = target
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LseError::PathTraversal(name.to_string()))?;
        let mut backups = self.list_backups_in(&backup_dir, file_name)?;
        backups.sort();
        backups.reverse();
        Ok(backups)
    }

    /// Restores the newest backup (or the one whose filename contains
    /// `timestamp`) to `target.unwrap_or(name)`, without creating a new backup.
    pub fn restore(&self, name: &str, target: Option<&str>, timestamp: Option<&str>) -> Result<()> {
        let source_path = self.resolve(name)?;
        let backup_dir = self.backup_path_for(&source_path)?;
        let backups = self.list_backups(name)?;

        let chosen = match timestamp {
            Some(ts) => backups
                .into_iter()
                .find(|b| b.contains(ts))
                .ok_or_else(|| LseError::NotFound(backup_dir.join(ts)))?,
            None => backups
                .into_iter()
                .next()
                .ok_or_else(|| LseError::NotFound(backup_dir.clone()))?,
        };

        let bytes = fs::read(backup_dir.join(&chosen))?;
        let tree = NbtCodec::decode(&bytes)?;
        self.write(target.unwrap_or(name), &tree, true)
    }

    fn lock_path_for(target: &Path) -> PathBuf {
        target.with_extension("nbt.lock")
    }
}
