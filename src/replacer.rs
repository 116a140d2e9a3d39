//! Pure transforms over a `StructureFile`'s palette: counting, wholesale
//! replacement, and the vanilla-fallback heuristic. See spec.md §4.4.

use crate::structure::StructureFile;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

pub struct BlockReplacer;

impl BlockReplacer {
    /// Aggregates counts per palette `name`, sorted alphabetically.
    pub fn count_blocks(structure: &StructureFile) -> BTreeMap<String, u64> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for entry in &structure.blocks {
            if let Some(block) = structure.palette.get(entry.state) {
                *counts.entry(block.name.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Substitutes palette entry names per `map`, preserving each entry's
    /// properties and leaving unmapped entries untouched.
    pub fn replace_blocks(
        structure: &StructureFile,
        map: &FxHashMap<String, String>,
    ) -> StructureFile {
        let mut out = structure.clone();
        for block in &mut out.palette {
            if let Some(new_name) = map.get(block.name.as_str()) {
                block.name = new_name.as_str().into();
            }
        }
        out
    }

    /// Classifies every non-vanilla id in `ids` by suffix/substring
    /// heuristics and proposes a vanilla target for it; ids that don't match
    /// any rule are omitted from the map and reported as warnings.
    pub fn generate_vanilla_replacement_map(
        ids: &[String],
        wood_type: &str,
    ) -> (FxHashMap<String, String>, Vec<String>) {
        let mut map = FxHashMap::default();
        let mut warnings = Vec::new();

        for id in ids {
            if is_vanilla_id(id) {
                continue;
            }
            match classify_vanilla_target(id, wood_type) {
                Some(target) => {
                    map.insert(id.clone(), target);
                }
                None => warnings.push(format!("could not classify '{id}' as a vanilla fallback")),
            }
        }

        (map, warnings)
    }

    /// Mutates only targets already ending in `_planks`/`_log`/`_stairs`/
    /// `_slab` to use `wood_type` instead of whatever variant they were
    /// generated with.
    pub fn apply_wood_type_override(map: &mut FxHashMap<String, String>, wood_type: &str) {
        for target in map.values_mut() {
            let Some(bare) = target.strip_prefix("minecraft:") else {
                continue;
            };
            for suffix in ["_planks", "_log", "_stairs", "_slab"] {
                if bare.ends_with(suffix) {
                    *target = format!("minecraft:{wood_type}{suffix}");
                    break;
                }
            }
        }
    }
}

fn is_vanilla_id(id: &str) -> bool {
    match id.split_once(':') {
        Some((ns, _)) => ns == "minecraft",
        None => true,
    }
}

fn bare_name(id: &str) -> &str {
    id.split_once(':').map(|(_, b)| b).unwrap_or(id)
}

fn classify_vanilla_target(id: &str, wood_type: &str) -> Option<String> {
    let bare = bare_name(id);

    if bare.ends_with("_planks") {
        return Some(format!("minecraft:{wood_type}_planks"));
    }
    if bare.ends_with("_log") || bare.ends_with("_wood") {
        return Some(format!("minecraft:{wood_type}_log"));
    }
    if bare.ends_with("_stairs") {
        return Some(format!("minecraft:{wood_type}_stairs"));
    }
    if bare.ends_with("_slab") {
        return Some(format!("minecraft:{wood_type}_slab"));
    }
    if bare.ends_with("_leaves") {
        return Some(format!("minecraft:{wood_type}_leaves"));
    }
    if bare.ends_with("_mud") {
        return Some("minecraft:packed_mud".to_string());
    }
    if bare.contains("rock") || bare.ends_with("_stone") || bare.contains("_stone_") {
        return Some("minecraft:stone".to_string());
    }
    if bare.contains("dirt") {
        return Some("minecraft:dirt".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockData;
    use crate::structure::{BlockEntry, StructureFile};

    fn structure_with_palette(names: &[&str]) -> StructureFile {
        let mut file = StructureFile::new((1, 1, names.len() as i32));
        for (i, name) in names.iter().enumerate() {
            file.palette.push(BlockData::new(*name));
            file.blocks.push(BlockEntry {
                pos: (0, 0, i as i32),
                state: i,
                nbt: None,
            });
        }
        file
    }

    #[test]
    fn count_blocks_is_sorted_and_aggregated() {
        let mut file = structure_with_palette(&["minecraft:dirt", "minecraft:stone"]);
        file.blocks.push(BlockEntry {
            pos: (0, 0, 2),
            state: 0,
            nbt: None,
        });
        let counts = BlockReplacer::count_blocks(&file);
        let keys: Vec<_> = counts.keys().cloned().collect();
        assert_eq!(keys, vec!["minecraft:dirt", "minecraft:stone"]);
        assert_eq!(counts["minecraft:dirt"], 2);
    }

    #[test]
    fn replace_blocks_preserves_count_and_properties() {
        let mut file = structure_with_palette(&["old:block"]);
        file.palette[0].set_property("facing", "north");
        let mut map = FxHashMap::default();
        map.insert("old:block".to_string(), "minecraft:new_block".to_string());

        let before = BlockReplacer::count_blocks(&file).len();
        let replaced = BlockReplacer::replace_blocks(&file, &map);
        let after = BlockReplacer::count_blocks(&replaced).len();

        assert_eq!(before, after);
        assert_eq!(replaced.palette[0].name.as_str(), "minecraft:new_block");
        assert_eq!(
            replaced.palette[0].get_property("facing").map(|s| s.as_str()),
            Some("north")
        );
    }

    #[test]
    fn scenario_vanilla_replace_matches_spec() {
        let ids = vec![
            "minecraft:stone".to_string(),
            "terralith:volcanic_rock".to_string(),
            "terralith:packed_mud".to_string(),
            "customwood:oak_planks".to_string(),
        ];
        let (map, warnings) = BlockReplacer::generate_vanilla_replacement_map(&ids, "oak");
        assert!(warnings.is_empty());
        assert_eq!(map.get("terralith:volcanic_rock").unwrap(), "minecraft:stone");
        assert_eq!(map.get("terralith:packed_mud").unwrap(), "minecraft:packed_mud");
        assert_eq!(map.get("customwood:oak_planks").unwrap(), "minecraft:oak_planks");
        assert!(!map.contains_key("minecraft:stone"));
    }

    #[test]
    fn wood_type_override_only_touches_wood_targets() {
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), "minecraft:oak_planks".to_string());
        map.insert("b".to_string(), "minecraft:stone".to_string());
        BlockReplacer::apply_wood_type_override(&mut map, "spruce");
        assert_eq!(map["a"], "minecraft:spruce_planks");
        assert_eq!(map["b"], "minecraft:stone");
    }
}
