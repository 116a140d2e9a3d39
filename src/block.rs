//! Block state data: a namespaced id plus an ordered set of string
//! properties. Adapted from the teacher's `block_state.rs`, but reads and
//! writes [`NbtTree`]/[`NbtValue`] instead of `quartz_nbt` directly so that
//! the codec stays the only module aware of the wire format.

use crate::tree::{NbtTree, NbtValue};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub name: SmolStr,
    pub properties: Vec<(SmolStr, SmolStr)>,
}

impl fmt::Display for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl Hash for BlockData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for (k, v) in &self.properties {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl BlockData {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockData {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn with_property(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn with_properties(mut self, properties: Vec<(SmolStr, SmolStr)>) -> Self {
        self.properties = properties;
        self
    }

    pub fn set_property(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        let key = key.into();
        let value = value.into();
        for (k, v) in &mut self.properties {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.properties.push((key, value));
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `name`'s namespace is `minecraft:`, or carries no namespace
    /// at all (the vanilla-id replacement heuristics in
    /// [`crate::replacer`] only apply to these).
    pub fn is_vanilla(&self) -> bool {
        match self.name.split_once(':') {
            Some((ns, _)) => ns == "minecraft",
            None => true,
        }
    }

    /// The bare id with any `namespace:` prefix stripped.
    pub fn bare_name(&self) -> &str {
        self.name.split_once(':').map(|(_, id)| id).unwrap_or(&self.name)
    }

    pub fn to_nbt_value(&self) -> NbtValue {
        let mut compound = NbtTree::new();
        compound.insert("Name", NbtValue::String(self.name.to_string()));

        if !self.properties.is_empty() {
            let mut properties = NbtTree::new();
            for (key, value) in &self.properties {
                properties.insert(key.to_string(), NbtValue::String(value.to_string()));
            }
            compound.insert("Properties", NbtValue::Compound(properties));
        }

        NbtValue::Compound(compound)
    }

    pub fn from_nbt_value(value: &NbtValue) -> Result<Self, String> {
        let NbtValue::Compound(compound) = value else {
            return Err("block state entry is not a compound".into());
        };

        let name: SmolStr = compound
            .get_string("Name")
            .ok_or_else(|| "block state entry is missing 'Name'".to_string())?
            .into();

        let mut properties = Vec::new();
        if let Some(NbtValue::Compound(props)) = compound.get("Properties") {
            for (key, value) in props.iter() {
                if let NbtValue::String(value_str) = value {
                    properties.push((key.as_str().into(), value_str.as_str().into()));
                }
            }
        }

        Ok(BlockData { name, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_and_property_lookup() {
        let block = BlockData::new("minecraft:stone").with_property("variant", "granite");

        assert_eq!(block.name, "minecraft:stone");
        assert_eq!(
            block.get_property("variant").map(|s| s.as_str()),
            Some("granite")
        );
    }

    #[test]
    fn display_matches_canonical_block_state_string() {
        let block = BlockData::new("minecraft:oak_stairs")
            .with_property("facing", "north")
            .with_property("half", "bottom");
        assert_eq!(block.to_string(), "minecraft:oak_stairs[facing=north,half=bottom]");
    }

    #[test]
    fn nbt_round_trips() {
        let block = BlockData::new("minecraft:chest").with_property("facing", "east");
        let value = block.to_nbt_value();
        let restored = BlockData::from_nbt_value(&value).unwrap();
        assert_eq!(block, restored);
    }

    #[test]
    fn vanilla_and_modded_ids_are_distinguished() {
        assert!(BlockData::new("minecraft:stone").is_vanilla());
        assert!(BlockData::new("air").is_vanilla());
        assert!(!BlockData::new("create:cogwheel").is_vanilla());
        assert_eq!(BlockData::new("minecraft:oak_log").bare_name(), "oak_log");
    }
}
