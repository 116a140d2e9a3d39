//! Neutral in-memory NBT tree.
//!
//! [`NbtCodec`](crate::codec::NbtCodec) is the only place that knows about
//! the on-disk tagged-binary format; everything else — [`crate::builder`],
//! [`crate::rotation`], [`crate::replacer`] — reads and writes this tree
//! instead, so the pure logic never depends on the wire codec.

use rustc_hash::FxHashMap;
use std::fmt;

/// A compound is unordered (insertion order is not meaningful on disk); a
/// list is ordered. Scalars and the three array tags are stored directly.
#[derive(Clone, Debug, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(Vec<NbtValue>),
    Compound(NbtTree),
}

/// An unordered string-keyed map of [`NbtValue`]s — the neutral stand-in for
/// a compound tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NbtTree(FxHashMap<String, NbtValue>);

impl NbtTree {
    pub fn new() -> Self {
        NbtTree(FxHashMap::default())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: NbtValue) -> Option<NbtValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NbtValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(NbtValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(NbtValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_compound(&self, key: &str) -> Option<&NbtTree> {
        match self.get(key) {
            Some(NbtValue::Compound(c)) => Some(c),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[NbtValue]> {
        match self.get(key) {
            Some(NbtValue::List(l)) => Some(l.as_slice()),
            _ => None,
        }
    }
}

impl FromIterator<(String, NbtValue)> for NbtTree {
    fn from_iter<T: IntoIterator<Item = (String, NbtValue)>>(iter: T) -> Self {
        NbtTree(iter.into_iter().collect())
    }
}

impl fmt::Display for NbtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtValue::String(s) => write!(f, "{s}"),
            NbtValue::Int(i) => write!(f, "{i}"),
            NbtValue::Long(l) => write!(f, "{l}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_round_trips_through_insert_get() {
        let mut tree = NbtTree::new();
        tree.insert("Name", NbtValue::String("minecraft:chest".into()));
        tree.insert("Items", NbtValue::List(vec![NbtValue::Int(1)]));

        assert_eq!(tree.get_string("Name"), Some("minecraft:chest"));
        assert_eq!(tree.get_list("Items").map(|l| l.len()), Some(1));
        assert!(tree.get_compound("Name").is_none());
    }
}
