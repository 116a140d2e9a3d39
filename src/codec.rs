//! On-disk tagged-binary codec.
//!
//! Wraps a gzip-compressed [`quartz_nbt`] compound tree, byte-compatible with
//! the host voxel ecosystem's native structure format, and converts it to
//! and from the neutral [`NbtTree`] that the rest of the engine operates on
//! (see `src/tree.rs`). Grounded in the teacher's `formats/litematic.rs`
//! gzip/quartz_nbt read-write pair.

use crate::error::{LseError, Result};
use crate::tree::{NbtTree, NbtValue};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::io::Read;

/// Default compression level: a balance of speed and size, matching the
/// teacher's litematic writer.
const DEFAULT_COMPRESSION: Compression = Compression::new(6);

pub struct NbtCodec;

impl NbtCodec {
    /// Gzip-compress and serialize `tree` as a named-root compound.
    pub fn encode(tree: &NbtTree) -> Result<Vec<u8>> {
        Self::encode_with_compression(tree, DEFAULT_COMPRESSION)
    }

    pub fn encode_with_compression(tree: &NbtTree, compression: Compression) -> Result<Vec<u8>> {
        let compound = tree_to_compound(tree);
        let mut encoder = GzEncoder::new(Vec::new(), compression);
        quartz_nbt::io::write_nbt(&mut encoder, None, &compound, Flavor::Uncompressed)?;
        Ok(encoder.finish()?)
    }

    /// Decompress and parse a gzip-wrapped tagged-binary stream into a neutral tree.
    pub fn decode(data: &[u8]) -> Result<NbtTree> {
        let reader = std::io::BufReader::new(data);
        let mut gz = GzDecoder::new(reader);
        let mut buf = Vec::new();
        gz.read_to_end(&mut buf)
            .map_err(|e| LseError::CorruptArchive(e.to_string()))?;
        let mut cursor = std::io::Cursor::new(buf);
        let (root, _) = quartz_nbt::io::read_nbt(&mut cursor, Flavor::Uncompressed)
            .map_err(|e| LseError::CorruptArchive(e.to_string()))?;
        Ok(compound_to_tree(&root))
    }
}

fn tree_to_compound(tree: &NbtTree) -> NbtCompound {
    let mut compound = NbtCompound::new();
    for (key, value) in tree.iter() {
        compound.insert(key, value_to_tag(value));
    }
    compound
}

fn value_to_tag(value: &NbtValue) -> NbtTag {
    match value {
        NbtValue::Byte(v) => NbtTag::Byte(*v),
        NbtValue::Short(v) => NbtTag::Short(*v),
        NbtValue::Int(v) => NbtTag::Int(*v),
        NbtValue::Long(v) => NbtTag::Long(*v),
        NbtValue::Float(v) => NbtTag::Float(*v),
        NbtValue::Double(v) => NbtTag::Double(*v),
        NbtValue::String(v) => NbtTag::String(v.clone()),
        NbtValue::ByteArray(v) => NbtTag::ByteArray(v.clone()),
        NbtValue::IntArray(v) => NbtTag::IntArray(v.clone()),
        NbtValue::LongArray(v) => NbtTag::LongArray(v.clone()),
        NbtValue::List(items) => {
            let tags: Vec<NbtTag> = items.iter().map(value_to_tag).collect();
            NbtTag::List(NbtList::from(tags))
        }
        NbtValue::Compound(tree) => NbtTag::Compound(tree_to_compound(tree)),
    }
}

fn compound_to_tree(compound: &NbtCompound) -> NbtTree {
    compound
        .inner()
        .iter()
        .map(|(k, v)| (k.clone(), tag_to_value(v)))
        .collect()
}

fn tag_to_value(tag: &NbtTag) -> NbtValue {
    match tag {
        NbtTag::Byte(v) => NbtValue::Byte(*v),
        NbtTag::Short(v) => NbtValue::Short(*v),
        NbtTag::Int(v) => NbtValue::Int(*v),
        NbtTag::Long(v) => NbtValue::Long(*v),
        NbtTag::Float(v) => NbtValue::Float(*v),
        NbtTag::Double(v) => NbtValue::Double(*v),
        NbtTag::String(v) => NbtValue::String(v.clone()),
        NbtTag::ByteArray(v) => NbtValue::ByteArray(v.clone()),
        NbtTag::IntArray(v) => NbtValue::IntArray(v.clone()),
        NbtTag::LongArray(v) => NbtValue::LongArray(v.clone()),
        NbtTag::List(list) => NbtValue::List(list.iter().map(tag_to_value).collect()),
        NbtTag::Compound(c) => NbtValue::Compound(compound_to_tree(c)),
    }
}
