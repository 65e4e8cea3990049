//! Gzip-wrapped NBT documents, the on-disk form of saved structures.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::NbtError;
use crate::tag::NbtRoot;

/// Encode `root` and gzip the result.
pub fn compress(root: &NbtRoot) -> Result<Vec<u8>, NbtError> {
    let raw = crate::to_bytes(root)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

/// Inflate a gzip stream and decode the NBT document inside it.
pub fn decompress(data: &[u8]) -> Result<NbtRoot, NbtError> {
    let mut decoder = GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    crate::from_bytes(&raw)
}
