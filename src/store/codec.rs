// Chunk payload codec.
// Serializes record lists to a count-prefixed JSON form, gzip-compressed to
// keep values inside store size limits (memcached caps values around 1 MB).

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::model::Build;

/// Encode a record list for storage: a 4-byte big-endian record count,
/// followed by the JSON-encoded list, all gzip-compressed.
pub fn encode_chunk(builds: &[Build]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(builds)?;
    let count = builds.len() as u32;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&count.to_be_bytes())?;
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Decode a stored chunk payload.
///
/// The store is trusted not to corrupt values it faithfully returns, so any
/// failure here (bad gzip stream, bad JSON, count mismatch) is an internal
/// invariant violation surfaced as [`Error::CorruptChunk`].
pub fn decode_chunk(bytes: &[u8]) -> Result<Vec<Build>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| corrupt(format!("gzip: {e}")))?;

    if raw.len() < 4 {
        return Err(corrupt(format!("envelope too short: {} bytes", raw.len())));
    }
    let (prefix, json) = raw.split_at(4);
    let count = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);

    let builds: Vec<Build> =
        serde_json::from_slice(json).map_err(|e| corrupt(format!("json: {e}")))?;

    if builds.len() as u32 != count {
        return Err(corrupt(format!(
            "record count mismatch: prefix says {count}, payload has {}",
            builds.len()
        )));
    }
    Ok(builds)
}

fn corrupt(reason: String) -> Error {
    Error::CorruptChunk { reason }
}
