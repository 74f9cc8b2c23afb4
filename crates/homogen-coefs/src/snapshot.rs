//! Binary snapshot of a whole [`Coefficients`] value.
//!
//! Layout: an 8-byte magic, a little-endian `u32` format version, then the
//! bincode (standard config) encoding. Unlike the HDF5 store the snapshot
//! also keeps tex names and the float format.

use std::path::Path;

use tracing::debug;

use crate::coefficients::Coefficients;
use crate::error::{CoefsError, Result};

/// File extension of snapshot files.
pub const EXTENSION: &str = "bin";

const MAGIC: &[u8; 8] = b"HOMOGEN\0";
const FORMAT_VERSION: u32 = 1;

/// Encode coefficients into the snapshot format.
pub fn encode(coefs: &Coefficients) -> Result<Vec<u8>> {
    let body = bincode::serde::encode_to_vec(coefs, bincode::config::standard())?;
    let mut bytes = Vec::with_capacity(MAGIC.len() + 4 + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode coefficients; `path` is only used in error messages.
pub fn decode(bytes: &[u8], path: &Path) -> Result<Coefficients> {
    let not_ours = || CoefsError::NotACoefFile {
        path: path.to_path_buf(),
    };
    let rest = bytes.strip_prefix(MAGIC.as_slice()).ok_or_else(not_ours)?;
    let (version, body) = rest.split_first_chunk::<4>().ok_or_else(not_ours)?;
    let found = u32::from_le_bytes(*version);
    if found != FORMAT_VERSION {
        return Err(CoefsError::Version {
            path: path.to_path_buf(),
            found,
            expected: FORMAT_VERSION,
        });
    }
    let (coefs, _) = bincode::serde::decode_from_slice(body, bincode::config::standard())?;
    Ok(coefs)
}

pub fn save_snapshot(path: &Path, coefs: &Coefficients) -> Result<()> {
    let bytes = encode(coefs)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved coefficient snapshot");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Coefficients> {
    let bytes = std::fs::read(path)?;
    decode(&bytes, path)
}
