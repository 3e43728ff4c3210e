//! Content hashing for copy verification

use crate::io::error::ReconcileError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the BLAKE3 digest of a file as lowercase hex
///
/// Streams the file so large workbooks are never fully buffered.
pub fn hash_file(path: &Path) -> Result<String, ReconcileError> {
    let mut file = File::open(path).map_err(|e| ReconcileError::from_io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| ReconcileError::from_io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Copy `from` onto `to` and confirm both files carry the same bytes
///
/// Any existing file at `to` is replaced. The destination gets a fresh
/// modification time.
pub fn verified_copy(from: &Path, to: &Path) -> Result<u64, ReconcileError> {
    let bytes = std::fs::copy(from, to).map_err(|e| ReconcileError::from_io(to, e))?;
    if hash_file(from)? != hash_file(to)? {
        return Err(ReconcileError::CopyMismatch {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }
    Ok(bytes)
}
