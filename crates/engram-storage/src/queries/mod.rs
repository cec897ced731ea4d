//! Query modules, one per concern, all operating on a borrowed
//! `rusqlite::Connection` so callers control transaction scope.

pub mod maintenance;
pub mod memory_crud;
pub mod memory_search;
pub mod snapshot_ops;
pub mod tag_ops;

/// Convert an f32 slice to little-endian bytes, matching the on-disk
/// vector format.
pub(crate) fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert little-endian bytes back to an f32 vec.
pub(crate) fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(bytes_to_f32_vec(&f32_vec_to_bytes(&v)), v);
    }

    #[test]
    fn blob_is_little_endian() {
        let bytes = f32_vec_to_bytes(&[1.0]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }
}
