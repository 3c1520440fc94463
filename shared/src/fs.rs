//! Filesystem helpers shared across Mii tools.

use std::io;
use std::path::Path;

/// Maximum allowed database size for reading into memory.
pub const MAX_DATABASE_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB
/// Maximum allowed standalone record size for reading into memory.
pub const MAX_RECORD_FILE_BYTES: u64 = 64 * 1024; // 64 KiB

/// Read a file into memory with a size cap.
///
/// Oversized files fail with `io::ErrorKind::InvalidData` before any bytes are read.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> io::Result<Vec<u8>> {
    let len = std::fs::metadata(path)?.len();
    if len > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "file too large: {} ({} bytes, max {} bytes)",
                path.display(),
                len,
                max_bytes
            ),
        ));
    }
    std::fs::read(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_small_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [1u8, 2, 3]).unwrap();
        assert_eq!(read_file_with_limit(file.path(), 16).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn rejects_oversized_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0u8; 32]).unwrap();
        let err = read_file_with_limit(file.path(), 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("file too large"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file_with_limit(&dir.path().join("absent.dat"), 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
