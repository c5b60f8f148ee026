//! Final transfer into the destination directory.
//! - Target is always `<destination>/<name>`; an existing file there is a collision.
//! - A partially written target is removed if the copy fails midway (see `io_copy`).

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::helpers::io_error_with_help_io;
use super::io_copy;
use crate::errors::WatcherError;

/// Summary of a finished copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub dest: PathBuf,
    pub bytes: u64,
}

/// Copy `src` to `dest_dir/name` byte for byte. Never overwrites.
pub fn copy_into_destination(src: &Path, dest_dir: &Path, name: &str) -> Result<CopyReport, WatcherError> {
    let dest = dest_dir.join(name);
    if dest.exists() {
        return Err(WatcherError::DestinationExists(dest));
    }

    match io_copy::copy_streaming(src, &dest) {
        Ok(bytes) => {
            debug!(src = %src.display(), dest = %dest.display(), bytes, "copy finished");
            Ok(CopyReport { dest, bytes })
        }
        // Lost the race with another writer between the check and the open.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(WatcherError::DestinationExists(dest)),
        Err(e) => {
            let source = io_error_with_help_io("copy", src)(e);
            Err(WatcherError::Copy {
                src: src.to_path_buf(),
                dest,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn copies_bytes_exactly_and_keeps_source() {
        let temp = assert_fs::TempDir::new().unwrap();
        let watch = temp.child("watch");
        let dest = temp.child("dest");
        watch.create_dir_all().unwrap();
        dest.create_dir_all().unwrap();

        let payload: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
        let src = watch.child("report.bin");
        src.write_binary(&payload).unwrap();

        let report = copy_into_destination(src.path(), dest.path(), "report.bin").unwrap();
        assert_eq!(report.dest, dest.path().join("report.bin"));
        assert_eq!(report.bytes, payload.len() as u64);
        assert_eq!(std::fs::read(&report.dest).unwrap(), payload);
        assert!(src.path().exists(), "source must be left in place");
    }

    #[test]
    fn existing_destination_is_a_collision() {
        let temp = assert_fs::TempDir::new().unwrap();
        let src = temp.child("in.txt");
        src.write_str("new").unwrap();
        let dest = temp.child("out");
        dest.create_dir_all().unwrap();
        dest.child("in.txt").write_str("old").unwrap();

        let err = copy_into_destination(src.path(), dest.path(), "in.txt").unwrap_err();
        assert!(matches!(err, WatcherError::DestinationExists(_)), "got {err:?}");
        assert_eq!(err.kind(), "collision");
        dest.child("in.txt").assert("old");
    }

    #[test]
    fn missing_source_reports_copy_error_without_leaving_target() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dest = temp.child("out");
        dest.create_dir_all().unwrap();

        let err = copy_into_destination(&temp.path().join("nope.txt"), dest.path(), "nope.txt").unwrap_err();
        assert!(matches!(err, WatcherError::Copy { .. }), "got {err:?}");
        assert!(!dest.path().join("nope.txt").exists());
    }
}
