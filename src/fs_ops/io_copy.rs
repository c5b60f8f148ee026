//! Streaming byte copy into a file that must not exist yet.
//!
//! - The destination is opened with `create_new(true)`: an existing file is never
//!   clobbered and the race between "check" and "create" is closed by the OS.
//! - Buffered I/O with 1 MiB buffers; data is fsynced before returning.
//!
//! Snapshot semantics: the source is read once from start to EOF. The engine only
//! copies after the lock probe says nobody holds the file, so it should not grow.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst`, failing with `AlreadyExists` if `dst` is present.
/// Returns the number of bytes written.
///
/// A partially written `dst` is removed on failure, but only once this call has
/// created it; a file that appeared there some other way is never touched.
pub(super) fn copy_streaming(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_f = File::open(src)?;
    let dst_f = OpenOptions::new().write(true).create_new(true).open(dst)?;

    fill(src_f, dst_f).inspect_err(|_| {
        if let Err(rm) = fs::remove_file(dst) {
            warn!(dest = %dst.display(), error = %rm, "failed to remove partial copy");
        }
    })
}

fn fill(src_f: File, dst_f: File) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}
