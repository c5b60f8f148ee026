//! Exclusive-access probe.
//! Decides whether another process currently holds a file.
//!
//! Design:
//! - Unix: open the file read+write, then try a non-blocking exclusive flock (fs2).
//!   Contention shows up as WouldBlock. flock is advisory, so only writers that
//!   lock the file (or hold a conflicting flock) are detected.
//! - Windows: open read+write with share mode 0; a sharing or lock violation means
//!   another handle is open.
//!
//! Notes:
//! - The probe handle is released before returning, whatever the result.
//! - NotFound and PermissionDenied are terminal: retrying will not make them pass.
//!   Every other I/O error is treated as transient contention.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::trace;

#[cfg(unix)]
use fs2::FileExt;

/// Result of a single lock probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// Nobody else holds the file; safe to copy.
    Unlocked,
    /// Another process holds the file; try again later.
    Locked,
    /// The file cannot be probed and retrying will not help.
    Failed(io::ErrorKind),
}

/// Seam between the engine and the filesystem probe.
pub trait LockProbe: Send + 'static {
    fn probe(&self, path: &Path) -> LockStatus;
}

/// Production probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLockProbe;

impl LockProbe for FsLockProbe {
    fn probe(&self, path: &Path) -> LockStatus {
        probe_lock(path)
    }
}

/// Probe `path` for exclusive access.
pub fn probe_lock(path: &Path) -> LockStatus {
    let status = match open_exclusive(path) {
        Ok(file) => {
            release(file);
            LockStatus::Unlocked
        }
        Err(e) => classify(&e),
    };
    trace!(path = %path.display(), ?status, "lock probe");
    status
}

#[cfg(unix)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    let f = OpenOptions::new().read(true).write(true).open(path)?;
    f.try_lock_exclusive()?;
    Ok(f)
}

#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    OpenOptions::new()
        .read(true)
        .write(true)
        .share_mode(0) // no sharing => exclusive
        .open(path)
}

#[cfg(unix)]
fn release(file: File) {
    // Closing the fd drops the flock too; unlock first so the intent is explicit.
    let _ = FileExt::unlock(&file);
}

#[cfg(windows)]
fn release(file: File) {
    drop(file);
}

fn classify(e: &io::Error) -> LockStatus {
    if is_contention(e) {
        return LockStatus::Locked;
    }
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => LockStatus::Failed(e.kind()),
        _ => LockStatus::Locked,
    }
}

#[cfg(unix)]
fn is_contention(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    matches!(e.raw_os_error(), Some(code) if code == libc::EWOULDBLOCK || code == libc::EAGAIN || code == libc::EBUSY)
}

#[cfg(windows)]
fn is_contention(e: &io::Error) -> bool {
    use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, ERROR_SHARING_VIOLATION};
    matches!(
        e.raw_os_error(),
        Some(code) if code == ERROR_SHARING_VIOLATION as i32 || code == ERROR_LOCK_VIOLATION as i32
    )
}
