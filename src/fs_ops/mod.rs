//! Filesystem operations: lock probing and the final copy.

mod copy;
mod helpers;
mod io_copy;
mod lock;

pub use copy::{copy_into_destination, CopyReport};
pub use helpers::io_error_with_help_io;
pub use lock::{probe_lock, FsLockProbe, LockProbe, LockStatus};
