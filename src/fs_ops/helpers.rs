//! I/O error enrichment.
//!
//! Adds actionable hints to io::Error messages while preserving the ErrorKind,
//! so log lines say what to fix instead of just an errno.
//!
//! Usage:
//!   File::open(p).map_err(io_error_with_help_io("open file", p))?;

use std::io;
use std::path::Path;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        let hint = match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::ENOENT => Some("path not found; the file may have been removed after it was detected"),
            libc::EEXIST => Some("already exists; the destination will not be overwritten"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem; cannot write here"),
            libc::EBUSY => Some("resource busy; another process is still using the file"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    #[cfg(windows)]
    if let Some(code) = e.raw_os_error() {
        let hint = match code {
            5 => Some("access denied; check permissions"),
            32 | 33 => Some("sharing violation; file is in use"),
            2 | 3 => Some("path not found; the file may have been removed after it was detected"),
            80 => Some("already exists; the destination will not be overwritten"),
            112 => Some("insufficient disk space"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found"),
        io::ErrorKind::AlreadyExists => Some("already exists; the destination will not be overwritten"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str("; ");
        msg.push_str(hint);
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Returns a closure for `.map_err(...)` that rewrites the message but keeps the ErrorKind.
pub fn io_error_with_help_io<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_kind_and_adds_hint() {
        let e = io::Error::from(io::ErrorKind::AlreadyExists);
        let out = io_error_with_help_io("copy", Path::new("/tmp/x"))(e);
        assert_eq!(out.kind(), io::ErrorKind::AlreadyExists);
        let msg = out.to_string();
        assert!(msg.contains("copy '/tmp/x'"), "{msg}");
        assert!(msg.contains("will not be overwritten"), "{msg}");
    }
}
