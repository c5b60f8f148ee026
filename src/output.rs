//! User-facing console lines, separate from tracing output.
//! Prefixes are colored only when stdout is a terminal.

use owo_colors::{OwoColorize, Style};

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn emit(stream: Stream, tag: &str, style: Style, msg: &str) {
    let line = if is_tty() {
        format!("{} {}", tag.style(style), msg)
    } else {
        format!("{tag} {msg}")
    };
    match stream {
        Stream::Out => println!("{line}"),
        Stream::Err => eprintln!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Stream::Out, "info:", Style::new().cyan().bold(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Err, "warn:", Style::new().yellow().bold(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Err, "error:", Style::new().red().bold(), msg);
}

pub fn print_success(msg: &str) {
    emit(Stream::Out, "ok:", Style::new().green().bold(), msg);
}

/// Unprefixed line, for the settings summary and other output users may script against.
pub fn print_user(msg: &str) {
    println!("{msg}");
}
