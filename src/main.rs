use file_watcher::cli;

mod app;
mod logging;

fn main() {
    let outcome = app::run(cli::parse());
    std::process::exit(outcome.exit_code());
}
