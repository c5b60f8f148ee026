//! Application flow.
//! Reads the settings file, merges it with the command line, validates, starts
//! logging, then hands over to the orchestrator and reports the outcome.
//!
//! Config problems print to stderr (logging is not up yet) and end the run with
//! `Outcome::MissingParams`.

use file_watcher::cli::Args;
use file_watcher::config::{load_existing, load_or_init, LoadResult, XmlSettings, CONFIG_ENV};
use file_watcher::output as out;
use file_watcher::{default_config_path, resolve_settings, run_watch, ConfigError, FsLockProbe, Outcome};
use tracing::{debug, info};

use crate::logging::init_tracing;

/// Run the CLI application and return the outcome the process exits with.
pub fn run(args: Args) -> Outcome {
    if args.print_config {
        print_config_location();
        return Outcome::Success;
    }

    let positionals = args.positional_count();
    if positionals != 0 && positionals != 4 {
        out::print_error(&ConfigError::PartialPositionals(positionals).to_string());
        return Outcome::MissingParams;
    }

    let xml = match read_settings_file(positionals == 0) {
        Ok(xml) => xml,
        Err(outcome) => return outcome,
    };

    let settings = match resolve_settings(&args, xml.as_ref()).and_then(|s| s.validate().map(|()| s)) {
        Ok(s) => s,
        Err(e) => {
            out::print_error(&e.to_string());
            out::print_info("Usage: file_watcher <WATCH_PATH> <FILE_NAME> <DESTINATION> <POLL_INTERVAL_MS>");
            return Outcome::MissingParams;
        }
    };

    let guard = match init_tracing(&settings.log_level, settings.log_file.as_deref(), settings.json_logs) {
        Ok(g) => g,
        Err(e) => {
            out::print_error(&format!("Failed to initialize logging: {e}"));
            return Outcome::Exception;
        }
    };

    debug!(?args, "starting file_watcher");
    out::print_user(&settings.summary());
    info!(
        watch = %settings.watch_path.display(),
        filter = %settings.file_filter,
        destination = %settings.destination.display(),
        "settings resolved"
    );

    let outcome = run_watch(&settings, FsLockProbe);
    info!(%outcome, code = outcome.exit_code(), "file_watcher finished");
    if outcome == Outcome::Success {
        out::print_success(&format!("{} copied into {}", settings.file_filter, settings.destination.display()));
    }

    // Flush the file appender before the process exits.
    drop(guard);
    outcome
}

/// Load the settings file.
/// Without positionals it is required, and a missing default file is replaced by a
/// template (which ends the run). With all four positionals it only contributes
/// optional knobs: nothing is created, and an unreadable file is skipped with a warning.
fn read_settings_file(required: bool) -> Result<Option<XmlSettings>, Outcome> {
    if !required {
        return Ok(match load_existing() {
            Ok(found) => found.map(|(_, settings)| settings),
            Err(e) => {
                out::print_warn(&format!("Ignoring settings file: {e:#}"));
                None
            }
        });
    }

    match load_or_init() {
        Ok(LoadResult::Loaded { settings, .. }) => Ok(Some(settings)),
        Ok(LoadResult::CreatedTemplate(path)) => {
            out::print_success(&format!("A template file_watcher config was written to: {}", path.display()));
            out::print_info(&ConfigError::TemplateCreated(path).to_string());
            out::print_info(&format!("To use a different location set {CONFIG_ENV}."));
            Err(Outcome::MissingParams)
        }
        Ok(LoadResult::Missing(path)) => {
            match path {
                Some(p) => out::print_error(&format!("Settings file not found: {}", p.display())),
                None => out::print_error("Could not determine a settings file location"),
            }
            Err(Outcome::MissingParams)
        }
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            Err(Outcome::MissingParams)
        }
    }
}

fn print_config_location() {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {explicit}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default file_watcher config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}
