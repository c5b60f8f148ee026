//! Config module.
//! Provides settings types, default paths, the XML settings store, resolution and validation.

pub mod paths;
pub mod resolve;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
pub use resolve::resolve_settings;
pub use types::{LogLevel, WatchSettings};
pub use validate::compile_filter;
pub use xml::{create_template_config, load_existing, load_or_init, load_settings_from_xml_path, LoadResult, XmlSettings};

/// Seconds between lock checks when neither the CLI nor the settings file say otherwise.
pub const DEFAULT_CACHE_TIME_SECS: u64 = 5;
/// Lock re-checks before a file is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
