//! XML settings store.
//! - Loads the key/value settings file (quick_xml + serde).
//! - Creates a commented template if the default file is missing
//!   (never when FILE_WATCHER_CONFIG names an explicit file, and never from
//!   `load_existing`).
//!
//! Notes:
//! - Values are kept as trimmed strings here; numeric parsing and range checks
//!   happen during resolution so bad values can name their key.
//! - Unknown elements are rejected to surface misconfigurations early.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, path_has_symlink_ancestor, CONFIG_ENV};
use super::{DEFAULT_CACHE_TIME_SECS, DEFAULT_MAX_RETRIES};
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Raw settings as found in the XML file. Element names follow the historical
/// appSettings keys so existing deployments can be carried over verbatim.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
pub struct XmlSettings {
    #[serde(rename = "path", default, deserialize_with = "de_trimmed_opt")]
    pub path: Option<String>,
    #[serde(rename = "fileName", default, deserialize_with = "de_trimmed_opt")]
    pub file_name: Option<String>,
    #[serde(rename = "Destination", default, deserialize_with = "de_trimmed_opt")]
    pub destination: Option<String>,
    #[serde(rename = "PollingIntervalMilliSec", default, deserialize_with = "de_trimmed_opt")]
    pub polling_interval_ms: Option<String>,
    #[serde(rename = "CacheTimeSeconds", default, deserialize_with = "de_trimmed_opt")]
    pub cache_time_seconds: Option<String>,
    #[serde(rename = "MaxRetries", default, deserialize_with = "de_trimmed_opt")]
    pub max_retries: Option<String>,
    #[serde(rename = "TimeoutSeconds", default, deserialize_with = "de_trimmed_opt")]
    pub timeout_seconds: Option<String>,
    #[serde(rename = "log_level", default, deserialize_with = "de_trimmed_opt")]
    pub log_level: Option<String>,
    #[serde(rename = "log_file", default, deserialize_with = "de_trimmed_opt")]
    pub log_file: Option<String>,
}

// Trim surrounding whitespace; empty elements count as absent.
fn de_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let t = s.trim();
        if t.is_empty() { None } else { Some(t.to_string()) }
    }))
}

/// What happened when looking for the settings file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { path: PathBuf, settings: XmlSettings },
    /// Explicit file missing, or no default location could be determined.
    Missing(Option<PathBuf>),
    CreatedTemplate(PathBuf),
}

/// Parse settings from a specific XML file.
pub fn load_settings_from_xml_path(path: &Path) -> Result<XmlSettings> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read settings xml '{}'", path.display()))?;
    let parsed: XmlSettings =
        from_xml_str(&contents).with_context(|| format!("parse settings xml '{}'", path.display()))?;
    debug!(path = %path.display(), "settings file parsed");
    Ok(parsed)
}

/// Locate and load the settings file, writing a template at the default location
/// when nothing is there yet.
pub fn load_or_init() -> Result<LoadResult> {
    let env_set = env::var_os(CONFIG_ENV).is_some();
    let Some(path) = default_config_path() else {
        return Ok(LoadResult::Missing(None));
    };

    if !path.exists() {
        if env_set {
            return Ok(LoadResult::Missing(Some(path)));
        }
        create_template_config(&path)?;
        return Ok(LoadResult::CreatedTemplate(path));
    }

    let settings = load_settings_from_xml_path(&path)?;
    Ok(LoadResult::Loaded { path, settings })
}

/// Load the settings file only if one is already there. Never writes anything.
pub fn load_existing() -> Result<Option<(PathBuf, XmlSettings)>> {
    match default_config_path() {
        Some(path) if path.is_file() => {
            let settings = load_settings_from_xml_path(&path)?;
            Ok(Some((path, settings)))
        }
        _ => Ok(None),
    }
}

/// Create the default template settings file (and parent directory, 0700).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow::anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let content = format!(
        "<!--\n  file_watcher settings (XML)\n\n    path                    -> directory to watch for the file\n    fileName                -> file name or pattern (* and ? wildcards)\n    Destination             -> directory the file is copied into\n    PollingIntervalMilliSec -> how often progress is logged while waiting\n    CacheTimeSeconds        -> wait between lock checks of a detected file\n    MaxRetries              -> lock re-checks before the file is abandoned\n    TimeoutSeconds          -> optional; exit with code 1 if nothing is copied in time\n    log_level               -> quiet | normal | info | debug\n    log_file                -> optional path to a log file\n\n  Positional command-line arguments override path/fileName/Destination/PollingIntervalMilliSec.\n-->\n<config>\n  <path></path>\n  <fileName></fileName>\n  <Destination></Destination>\n  <PollingIntervalMilliSec>1000</PollingIntervalMilliSec>\n  <CacheTimeSeconds>{}</CacheTimeSeconds>\n  <MaxRetries>{}</MaxRetries>\n  <log_level>normal</log_level>\n</config>\n",
        DEFAULT_CACHE_TIME_SECS, DEFAULT_MAX_RETRIES
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}
