//! Settings resolution.
//! Merges the command line, the XML settings file and built-in defaults into
//! one `WatchSettings`.
//!
//! Precedence per field: CLI > settings file > default. The four core values come
//! either all from the positionals or all from the settings file; the retry knobs
//! and logging options can come from either source regardless.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::types::{LogLevel, WatchSettings};
use super::xml::XmlSettings;
use super::{DEFAULT_CACHE_TIME_SECS, DEFAULT_MAX_RETRIES};
use crate::cli::Args;
use crate::errors::ConfigError;

/// Build settings from parsed arguments and an optional settings file.
pub fn resolve_settings(args: &Args, xml: Option<&XmlSettings>) -> Result<WatchSettings, ConfigError> {
    let empty = XmlSettings::default();
    let xml = xml.unwrap_or(&empty);

    let (watch_path, file_filter, destination, poll_raw) = match args.positional_count() {
        0 => (
            PathBuf::from(required(xml.path.as_deref(), "path")?),
            required(xml.file_name.as_deref(), "fileName")?.to_string(),
            PathBuf::from(required(xml.destination.as_deref(), "Destination")?),
            required(xml.polling_interval_ms.as_deref(), "PollingIntervalMilliSec")?.to_string(),
        ),
        4 => (
            trimmed_path(args.watch_path.as_ref()),
            args.file_name.as_deref().unwrap_or_default().trim().to_string(),
            trimmed_path(args.destination.as_ref()),
            args.poll_interval_ms.as_deref().unwrap_or_default().trim().to_string(),
        ),
        n => return Err(ConfigError::PartialPositionals(n)),
    };

    let poll_ms: u64 = parse_value("PollingIntervalMilliSec", &poll_raw)?;
    let mut settings = WatchSettings::new(watch_path, file_filter, destination, Duration::from_millis(poll_ms));

    let cache_secs = match args.cache_time_secs {
        Some(v) => v,
        None => parse_opt("CacheTimeSeconds", xml.cache_time_seconds.as_deref())?.unwrap_or(DEFAULT_CACHE_TIME_SECS),
    };
    settings.cache_ttl = Duration::from_secs(cache_secs);

    settings.max_retries = match args.max_retries {
        Some(v) => v,
        None => parse_opt("MaxRetries", xml.max_retries.as_deref())?.unwrap_or(DEFAULT_MAX_RETRIES),
    };

    let timeout_secs: Option<u64> = match args.timeout_secs {
        Some(v) => Some(v),
        None => parse_opt("TimeoutSeconds", xml.timeout_seconds.as_deref())?,
    };
    settings.timeout = timeout_secs.filter(|s| *s > 0).map(Duration::from_secs);

    if let Some(level) = args.effective_log_level() {
        settings.log_level = level;
    } else if let Some(raw) = xml.log_level.as_deref() {
        settings.log_level = parse_value::<LogLevel>("log_level", raw)?;
    }

    if let Some(p) = args.log_file.as_ref() {
        settings.log_file = Some(p.clone());
    } else if let Some(p) = xml.log_file.as_deref() {
        settings.log_file = Some(PathBuf::from(p));
    }
    settings.json_logs = args.json;

    Ok(settings)
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn trimmed_path(p: Option<&PathBuf>) -> PathBuf {
    p.map(|p| PathBuf::from(p.to_string_lossy().trim()))
        .unwrap_or_default()
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: "not a valid value".into(),
    })
}

fn parse_opt<T: FromStr>(key: &'static str, raw: Option<&str>) -> Result<Option<T>, ConfigError> {
    raw.map(|r| parse_value(key, r)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn xml_full() -> XmlSettings {
        XmlSettings {
            path: Some("/xml/in".into()),
            file_name: Some("data.csv".into()),
            destination: Some("/xml/out".into()),
            polling_interval_ms: Some("750".into()),
            cache_time_seconds: Some("2".into()),
            max_retries: Some("6".into()),
            timeout_seconds: None,
            log_level: Some("debug".into()),
            log_file: None,
        }
    }

    #[test]
    fn settings_file_supplies_destination_correctly() {
        let args = Args::parse_from(["file_watcher"]);
        let s = resolve_settings(&args, Some(&xml_full())).unwrap();
        assert_eq!(s.watch_path, PathBuf::from("/xml/in"));
        assert_eq!(s.file_filter, "data.csv");
        assert_eq!(s.destination, PathBuf::from("/xml/out"));
        assert_eq!(s.poll_interval, Duration::from_millis(750));
        assert_eq!(s.cache_ttl, Duration::from_secs(2));
        assert_eq!(s.max_retries, 6);
        assert_eq!(s.log_level, LogLevel::Debug);
    }

    #[test]
    fn positionals_override_core_values_but_retry_knobs_still_come_from_file() {
        let args = Args::parse_from(["file_watcher", " /cli/in ", "x.bin", "/cli/out", " 100 "]);
        let s = resolve_settings(&args, Some(&xml_full())).unwrap();
        assert_eq!(s.watch_path, PathBuf::from("/cli/in"));
        assert_eq!(s.file_filter, "x.bin");
        assert_eq!(s.destination, PathBuf::from("/cli/out"));
        assert_eq!(s.poll_interval, Duration::from_millis(100));
        assert_eq!(s.cache_ttl, Duration::from_secs(2));
        assert_eq!(s.max_retries, 6);
    }

    #[test]
    fn flags_beat_settings_file() {
        let args = Args::parse_from(["file_watcher", "--cache-time-secs", "9", "--max-retries", "0", "--timeout-secs", "30"]);
        let s = resolve_settings(&args, Some(&xml_full())).unwrap();
        assert_eq!(s.cache_ttl, Duration::from_secs(9));
        assert_eq!(s.max_retries, 0);
        assert_eq!(s.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn defaults_apply_without_settings_file() {
        let args = Args::parse_from(["file_watcher", "/in", "a.txt", "/out", "10"]);
        let s = resolve_settings(&args, None).unwrap();
        assert_eq!(s.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TIME_SECS));
        assert_eq!(s.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(s.timeout, None);
    }

    #[test]
    fn missing_destination_in_file_is_reported_by_key() {
        let mut xml = xml_full();
        xml.destination = None;
        let err = resolve_settings(&Args::parse_from(["file_watcher"]), Some(&xml)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("Destination")), "{err:?}");
    }

    #[test]
    fn partial_positionals_are_rejected() {
        let args = Args::parse_from(["file_watcher", "/in", "a.txt"]);
        let err = resolve_settings(&args, Some(&xml_full())).unwrap_err();
        assert!(matches!(err, ConfigError::PartialPositionals(2)));
    }

    #[test]
    fn non_numeric_interval_is_invalid() {
        let args = Args::parse_from(["file_watcher", "/in", "a.txt", "/out", "soon"]);
        let err = resolve_settings(&args, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PollingIntervalMilliSec", .. }), "{err:?}");
    }
}
