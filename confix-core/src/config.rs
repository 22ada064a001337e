//! Configuration file loading for confix.
//!
//! Discovers and loads `confix.toml` from a directory and merges it with explicit
//! caller overrides (caller wins).

use crate::settings::{BusyPolicy, ResolveSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "confix.toml";

/// Top-level configuration from confix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfixConfig {
    pub resolve: ResolveConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    pub verbose: bool,
    pub persist: bool,
    pub max_passes: Option<usize>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            persist: true,
            max_passes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub on_busy: BusyPolicy,
}

/// Values the caller set explicitly; `None` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub verbose: Option<bool>,
    pub persist: Option<bool>,
    pub max_passes: Option<usize>,
    pub on_busy: Option<BusyPolicy>,
}

pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<ConfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<ConfixConfig> {
    let config: ConfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return the default if there is none.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<ConfixConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(ConfixConfig::default()),
    }
}

/// Combine the file with caller overrides into pipeline settings.
pub fn merge_settings(config: &ConfixConfig, overrides: &ConfigOverrides) -> ResolveSettings {
    ResolveSettings {
        verbose: overrides.verbose.unwrap_or(config.resolve.verbose),
        persist: overrides.persist.unwrap_or(config.resolve.persist),
        max_passes: overrides.max_passes.or(config.resolve.max_passes),
        on_busy: overrides.on_busy.unwrap_or(config.session.on_busy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_full_config() {
        let contents = r#"
[resolve]
verbose = true
persist = false
max_passes = 4

[session]
on_busy = "reject"
"#;

        let config = parse_config(contents).unwrap();
        assert!(config.resolve.verbose);
        assert!(!config.resolve.persist);
        assert_eq!(config.resolve.max_passes, Some(4));
        assert_eq!(config.session.on_busy, BusyPolicy::Reject);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = parse_config("[resolve]\nverbose = true\n").unwrap();
        assert!(config.resolve.persist);
        assert_eq!(config.resolve.max_passes, None);
        assert_eq!(config.session.on_busy, BusyPolicy::CancelPrevious);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = parse_config("[resolve]\nfuture_knob = 1\n[ui]\ntheme = \"dark\"\n").unwrap();
        assert!(config.resolve.persist);
    }

    #[test]
    fn invalid_busy_policy_is_an_error() {
        let err = parse_config("[session]\non_busy = \"queue\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML"));
    }

    #[test]
    fn discover_and_load_from_dir() {
        let td = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(td.path()).unwrap();

        assert!(discover_config(dir).is_none());
        let config = load_or_default(dir).unwrap();
        assert!(config.resolve.persist);

        fs::write(dir.join(CONFIG_FILE_NAME), "[resolve]\npersist = false\n").unwrap();
        assert!(discover_config(dir).is_some());
        let config = load_or_default(dir).unwrap();
        assert!(!config.resolve.persist);
    }

    #[test]
    fn overrides_win_over_file() {
        let config = parse_config("[resolve]\nverbose = true\nmax_passes = 2\n").unwrap();

        let merged = merge_settings(&config, &ConfigOverrides::default());
        assert!(merged.verbose);
        assert_eq!(merged.max_passes, Some(2));

        let merged = merge_settings(
            &config,
            &ConfigOverrides {
                verbose: Some(false),
                max_passes: Some(8),
                on_busy: Some(BusyPolicy::Reject),
                ..ConfigOverrides::default()
            },
        );
        assert!(!merged.verbose);
        assert_eq!(merged.max_passes, Some(8));
        assert_eq!(merged.on_busy, BusyPolicy::Reject);
        assert!(merged.persist);
    }
}
