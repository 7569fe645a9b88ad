use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{APP_DIR, CONFIG_ENV};
use crate::pricing::RateCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigSortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) db_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) compact: bool,
    #[serde(default)]
    pub(crate) no_cost: bool,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) order: Option<ConfigSortOrder>,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,
    #[serde(default)]
    pub(crate) pricing: RateCard,
    /// Problems hit while searching for a config file; logged once logging is up
    #[serde(skip)]
    pub(crate) load_warnings: Vec<String>,
}

impl Config {
    /// First readable, parseable file wins; otherwise defaults
    pub(crate) fn load() -> Self {
        let mut warnings = Vec::new();
        for path in Self::get_config_paths() {
            match Self::load_from(&path) {
                Ok(Some(mut config)) => {
                    config.load_warnings = warnings;
                    return config;
                }
                Ok(None) => {}
                Err(e) => warnings.push(e),
            }
        }
        Config {
            load_warnings: warnings,
            ..Self::default()
        }
    }

    fn load_from(path: &Path) -> Result<Option<Self>, String> {
        let Ok(content) = fs::read_to_string(path) else {
            return Ok(None);
        };
        toml::from_str::<Config>(&content)
            .map(Some)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Explicit override
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }

        // 2. XDG config: ~/.config/toolstats/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(APP_DIR).join("config.toml"));
        }

        // 3. Platform config dir (Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join(APP_DIR).join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 4. ~/.toolstats.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_DIR}.toml")));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_paths_not_empty() {
        assert!(!Config::get_config_paths().is_empty());
    }

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/var/lib/toolstats/usage.db"
            compact = true
            order = "desc"
            color = "never"
            timezone = "America/Chicago"
            locale = "de"

            [pricing]
            default_per_call = 0.01
            [pricing.apps]
            "report-gen" = 0.75
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/var/lib/toolstats/usage.db")));
        assert!(config.compact);
        assert_eq!(config.order, Some(ConfigSortOrder::Desc));
        assert_eq!(config.color, Some(ConfigColorMode::Never));
        assert_eq!(config.timezone.as_deref(), Some("America/Chicago"));
        assert!((config.pricing.rate_for("report-gen") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.db_path.is_none());
        assert!(!config.debug);
        assert!(config.pricing.is_empty());
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "order = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("config.toml"));
    }

    #[test]
    fn load_from_missing_file_is_none() {
        assert!(Config::load_from(Path::new("/no/such/config.toml")).unwrap().is_none());
    }

    #[test]
    fn load_from_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "no_cost = true").unwrap();
        let config = Config::load_from(&path).unwrap().unwrap();
        assert!(config.no_cost);
        assert!(config.load_warnings.is_empty());
    }
}
