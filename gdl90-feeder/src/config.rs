//! Configuration file management.
//!
//! Reads/writes `~/.gdl90/config.yaml` with broadcast destination, export
//! filter limits, cycle interval, and the ownship address. The encoder
//! itself only knows its fixed defaults; overrides live here.

use std::path::{Path, PathBuf};

use gdl90_core::export::{EXPORT_DISTANCE_FAR, EXPORT_EXPIRATION_TIME, GDL90_DST_PORT};
use gdl90_core::{addr_from_hex, addr_to_string, ExportConfig, Gdl90Error};

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub broadcast: BroadcastConfig,
    pub export: ExportSettings,
    pub ownship: OwnshipConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastConfig {
    pub dest: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub expiration_secs: f64,
    pub max_distance_m: f64,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnshipConfig {
    pub addr: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broadcast: BroadcastConfig {
                dest: "255.255.255.255".into(),
                port: GDL90_DST_PORT,
            },
            export: ExportSettings {
                expiration_secs: EXPORT_EXPIRATION_TIME,
                max_distance_m: EXPORT_DISTANCE_FAR,
                interval_ms: 1000,
            },
            ownship: OwnshipConfig { addr: 0xF00000 },
        }
    }
}

impl ExportSettings {
    pub fn to_export_config(&self) -> ExportConfig {
        ExportConfig {
            expiration_secs: self.expiration_secs,
            max_distance_m: self.max_distance_m,
        }
    }
}

/// Get the config directory path (`~/.gdl90/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".gdl90")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.gdl90/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
            Config::default()
        }
    }
}

/// Save config to `~/.gdl90/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, Gdl90Error> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), Gdl90Error> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| Gdl90Error::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config)).map_err(|e| Gdl90Error::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep the
/// default.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match (current_section.as_deref(), key) {
            (Some("broadcast"), "dest") => {
                if let Some(v) = parse_string_value(val) {
                    config.broadcast.dest = v;
                }
            }
            (Some("broadcast"), "port") => {
                if let Ok(v) = val.parse::<u16>() {
                    config.broadcast.port = v;
                }
            }
            (Some("export"), "expiration_secs") => {
                if let Some(v) = parse_float_value(val) {
                    config.export.expiration_secs = v;
                }
            }
            (Some("export"), "max_distance_m") => {
                if let Some(v) = parse_float_value(val) {
                    config.export.max_distance_m = v;
                }
            }
            (Some("export"), "interval_ms") => {
                if let Ok(v) = val.parse::<u64>() {
                    config.export.interval_ms = v;
                }
            }
            (Some("ownship"), "addr") => {
                if let Some(v) = parse_string_value(val).as_deref().and_then(addr_from_hex) {
                    config.ownship.addr = v;
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let lines = [
        "# gdl90-feeder configuration".to_string(),
        String::new(),
        "broadcast:".into(),
        format!("  dest: \"{}\"", config.broadcast.dest),
        format!("  port: {}", config.broadcast.port),
        String::new(),
        "export:".into(),
        format!("  expiration_secs: {}", config.export.expiration_secs),
        format!("  max_distance_m: {}", config.export.max_distance_m),
        format!("  interval_ms: {}", config.export.interval_ms),
        String::new(),
        "ownship:".into(),
        format!("  addr: \"{}\"", addr_to_string(config.ownship.addr)),
    ];

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.broadcast.port, 4000);
        assert_eq!(config.broadcast.dest, "255.255.255.255");
        assert_eq!(config.export.expiration_secs, 5.0);
        assert_eq!(config.export.max_distance_m, 10_000.0);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
broadcast:
  dest: "192.168.1.255"
  port: 4001

export:
  expiration_secs: 8
  max_distance_m: 25000.5
  interval_ms: 500

ownship:
  addr: "ABCDEF"
"#;
        let config = parse_config(text);
        assert_eq!(config.broadcast.dest, "192.168.1.255");
        assert_eq!(config.broadcast.port, 4001);
        assert_eq!(config.export.expiration_secs, 8.0);
        assert_eq!(config.export.max_distance_m, 25000.5);
        assert_eq!(config.export.interval_ms, 500);
        assert_eq!(config.ownship.addr, 0xABCDEF);
    }

    #[test]
    fn test_parse_config_bad_values_keep_defaults() {
        let text = r#"
broadcast:
  port: lots
export:
  expiration_secs: ~
ownship:
  addr: "not-hex"
"#;
        let config = parse_config(text);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_top_level_value_ends_section() {
        let text = "broadcast:\n  port: 4002\nstray: 1\n  port: 4003\n";
        let config = parse_config(text);
        assert_eq!(config.broadcast.port, 4002);
    }

    #[test]
    fn test_export_config_conversion() {
        let config = Config::default();
        assert_eq!(config.export.to_export_config(), ExportConfig::default());
    }

    #[test]
    fn test_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.broadcast.dest = "10.0.0.255".into();
        config.export.interval_ms = 250;
        config.ownship.addr = 0x4840D6;

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(&dir.path().join("nope.yaml")), Config::default());
    }
}
