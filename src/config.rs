use std::collections::HashSet;
use std::sync::OnceLock;

use serde::Deserialize;

pub(crate) const DEFAULT_LOG_FILE_PATH: &str = "/tmp/driver-sim.log";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub versions: Vec<VersionEntry>,
    pub host: HostConfig,
}

// One driver release in the simulated catalog
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    pub source: String,
    pub notes: String,
    #[serde(default)]
    pub latest: bool,
}

// Host facts printed in the install log header
#[derive(Debug, Deserialize)]
pub struct HostConfig {
    pub package_manager: String,
    pub kernel: String,
    pub gpu: String,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        let raw = include_str!("../config.toml");
        let parsed: Config = toml::from_str(raw).expect("Invalid driver-sim config.toml");
        validate_config(&parsed).expect("Invalid driver-sim config.toml");
        parsed
    })
}

impl Config {
    // The catalog entry flagged as latest
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| entry.latest)
    }
}

fn validate_config(cfg: &Config) -> Result<(), String> {
    if cfg.versions.is_empty() {
        return Err("versions must not be empty".to_string());
    }

    let mut seen = HashSet::new();
    for (idx, entry) in cfg.versions.iter().enumerate() {
        if entry.version.trim().is_empty() {
            return Err(format!("versions[{idx}].version must not be empty"));
        }
        if !seen.insert(entry.version.as_str()) {
            return Err(format!("versions[{idx}] duplicates {}", entry.version));
        }
    }

    let latest = cfg.versions.iter().filter(|entry| entry.latest).count();
    if latest != 1 {
        return Err(format!(
            "exactly one version must be flagged latest, found {latest}"
        ));
    }

    if cfg.host.package_manager.trim().is_empty() {
        return Err("host.package_manager must not be empty".to_string());
    }
    if cfg.host.kernel.trim().is_empty() {
        return Err("host.kernel must not be empty".to_string());
    }
    if cfg.host.gpu.trim().is_empty() {
        return Err("host.gpu must not be empty".to_string());
    }

    Ok(())
}

// Developer overrides read from the environment (and `.env`)
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub seed: Option<u64>,
    pub log_path: Option<String>,
    pub secure_boot: Option<bool>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            seed: std::env::var("DRIVER_SIM_SEED")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
            log_path: std::env::var("DRIVER_SIM_LOG")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            secure_boot: std::env::var("DRIVER_SIM_SECURE_BOOT")
                .ok()
                .and_then(|value| parse_switch(&value)),
        }
    }

    pub fn log_path(&self) -> &str {
        self.log_path.as_deref().unwrap_or(DEFAULT_LOG_FILE_PATH)
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_is_valid() {
        let cfg = config();
        assert_eq!(cfg.versions.len(), 5);
        assert_eq!(cfg.latest().map(|v| v.version.as_str()), Some("560.35.03"));
        assert_eq!(cfg.host.package_manager, "dnf");
    }

    #[test]
    fn rejects_two_latest_entries() {
        let raw = r#"
            [[versions]]
            version = "1"
            source = "a"
            notes = "a"
            latest = true

            [[versions]]
            version = "2"
            source = "a"
            notes = "a"
            latest = true

            [host]
            package_manager = "dnf"
            kernel = "k"
            gpu = "g"
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_duplicate_versions() {
        let raw = r#"
            [[versions]]
            version = "1"
            source = "a"
            notes = "a"
            latest = true

            [[versions]]
            version = "1"
            source = "a"
            notes = "a"

            [host]
            package_manager = "dnf"
            kernel = "k"
            gpu = "g"
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.contains("duplicates"));
    }

    #[test]
    fn switch_values() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch(" off "), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }
}
