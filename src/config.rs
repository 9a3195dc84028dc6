use serde::{Deserialize, Serialize};
use std::fs;
use toml;

/// Engine-wide tunables, loaded from `config.toml` if present in the
/// current directory. Every field has a default so a missing file is
/// not an error.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_page_cache_capacity")]
    pub page_cache_capacity: usize,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_magic")]
    pub magic: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_cache_capacity: default_page_cache_capacity(),
            data_dir: default_data_dir(),
            magic: default_magic(),
        }
    }
}

/// Load `config.toml` from the current directory, falling back to
/// defaults when the file is absent.
pub fn get_config() -> Result<Config, Box<dyn std::error::Error>> {
    match fs::read_to_string("config.toml") {
        Ok(file) => Ok(toml::from_str(&file)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

// --- Default Functions (Necessary for serde(default = "...")) ---
fn default_page_cache_capacity() -> usize {
    3
}
fn default_data_dir() -> String {
    ".".to_string()
}
fn default_magic() -> String {
    "4337PRJ3".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_values() {
        let config = Config::default();
        assert_eq!(config.page_cache_capacity, 3);
        assert_eq!(config.data_dir, ".");
        assert_eq!(config.magic, "4337PRJ3");
    }

    #[test]
    fn partial_toml_fills_remaining_fields_from_defaults() {
        let config: Config = toml::from_str("page_cache_capacity = 8\n").unwrap();
        assert_eq!(config.page_cache_capacity, 8);
        assert_eq!(config.data_dir, ".");
        assert_eq!(config.magic, "4337PRJ3");
    }

    #[test]
    fn full_toml_overrides_every_field() {
        let toml_src = "page_cache_capacity = 16\ndata_dir = \"/var/lib/treedex\"\nmagic = \"CUSTOM42\"\n";
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.page_cache_capacity, 16);
        assert_eq!(config.data_dir, "/var/lib/treedex");
        assert_eq!(config.magic, "CUSTOM42");
    }
}
