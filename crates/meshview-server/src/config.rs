//! Server configuration from the environment.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Configuration for the dashboard backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Snapshot file to load
    pub data_path: PathBuf,

    /// HTTP listen address
    pub listen_addr: SocketAddr,

    /// Include load and memory bars in node views
    pub hardware_usage: bool,

    /// Include the owner contact in node views
    pub show_contact: bool,

    /// Display names for site codes
    pub site_names: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./meshviewer.json"),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            hardware_usage: false,
            show_contact: false,
            site_names: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Create config from `MESHVIEW_*` environment variables, defaulting
    /// anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("MESHVIEW_DATA") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("MESHVIEW_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|_| Error::Config(format!("invalid MESHVIEW_ADDR: {}", addr)))?;
        }
        if let Some(value) = lookup("MESHVIEW_HARDWARE_USAGE") {
            config.hardware_usage = parse_bool("MESHVIEW_HARDWARE_USAGE", &value)?;
        }
        if let Some(value) = lookup("MESHVIEW_SHOW_CONTACT") {
            config.show_contact = parse_bool("MESHVIEW_SHOW_CONTACT", &value)?;
        }
        if let Some(value) = lookup("MESHVIEW_SITE_NAMES") {
            config.site_names = parse_site_names(&value)?;
        }

        Ok(config)
    }

    /// Display name of a site code, or the code itself.
    pub fn site_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.site_names.get(code).map(String::as_str).unwrap_or(code)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("invalid {}: {}", key, other))),
    }
}

/// Parse `code=Name,code2=Name2`.
fn parse_site_names(value: &str) -> Result<HashMap<String, String>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((code, name)) if !code.trim().is_empty() => {
                Ok((code.trim().to_string(), name.trim().to_string()))
            }
            _ => Err(Error::Config(format!("invalid site name entry: {}", entry))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MESHVIEW_DATA", "/srv/mesh.json"),
            ("MESHVIEW_ADDR", "127.0.0.1:8080"),
            ("MESHVIEW_HARDWARE_USAGE", "yes"),
            ("MESHVIEW_SHOW_CONTACT", "1"),
            ("MESHVIEW_SITE_NAMES", "ffhh=Hamburg, ffki = Kiel"),
        ]))
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("/srv/mesh.json"));
        assert_eq!(config.listen_addr.port(), 8080);
        assert!(config.hardware_usage);
        assert!(config.show_contact);
        assert_eq!(config.site_name("ffhh"), "Hamburg");
        assert_eq!(config.site_name("ffki"), "Kiel");
        assert_eq!(config.site_name("other"), "other");
    }

    #[test]
    fn bad_address_is_config_error() {
        let err = ServerConfig::from_lookup(lookup(&[("MESHVIEW_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_bool_is_config_error() {
        let err = ServerConfig::from_lookup(lookup(&[("MESHVIEW_SHOW_CONTACT", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_site_entry_is_config_error() {
        assert!(parse_site_names("ffhh").is_err());
        assert!(parse_site_names("=Name").is_err());
        assert!(parse_site_names(" , ").unwrap().is_empty());
    }
}
