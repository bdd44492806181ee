use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::version::EpochPolicy;

const CONFIG_FILENAME: &str = "errata-resolver.toml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// seconds
    pub connect_timeout: u64,
    pub connect_retries: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: String::from("localhost"),
            port: 5432,
            user: String::from("rhnuser"),
            password: String::from("rhnpw"),
            name: String::from("rhnschema"),
            max_connections: 8,
            connect_timeout: 10,
            connect_retries: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: String::from("0.0.0.0:8080"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// per-request deadline in seconds, 0 disables it
    pub timeout: u64,
    pub workers: usize,
    pub epoch_policy: EpochPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            timeout: 30,
            workers: 8,
            epoch_policy: EpochPolicy::default(),
        }
    }
}

impl ResolverConfig {
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout))
        }
    }
}

fn get_config_path() -> Result<Option<PathBuf>, String> {
    let local = {
        let mut path = std::env::current_dir().map_err(|error| error.to_string())?;
        path.push(CONFIG_FILENAME);
        path
    };

    let site = Path::new("/etc/errata-resolver/").join(CONFIG_FILENAME);
    let default = Path::new("/usr/share/errata-resolver/").join(CONFIG_FILENAME);

    Ok([local, site, default].into_iter().find(|path| path.exists()))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    let mut config: Config = basic_toml::from_str(contents).map_err(|error| error.to_string())?;

    if config.resolver.workers == 0 {
        config.resolver.workers = 1;
    }

    Ok(config)
}

/// Load the configuration file, either from an explicit path (which must
/// exist), or from the first of the well-known locations. Without any
/// configuration file, built-in defaults are used.
pub fn get_config(path: Option<&Path>) -> Result<Config, String> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match get_config_path()? {
            Some(path) => path,
            None => {
                info!("No configuration file found, using defaults.");
                return Ok(Config::default());
            },
        },
    };

    info!("Using configuration file: {}", path.to_string_lossy());

    let contents = match read_to_string(&path) {
        Ok(string) => string,
        Err(error) => return Err(format!("Failed to read {}: {}", path.to_string_lossy(), error)),
    };

    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.database.name, "rhnschema");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.server.address, "0.0.0.0:8080");
        assert_eq!(config.resolver.deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.resolver.epoch_policy, EpochPolicy::Compatible);
    }

    #[test]
    fn partial_sections() {
        let config = parse_config(
            r#"
            [database]
            host = "postgresql-slave"

            [resolver]
            timeout = 0
            workers = 0
            epoch_policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.host, "postgresql-slave");
        assert_eq!(config.database.user, "rhnuser");
        assert_eq!(config.resolver.deadline(), None);
        assert_eq!(config.resolver.workers, 1);
        assert_eq!(config.resolver.epoch_policy, EpochPolicy::Strict);
    }

    #[test]
    fn invalid_policy() {
        assert!(parse_config("[resolver]\nepoch_policy = \"loose\"\n").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(get_config(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\naddress = \"127.0.0.1:3030\"\n").unwrap();
        assert_eq!(get_config(Some(&path)).unwrap().server.address, "127.0.0.1:3030");
    }
}
