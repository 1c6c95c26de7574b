use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent tool configuration stored at `~/.xrdsync/config.json`.
/// Created with discovered defaults on first run; the `set` subcommand
/// updates individual fields.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub xrdcp_app_path: PathBuf,
    pub xrdfs_app_path: PathBuf,
    pub adler32_app_path: PathBuf,
    pub siteconf_dir: PathBuf,
    /// Local roots a migration source is allowed to live under. A source
    /// outside every root aborts the whole run.
    pub local_roots: Vec<PathBuf>,
    pub default_parallel: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            xrdcp_app_path: locate_or("xrdcp"),
            xrdfs_app_path: locate_or("xrdfs"),
            adler32_app_path: locate_or("xrdadler32"),
            siteconf_dir: PathBuf::from("/cvmfs/cms.cern.ch/SITECONF"),
            local_roots: vec![
                PathBuf::from("/cms/ldap_home"),
                PathBuf::from("/cms/scratch"),
            ],
            default_parallel: 4,
        }
    }
}

// Prefer an absolute path from PATH lookup; fall back to the bare name so a
// later PATH change can still resolve it.
fn locate_or(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

impl Config {
    pub fn config_dir() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".".to_owned() + env!("CARGO_PKG_NAME")),
            None => {
                eprintln!("Cannot find user's home dir");
                std::process::exit(1);
            }
        }
    }

    pub fn logs_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    pub fn init() -> Self {
        let dir = Self::config_dir();
        let path = Self::config_path();
        if !path.exists() {
            if let Err(e) = std::fs::create_dir_all(&dir) {
                eprintln!("Cannot create config dir {}: {}", dir.display(), e);
                std::process::exit(1);
            }
            let config = Config::default();
            config.save_to_storage();
            return config;
        }
        Self::read_from(&path)
    }

    fn read_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Malformed config {}: {}, using defaults", path.display(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    pub fn save_to_storage(&self) {
        let path = Self::config_path();
        match serde_json::to_string_pretty(self) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    eprintln!("Cannot write config {}: {}", path.display(), e);
                }
            }
            Err(e) => eprintln!("Cannot serialize config: {}", e),
        }
    }
}
