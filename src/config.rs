use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://domain.with.dstream.tld";
pub const DEFAULT_SMB_BASE_PATH: &str = "smb://1.2.3.4/share/with/music";
pub const DEFAULT_PROFILE_DIR: &str = "~/.local/share/dstream";
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/dstream/dstream.toml";

const DB_FILE_NAME: &str = "plays.sqlite3";

#[derive(Debug)]
pub enum Error {
    IoError(io::Error),
    ParseError(toml::de::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Error {
        Error::ParseError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "can't read config: {}", e),
            Error::ParseError(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::ParseError(e) => Some(e),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    Http,
    Smb,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuOrder {
    RandomFirst,
    SearchFirst,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_username: String,
    pub api_password: String,
    pub api_base_url: String,
    pub smb_base_path: String,
    pub playback_mode: PlaybackMode,
    pub menu_order: MenuOrder,
    pub profile_dir: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_username: String::new(),
            api_password: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            smb_base_path: DEFAULT_SMB_BASE_PATH.to_string(),
            playback_mode: PlaybackMode::Smb,
            menu_order: MenuOrder::SearchFirst,
            profile_dir: DEFAULT_PROFILE_DIR.to_string(),
        }
    }
}

impl Config {
    /// Reads a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config, Error> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "no config at '{}', using defaults",
                    path.to_string_lossy()
                );
                return Ok(Config::default().normalized());
            }
            Err(e) => return Err(e.into()),
        };

        info!("using '{}'", path.to_string_lossy());

        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Config, Error> {
        let config: Config = toml::from_str(text)?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Config {
        self.api_username = self.api_username.trim().to_string();
        self.api_password = self.api_password.trim().to_string();
        self.api_base_url = or_default(&self.api_base_url, DEFAULT_API_BASE_URL);
        self.smb_base_path = or_default(&self.smb_base_path, DEFAULT_SMB_BASE_PATH);

        let profile_dir = self.profile_dir.trim();
        self.profile_dir = if profile_dir.is_empty() {
            DEFAULT_PROFILE_DIR.to_string()
        } else {
            profile_dir.to_string()
        };

        self
    }

    pub fn profile_dir(&self) -> PathBuf {
        expand_path(&self.profile_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.profile_dir().join(DB_FILE_NAME)
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    let value = if value.is_empty() { default } else { value };
    value.trim_end_matches('/').to_string()
}

pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
