use std::error::Error as StdError;

use crate::catalog;
use crate::config;

#[derive(Debug)]
pub enum Error {
    ConfigError(config::Error),
    DatabaseError(rusqlite::Error),
    CatalogError(catalog::Error),
    IoError(std::io::Error),
    InvalidPluginUrl(String),
    IncompatibleDatabase,
}

impl From<config::Error> for Error {
    fn from(err: config::Error) -> Error {
        Error::ConfigError(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Error {
        Error::DatabaseError(err)
    }
}

impl From<catalog::Error> for Error {
    fn from(err: catalog::Error) -> Error {
        Error::CatalogError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ConfigError(e) => write!(f, "{}", e),
            Error::DatabaseError(e) => write!(f, "database error: {}", e),
            Error::CatalogError(e) => write!(f, "{}", e),
            Error::IoError(e) => write!(f, "io error: {}", e),
            Error::InvalidPluginUrl(reason) => write!(f, "invalid plugin url: {}", reason),
            Error::IncompatibleDatabase => write!(f, "database was written by a newer version"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::ConfigError(e) => Some(e),
            Error::DatabaseError(e) => Some(e),
            Error::CatalogError(e) => Some(e),
            Error::IoError(e) => Some(e),
            Error::InvalidPluginUrl(_) | Error::IncompatibleDatabase => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
