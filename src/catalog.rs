use std::error::Error as StdError;
use std::time::Duration;

use base64::prelude::*;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::config::Config;
use crate::track::Track;

pub const TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("dstream/", env!("CARGO_PKG_VERSION"));

/// `Authorization` value for HTTP Basic credentials.
pub fn basic_authorization(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Any failure to get a listing out of the catalog. Transport errors, bad
/// statuses and undecodable bodies are deliberately not told apart.
#[derive(Debug)]
pub enum Error {
    Unavailable(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Unavailable(format!("invalid response: {}", err))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Unavailable(reason) => write!(f, "catalog unavailable: {}", reason),
        }
    }
}

impl StdError for Error {}

/// Source of track listings.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Searches for `query`, or returns a random sample when it is empty.
    async fn fetch(&self, query: &str) -> Result<Vec<Track>, Error>;

    /// Value of the `Authorization` header sent to the catalog.
    fn authorization(&self) -> &str;
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<CatalogClient, Error> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;

        let authorization = basic_authorization(&config.api_username, &config.api_password);

        info!("catalog at '{}'", base_url);

        Ok(CatalogClient {
            http,
            base_url,
            authorization,
        })
    }

    pub fn endpoint(&self, query: &str) -> String {
        if query.is_empty() {
            format!("{}/random.json", self.base_url)
        } else {
            format!("{}/tracks.json", self.base_url)
        }
    }
}

impl Catalog for CatalogClient {
    async fn fetch(&self, query: &str) -> Result<Vec<Track>, Error> {
        let url = self.endpoint(query);
        debug!("fetching url {} q='{}'", url, query);

        let mut request = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.authorization.as_str());

        if !query.is_empty() {
            request = request.query(&[("q", query)]);
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;

        let tracks: Vec<Track> = serde_json::from_str(&String::from_utf8_lossy(&body))?;

        debug!("got {} tracks", tracks.len());

        Ok(tracks)
    }

    fn authorization(&self) -> &str {
        &self.authorization
    }
}
