#[macro_use]
extern crate log;

mod catalog;
mod config;
mod db_meta;
mod error;
mod host;
mod logger;
mod query;
mod router;
mod schema;
mod store;
mod track;

use std::fs;

use clap::{App, Arg};

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::ConsoleHost;
use crate::router::{Action, Router};
use crate::store::StoreSource;

async fn run() -> Result<()> {
    let matches = App::new("dstream")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search, browse and play a dstream music catalog")
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .help("Config file")
                .takes_value(true)
                .default_value(config::DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::with_name("profile-dir")
                .long("profile-dir")
                .value_name("DIR")
                .help("Directory holding the play statistics database")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level")
                .takes_value(true)
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
        .arg(
            Arg::with_name("PLUGIN_URL")
                .help("Base URL for navigation entries")
                .index(1)
                .default_value(router::DEFAULT_PLUGIN_URL),
        )
        .arg(
            Arg::with_name("QUERY")
                .help("Action query string, e.g. '?action=play&id=42'")
                .index(2),
        )
        .get_matches();

    logger::init(logger::parse_level(
        matches.value_of("log-level").unwrap_or("info"),
    ));

    let config_path =
        config::expand_path(matches.value_of("config").unwrap_or(config::DEFAULT_CONFIG_PATH));
    let mut config = Config::load(&config_path)?;

    if let Some(profile_dir) = matches.value_of("profile-dir") {
        config.profile_dir = profile_dir.to_string();
    }

    let invocation = router::invocation_url(
        matches
            .value_of("PLUGIN_URL")
            .unwrap_or(router::DEFAULT_PLUGIN_URL),
        matches.value_of("QUERY").unwrap_or(""),
    )?;
    let action = Action::from_url(&invocation);

    fs::create_dir_all(config.profile_dir())?;

    let store = match StoreSource::create(config.db_path())? {
        Some(s) => s,
        None => return Err(Error::IncompatibleDatabase),
    };

    let catalog = CatalogClient::new(&config)?;

    let router = Router::new(config, invocation, catalog, store);

    let mut host = ConsoleHost::stdio();
    router.dispatch(action, &mut host).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}
