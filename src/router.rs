use chrono::{Local, TimeZone};
use reqwest::Url;

use crate::catalog::Catalog;
use crate::config::{Config, MenuOrder, PlaybackMode};
use crate::error::{Error, Result};
use crate::host::{Directory, Host, ListItem, MusicInfo};
use crate::store::{StatsEntry, StoreSource};
use crate::track::{build_label, Codec, Track};

pub const DEFAULT_PLUGIN_URL: &str = "plugin://plugin.audio.dstream/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Root,
    Search,
    MostPlayed,
    RecentlyPlayed,
    Play { id: String },
}

impl Action {
    /// Reads `action` and `id` from the invocation's query string. Anything
    /// unrecognised lands on the root menu.
    pub fn from_url(url: &Url) -> Action {
        let mut action = None;
        let mut id = String::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "action" => action = Some(value.into_owned()),
                "id" => id = value.into_owned(),
                _ => {}
            }
        }

        match action.as_deref() {
            Some("search") => Action::Search,
            Some("most_played") => Action::MostPlayed,
            Some("recently_played") => Action::RecentlyPlayed,
            Some("play") => Action::Play { id },
            _ => Action::Root,
        }
    }
}

/// Combines the plugin URL and query string of an invocation.
pub fn invocation_url(plugin_url: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(plugin_url)
        .map_err(|e| Error::InvalidPluginUrl(format!("'{}': {}", plugin_url, e)))?;

    let query = query.strip_prefix('?').unwrap_or(query);
    url.set_query(if query.is_empty() { None } else { Some(query) });

    Ok(url)
}

/// Stream URL for a catalog file in the configured playback mode.
pub fn playable_url(config: &Config, authorization: &str, file: &str) -> String {
    match config.playback_mode {
        PlaybackMode::Http => format!(
            "{}{}|Authorization= {}",
            config.api_base_url, file, authorization
        ),
        PlaybackMode::Smb => format!(
            "{}{}",
            config.smb_base_path,
            file.strip_prefix("/music").unwrap_or(file)
        ),
    }
}

fn played_date(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "?".to_string(),
    }
}

pub struct Router<C> {
    config: Config,
    base_url: Url,
    catalog: C,
    store: StoreSource,
}

impl<C: Catalog> Router<C> {
    pub fn new(config: Config, base_url: Url, catalog: C, store: StoreSource) -> Router<C> {
        Router {
            config,
            base_url,
            catalog,
            store,
        }
    }

    pub async fn dispatch<H: Host>(&self, action: Action, host: &mut H) -> Result<()> {
        debug!("dispatch {:?}", action);

        match action {
            Action::Root => self.root(host).await,
            Action::Search => self.search(host).await,
            Action::MostPlayed => self.most_played(host),
            Action::RecentlyPlayed => self.recently_played(host),
            Action::Play { id } => self.play(&id, host),
        }
    }

    fn plugin_url(&self, params: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.query_pairs_mut().extend_pairs(params);
        url.to_string()
    }

    fn folder(&self, label: &str, action: &str, icon: &str) -> ListItem {
        ListItem {
            label: label.to_string(),
            path: self.plugin_url(&[("action", action)]),
            icon: icon.to_string(),
            is_folder: true,
            ..Default::default()
        }
    }

    fn track_item(&self, track: &Track) -> ListItem {
        let codec = Codec::classify(&track.codec, &track.file);

        let mut label = build_label(track);
        if codec == Codec::Other && !track.codec.is_empty() && track.codec != "_" {
            label.push(' ');
            label.push_str(&track.codec);
        }

        ListItem {
            label,
            path: self.plugin_url(&[("action", "play"), ("id", &track.id)]),
            icon: codec.icon().to_string(),
            is_folder: false,
            playable: true,
            info: Some(MusicInfo {
                title: track.title.clone(),
                artist: Some(track.artist_name.clone()).filter(|_| track.has_artist()),
                album: Some(track.album_name.clone()).filter(|_| track.has_album()),
                duration: track.duration.filter(|&d| d > 0),
                year: track.year.filter(|&y| y != 0),
            }),
        }
    }

    /// Caches every listed track before rendering it.
    fn listed_items(&self, tracks: &[Track]) -> Result<Vec<ListItem>> {
        let mut items = Vec::with_capacity(tracks.len());

        for track in tracks {
            self.store.get()?.record_metadata(track)?;
            items.push(self.track_item(track));
        }

        Ok(items)
    }

    fn stats_items<F>(&self, entries: &[StatsEntry], suffix: F) -> Vec<ListItem>
    where
        F: Fn(&StatsEntry) -> String,
    {
        entries
            .iter()
            .map(|entry| {
                let mut item = self.track_item(&entry.track);
                item.label = format!("{} ({})", build_label(&entry.track), suffix(entry));
                item
            })
            .collect()
    }

    async fn root<H: Host>(&self, host: &mut H) -> Result<()> {
        let mut directory = Directory::songs("Search");

        let random = self.folder("? Random", "root", "random.png");
        let search = self.folder("= Search…", "search", "DefaultAddonsSearch.png");

        match self.config.menu_order {
            MenuOrder::RandomFirst => directory.items.extend(vec![random, search]),
            MenuOrder::SearchFirst => directory.items.extend(vec![search, random]),
        }

        directory.items.push(self.folder(
            "* Most played",
            "most_played",
            "DefaultMusicRecentlyPlayed.png",
        ));
        directory.items.push(self.folder(
            "+ Recently played",
            "recently_played",
            "DefaultMusicRecentlyAdded.png",
        ));

        match self.catalog.fetch("").await {
            Ok(tracks) => directory.items.extend(self.listed_items(&tracks)?),
            Err(e) => {
                warn!("random sample failed: {}", e);
                host.notify("Random failed", &e.to_string());
            }
        }

        host.show_directory(directory)?;
        Ok(())
    }

    async fn search<H: Host>(&self, host: &mut H) -> Result<()> {
        let query = match host.prompt("Search")? {
            Some(query) => query,
            None => {
                host.show_directory(Directory::new())?;
                return Ok(());
            }
        };

        let tracks = match self.catalog.fetch(&query).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("search '{}' failed: {}", query, e);
                host.notify("Search failed", &e.to_string());
                host.show_directory(Directory::failed())?;
                return Ok(());
            }
        };

        let mut directory = Directory::songs(&format!("Results for: {}", query));
        directory.items = self.listed_items(&tracks)?;

        host.show_directory(directory)?;
        Ok(())
    }

    fn most_played<H: Host>(&self, host: &mut H) -> Result<()> {
        let entries = self.store.get()?.most_played()?;

        let mut directory = Directory::songs("Most played");
        directory.items = self.stats_items(&entries, |e| e.play_count.to_string());

        host.show_directory(directory)?;
        Ok(())
    }

    fn recently_played<H: Host>(&self, host: &mut H) -> Result<()> {
        let entries = self.store.get()?.recently_played()?;

        let mut directory = Directory::songs("Recently played");
        directory.items = self.stats_items(&entries, |e| match e.last_played {
            Some(ts) => played_date(ts),
            None => "?".to_string(),
        });

        host.show_directory(directory)?;
        Ok(())
    }

    fn play<H: Host>(&self, id: &str, host: &mut H) -> Result<()> {
        if id.is_empty() {
            host.notify("Playback failed", "Missing track id");
            return Ok(());
        }

        let track = match self.store.get()?.get_metadata(id)? {
            Some(track) if !track.file.is_empty() => track,
            _ => {
                warn!("no cached metadata for track_id={}", id);
                host.notify("Playback failed", "Missing metadata");
                return Ok(());
            }
        };

        let mut item = self.track_item(&track);
        item.path = playable_url(&self.config, self.catalog.authorization(), &track.file);

        self.store.get()?.record_play(id)?;

        host.resolve(item)?;
        Ok(())
    }
}
