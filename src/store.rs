use std::path::PathBuf;
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

use crate::db_meta;
use crate::error::{self, Error};
use crate::query::QueryOptions;
use crate::schema;
use crate::track::Track;

/// Maximum number of rows returned by a statistics listing.
pub const QUERY_LIMIT: i64 = 100;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct StatsEntry {
    pub track: Track,
    pub play_count: i64,
    pub last_played: Option<i64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatsFilter {
    Played,
    HasLastPlayed,
}

impl StatsFilter {
    fn clause(self) -> &'static str {
        match self {
            StatsFilter::Played => "play_count > 0",
            StatsFilter::HasLastPlayed => "last_played IS NOT NULL",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatsOrder {
    MostPlayed,
    RecentlyPlayed,
}

impl StatsOrder {
    fn order_string(self) -> &'static str {
        match self {
            StatsOrder::MostPlayed => "play_count DESC, last_played DESC",
            StatsOrder::RecentlyPlayed => "last_played DESC",
        }
    }
}

/// Knows where the play statistics live. Hands out a fresh connection per
/// operation; nothing is held open between calls.
pub struct StoreSource {
    db_path: PathBuf,
}

pub struct Store {
    conn: Connection,
}

impl StoreSource {
    pub fn create(db_path: PathBuf) -> Result<Option<StoreSource>> {
        info!("using '{}'", db_path.to_string_lossy());

        let source = StoreSource { db_path };

        let mut store = source.open()?;
        if !store.ensure_schema()? {
            return Ok(None);
        }

        Ok(Some(source))
    }

    fn open(&self) -> Result<Store> {
        let conn = match Connection::open(&self.db_path) {
            Ok(c) => c,
            Err(e) => {
                error!(
                    "can't open sqlite database '{}': {}",
                    self.db_path.to_string_lossy(),
                    e
                );
                return Err(e);
            }
        };

        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Store { conn })
    }

    /// Opens a connection with an up-to-date schema.
    pub fn get(&self) -> error::Result<Store> {
        let mut store = self.open()?;
        if !store.ensure_schema()? {
            return Err(Error::IncompatibleDatabase);
        }
        Ok(store)
    }
}

impl Store {
    pub fn ensure_schema(&mut self) -> Result<bool> {
        db_meta::ensure_schema(&mut self.conn, schema::PLAYS_MIGRATIONS)
    }

    /// Caches the display fields of a listed track, creating its row on first sight.
    pub fn record_metadata(&mut self, track: &Track) -> Result<()> {
        if track.id.is_empty() {
            return Ok(());
        }

        trace!("record metadata track_id={}", track.id);

        let tx = self.conn.transaction()?;

        insert_if_absent(&tx, &track.id)?;

        tx.execute(
            "UPDATE plays
            SET file_path = ?, title = ?, artist_name = ?, album_name = ?, duration = ?, year = ?, codec = ?
            WHERE track_id = ?",
            params![
                track.file,
                track.title,
                track.artist_name,
                track.album_name,
                track.duration,
                track.year,
                track.codec,
                track.id,
            ],
        )?;

        tx.commit()
    }

    pub fn record_play(&mut self, track_id: &str) -> Result<()> {
        self.record_play_at(track_id, chrono::Utc::now().timestamp())
    }

    pub fn record_play_at(&mut self, track_id: &str, played_at: i64) -> Result<()> {
        if track_id.is_empty() {
            return Ok(());
        }

        debug!("record play track_id={} at={}", track_id, played_at);

        let tx = self.conn.transaction()?;

        insert_if_absent(&tx, track_id)?;

        tx.execute(
            "UPDATE plays SET play_count = play_count + 1, last_played = ? WHERE track_id = ?",
            params![played_at, track_id],
        )?;

        tx.commit()
    }

    pub fn get_metadata(&mut self, track_id: &str) -> Result<Option<Track>> {
        if track_id.is_empty() {
            return Ok(None);
        }

        trace!("get metadata track_id={}", track_id);

        let tx = self.conn.transaction()?;

        let track = tx
            .query_row(
                "SELECT track_id, file_path, title, artist_name, album_name, duration, year, codec
                FROM plays
                WHERE track_id = ?",
                [track_id],
                |row| Self::_get_track(row),
            )
            .optional()?;

        tx.commit()?;

        Ok(track)
    }

    pub fn query(&mut self, order: StatsOrder, filter: StatsFilter) -> Result<Vec<StatsEntry>> {
        trace!("query stats order={:?} filter={:?}", order, filter);

        let mut opts = QueryOptions::new();
        opts.filter(filter.clause());
        opts.filter("file_path IS NOT NULL");
        opts.filter("file_path <> ''");
        opts.order_string(order.order_string());
        opts.limit(QUERY_LIMIT);

        let tx = self.conn.transaction()?;

        let result = {
            let (mut st, values) = opts.into_items_query(
                &tx,
                "SELECT track_id, file_path, title, artist_name, album_name, duration, year, codec, play_count, last_played
                FROM plays",
            )?;

            let mut rows = st.query(params_from_iter(values.iter()))?;

            let mut result = Vec::new();

            while let Some(row) = rows.next()? {
                result.push(StatsEntry {
                    track: Self::_get_track(row)?,
                    play_count: row.get(8)?,
                    last_played: row.get(9)?,
                });
            }

            result
        };

        tx.commit()?;

        Ok(result)
    }

    pub fn most_played(&mut self) -> Result<Vec<StatsEntry>> {
        self.query(StatsOrder::MostPlayed, StatsFilter::Played)
    }

    pub fn recently_played(&mut self) -> Result<Vec<StatsEntry>> {
        self.query(StatsOrder::RecentlyPlayed, StatsFilter::HasLastPlayed)
    }

    fn _get_track(row: &Row) -> Result<Track> {
        let text = |idx: usize| -> Result<String> {
            Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
        };

        Ok(Track {
            id: row.get(0)?,
            file: text(1)?,
            title: text(2)?,
            artist_name: text(3)?,
            album_name: text(4)?,
            duration: row.get(5)?,
            year: row.get(6)?,
            codec: text(7)?,
        })
    }
}

fn insert_if_absent(conn: &Connection, track_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO plays (track_id, play_count, last_played) VALUES (?, 0, NULL)",
        [track_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source() -> (TempDir, StoreSource) {
        let dir = tempfile::tempdir().unwrap();
        let source = StoreSource::create(dir.path().join("plays.sqlite3"))
            .unwrap()
            .unwrap();
        (dir, source)
    }

    fn track(id: &str, file: &str, title: &str) -> Track {
        Track {
            id: id.to_string(),
            file: file.to_string(),
            title: title.to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            duration: Some(200),
            year: Some(2001),
            codec: "FLAC".to_string(),
        }
    }

    fn count(source: &StoreSource, id: &str) -> (i64, Option<i64>) {
        let store = source.get().unwrap();
        let row = store
            .conn
            .query_row(
                "SELECT play_count, last_played FROM plays WHERE track_id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        row
    }

    #[test]
    fn metadata_then_play_counts_once() {
        let (_dir, source) = source();
        let before = chrono::Utc::now().timestamp();

        source.get().unwrap().record_metadata(&track("1", "/music/a.flac", "A")).unwrap();
        assert_eq!(count(&source, "1"), (0, None));

        source.get().unwrap().record_play("1").unwrap();

        let (play_count, last_played) = count(&source, "1");
        assert_eq!(play_count, 1);
        assert!(last_played.unwrap() >= before);
    }

    #[test]
    fn metadata_refresh_keeps_count() {
        let (_dir, source) = source();

        source.get().unwrap().record_metadata(&track("1", "/music/a.flac", "A")).unwrap();
        source.get().unwrap().record_play_at("1", 50).unwrap();

        let mut refreshed = track("1", "/music/b.mp3", "B");
        refreshed.duration = None;
        refreshed.codec = "MPEG 1 Layer 3".to_string();
        source.get().unwrap().record_metadata(&refreshed).unwrap();

        assert_eq!(count(&source, "1"), (1, Some(50)));
        assert_eq!(source.get().unwrap().get_metadata("1").unwrap(), Some(refreshed));
    }

    #[test]
    fn play_without_metadata_creates_row() {
        let (_dir, source) = source();

        source.get().unwrap().record_play_at("9", 10).unwrap();
        source.get().unwrap().record_play_at("9", 20).unwrap();

        assert_eq!(count(&source, "9"), (2, Some(20)));

        let cached = source.get().unwrap().get_metadata("9").unwrap().unwrap();
        assert_eq!(cached.id, "9");
        assert_eq!(cached.file, "");
        assert_eq!(cached.title, "");
        assert_eq!(cached.duration, None);
    }

    #[test]
    fn empty_ids_are_ignored() {
        let (_dir, source) = source();
        let mut store = source.get().unwrap();

        store.record_metadata(&track("", "/music/a.flac", "A")).unwrap();
        store.record_play("").unwrap();

        assert_eq!(store.get_metadata("").unwrap(), None);
        let rows: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM plays", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn unknown_id_has_no_metadata() {
        let (_dir, source) = source();

        assert_eq!(source.get().unwrap().get_metadata("nope").unwrap(), None);
    }

    #[test]
    fn most_played_orders_by_count_then_recency() {
        let (_dir, source) = source();
        let mut store = source.get().unwrap();

        for id in &["a", "b", "c", "d"] {
            store.record_metadata(&track(id, &format!("/music/{}.flac", id), id)).unwrap();
        }
        store.record_metadata(&track("nofile", "", "x")).unwrap();

        store.record_play_at("a", 10).unwrap();
        store.record_play_at("b", 11).unwrap();
        store.record_play_at("b", 12).unwrap();
        store.record_play_at("c", 30).unwrap();
        store.record_play_at("nofile", 40).unwrap();
        store.record_play_at("nofile", 41).unwrap();
        store.record_play_at("nofile", 42).unwrap();

        let result = store.most_played().unwrap();
        let ids: Vec<&str> = result.iter().map(|e| e.track.id.as_str()).collect();

        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(result[0].play_count, 2);
        assert_eq!(result[0].last_played, Some(12));
        assert!(result.iter().all(|e| !e.track.file.is_empty()));
    }

    #[test]
    fn play_without_listing_is_not_listed() {
        let (_dir, source) = source();
        let mut store = source.get().unwrap();

        store.record_play_at("ghost", 10).unwrap();

        assert!(store.most_played().unwrap().is_empty());
        assert!(store.recently_played().unwrap().is_empty());
    }

    #[test]
    fn recently_played_orders_by_recency() {
        let (_dir, source) = source();
        let mut store = source.get().unwrap();

        for id in &["a", "b", "c"] {
            store.record_metadata(&track(id, &format!("/music/{}.flac", id), id)).unwrap();
        }

        store.record_play_at("a", 30).unwrap();
        store.record_play_at("b", 10).unwrap();
        store.record_play_at("b", 20).unwrap();

        let ids: Vec<String> = store
            .recently_played()
            .unwrap()
            .into_iter()
            .map(|e| e.track.id)
            .collect();

        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn listings_are_capped() {
        let (_dir, source) = source();
        let mut store = source.get().unwrap();

        for i in 0..(QUERY_LIMIT + 5) {
            let id = i.to_string();
            store.record_metadata(&track(&id, "/music/x.flac", "x")).unwrap();
            store.record_play_at(&id, i).unwrap();
        }

        let result = store.recently_played().unwrap();
        assert_eq!(result.len() as i64, QUERY_LIMIT);
        assert_eq!(result[0].last_played, Some(QUERY_LIMIT + 4));
    }

    #[test]
    fn reopening_keeps_data() {
        let (dir, source) = source();
        source.get().unwrap().record_play_at("1", 5).unwrap();
        drop(source);

        let source = StoreSource::create(dir.path().join("plays.sqlite3"))
            .unwrap()
            .unwrap();
        assert_eq!(count(&source, "1"), (1, Some(5)));
    }

    #[test]
    fn newer_schema_is_refused_after_startup() {
        let (dir, source) = source();

        let conn = Connection::open(dir.path().join("plays.sqlite3")).unwrap();
        conn.execute(
            "UPDATE Dstream SET value = ? WHERE key = 'schema'",
            [schema::PLAYS_MIGRATIONS.len() as i64 + 1],
        )
        .unwrap();

        assert!(matches!(source.get(), Err(Error::IncompatibleDatabase)));
    }
}
