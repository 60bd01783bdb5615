pub const META_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Dstream (
    key TEXT PRIMARY KEY,
    value);
";

#[derive(Debug, Clone, Copy)]
pub enum Migration {
    Execute(&'static str),
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// Applied in order. The schema version is the number of applied entries, so
/// entries are only ever appended.
pub const PLAYS_MIGRATIONS: &[Migration] = &[
    Migration::Execute(
        "
CREATE TABLE IF NOT EXISTS plays (
    track_id TEXT PRIMARY KEY,
    play_count INTEGER NOT NULL DEFAULT 0,
    last_played INTEGER);
",
    ),
    Migration::AddColumn {
        table: "plays",
        column: "file_path",
        definition: "TEXT",
    },
    Migration::AddColumn {
        table: "plays",
        column: "title",
        definition: "TEXT",
    },
    Migration::AddColumn {
        table: "plays",
        column: "artist_name",
        definition: "TEXT",
    },
    Migration::AddColumn {
        table: "plays",
        column: "album_name",
        definition: "TEXT",
    },
    Migration::AddColumn {
        table: "plays",
        column: "duration",
        definition: "INTEGER",
    },
    Migration::AddColumn {
        table: "plays",
        column: "year",
        definition: "INTEGER",
    },
    Migration::AddColumn {
        table: "plays",
        column: "codec",
        definition: "TEXT",
    },
];
