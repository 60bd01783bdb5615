use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A track as listed by the catalog service, or as cached in the play store.
///
/// The catalog is loose about types: ids may arrive as numbers, durations and
/// years as strings. Every field tolerates being absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Track {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "artistName", default, deserialize_with = "lenient_string")]
    pub artist_name: String,
    #[serde(rename = "albumName", default, deserialize_with = "lenient_string")]
    pub album_name: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub codec: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(to_int(&Value::deserialize(deserializer)?))
}

/// Coerces a JSON value to an integer, treating anything non-numeric as absent.
pub fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

impl Track {
    /// Last path component of the file, used when the tags are useless.
    pub fn file_name(&self) -> &str {
        match self.file.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.file,
        }
    }

    pub fn has_artist(&self) -> bool {
        !self.artist_name.is_empty() && self.artist_name != "-"
    }

    pub fn has_album(&self) -> bool {
        !self.album_name.is_empty() && self.album_name != "-"
    }
}

/// Display label: "Artist – Title", or the file name for untagged tracks.
pub fn build_label(track: &Track) -> String {
    let title = track.title.as_str();

    if title.is_empty() || title == "Untitled" || track.artist_name == "-" {
        track.file_name().to_string()
    } else if track.artist_name.is_empty() {
        title.to_string()
    } else {
        format!("{} – {}", track.artist_name, title)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Codec {
    Flac,
    Mp3,
    Vorbis,
    Wav,
    Wma,
    Other,
}

impl Codec {
    /// Classifies a track from the catalog's codec label and its file name.
    ///
    /// A "Windows Media" label always wins. A known label comes next. The file
    /// extension is only consulted when the label is empty or the `_` sentinel.
    pub fn classify(label: &str, file: &str) -> Codec {
        if label.starts_with("Windows Media") {
            return Codec::Wma;
        }

        match label.trim().to_lowercase().as_str() {
            "flac" => Codec::Flac,
            "mpeg 1 layer 3" | "mp3" => Codec::Mp3,
            "vorbis" => Codec::Vorbis,
            "wav" => Codec::Wav,
            "wma" => Codec::Wma,
            "" | "_" => Self::from_extension(file),
            _ => Codec::Other,
        }
    }

    fn from_extension(file: &str) -> Codec {
        let ext = Path::new(file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("flac") => Codec::Flac,
            Some("mp3") => Codec::Mp3,
            Some("ogg") => Codec::Vorbis,
            Some("wav") => Codec::Wav,
            Some("wma") => Codec::Wma,
            _ => Codec::Other,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Codec::Flac => "flac.png",
            Codec::Mp3 => "mp3.png",
            Codec::Vorbis => "vorbis.png",
            Codec::Wav => "wav.png",
            Codec::Wma => "wma.png",
            Codec::Other => "audio.png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str, file: &str) -> Track {
        Track {
            title: title.to_string(),
            artist_name: artist.to_string(),
            file: file.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn label_falls_back_to_file_name_for_untitled() {
        assert_eq!(build_label(&track("Untitled", "", "/music/a/b.mp3")), "b.mp3");
    }

    #[test]
    fn label_joins_artist_and_title() {
        assert_eq!(build_label(&track("Song", "Artist", "/x")), "Artist – Song");
    }

    #[test]
    fn label_falls_back_to_file_name_for_dash_artist() {
        assert_eq!(build_label(&track("", "-", "/x/y.flac")), "y.flac");
        assert_eq!(build_label(&track("Song", "-", "/x/y.flac")), "y.flac");
    }

    #[test]
    fn label_without_artist_is_title() {
        assert_eq!(build_label(&track("Song", "", "/x/y.flac")), "Song");
    }

    #[test]
    fn decodes_loose_catalog_json() {
        let tracks: Vec<Track> = serde_json::from_str(
            r#"[
                {"id": 42, "file": "/music/a.flac", "title": "A", "artistName": "B",
                 "albumName": "C", "duration": "245", "year": 1999.0, "codec": "FLAC"},
                {"id": "x7", "file": "/music/b.mp3", "duration": "n/a", "year": null},
                {}
            ]"#,
        )
        .unwrap();

        assert_eq!(tracks[0].id, "42");
        assert_eq!(tracks[0].artist_name, "B");
        assert_eq!(tracks[0].album_name, "C");
        assert_eq!(tracks[0].duration, Some(245));
        assert_eq!(tracks[0].year, Some(1999));

        assert_eq!(tracks[1].id, "x7");
        assert_eq!(tracks[1].title, "");
        assert_eq!(tracks[1].duration, None);
        assert_eq!(tracks[1].year, None);

        assert_eq!(tracks[2], Track::default());
    }

    #[test]
    fn classifies_known_labels() {
        assert_eq!(Codec::classify("FLAC", "/a.mp3"), Codec::Flac);
        assert_eq!(Codec::classify("MPEG 1 Layer 3", "/a"), Codec::Mp3);
        assert_eq!(Codec::classify("Vorbis", "/a"), Codec::Vorbis);
        assert_eq!(Codec::classify("Windows Media Audio 9", "/a.flac"), Codec::Wma);
    }

    #[test]
    fn classifies_unknown_label_by_extension() {
        assert_eq!(Codec::classify("_", "/music/a.FLAC"), Codec::Flac);
        assert_eq!(Codec::classify("_", "/music/a.mp3"), Codec::Mp3);
        assert_eq!(Codec::classify("_", "/music/a.ogg"), Codec::Vorbis);
        assert_eq!(Codec::classify("", "/music/a.wav"), Codec::Wav);
        assert_eq!(Codec::classify("_", "/music/a.aiff"), Codec::Other);
        assert_eq!(Codec::classify("AAC", "/music/a.mp3"), Codec::Other);
    }

    #[test]
    fn icons() {
        assert_eq!(Codec::Mp3.icon(), "mp3.png");
        assert_eq!(Codec::Other.icon(), "audio.png");
    }
}
