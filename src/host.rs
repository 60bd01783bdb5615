use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicInfo {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<i64>,
    pub year: Option<i64>,
}

/// One entry in a listing, or the resolved entry handed to the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub label: String,
    /// Plugin URL the entry navigates to, or the stream URL once resolved.
    pub path: String,
    pub icon: String,
    pub is_folder: bool,
    pub playable: bool,
    pub info: Option<MusicInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub category: Option<String>,
    pub content: Option<&'static str>,
    pub items: Vec<ListItem>,
    pub succeeded: bool,
}

impl Directory {
    pub fn new() -> Directory {
        Directory {
            category: None,
            content: None,
            items: Vec::new(),
            succeeded: true,
        }
    }

    pub fn songs(category: &str) -> Directory {
        Directory {
            category: Some(category.to_string()),
            content: Some("songs"),
            ..Directory::new()
        }
    }

    pub fn failed() -> Directory {
        Directory {
            succeeded: false,
            ..Directory::new()
        }
    }
}

fn format_duration(seconds: i64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// What the router needs from whatever displays listings and plays streams.
pub trait Host {
    /// Asks the user for text. `None` when cancelled.
    fn prompt(&mut self, heading: &str) -> io::Result<Option<String>>;

    fn notify(&mut self, heading: &str, message: &str);

    fn show_directory(&mut self, directory: Directory) -> io::Result<()>;

    fn resolve(&mut self, item: ListItem) -> io::Result<()>;
}

/// Plain-text host: listings go to `output`, prompts read lines from `input`.
pub struct ConsoleHost<R, W> {
    input: R,
    output: W,
}

impl ConsoleHost<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        ConsoleHost::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleHost<R, W> {
    pub fn new(input: R, output: W) -> ConsoleHost<R, W> {
        ConsoleHost { input, output }
    }
}

impl<R: BufRead, W: Write> Host for ConsoleHost<R, W> {
    fn prompt(&mut self, heading: &str) -> io::Result<Option<String>> {
        eprint!("{}: ", heading);
        io::stderr().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let line = line.trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line.to_string()))
        }
    }

    fn notify(&mut self, heading: &str, message: &str) {
        warn!("{}: {}", heading, message);
    }

    fn show_directory(&mut self, directory: Directory) -> io::Result<()> {
        if !directory.succeeded {
            warn!("listing failed");
        }

        match (&directory.category, directory.content) {
            (Some(category), Some(content)) => {
                writeln!(self.output, "# {} [{}]", category, content)?
            }
            (Some(category), None) => writeln!(self.output, "# {}", category)?,
            _ => {}
        }

        for item in &directory.items {
            trace!("{} icon={} playable={}", item.label, item.icon, item.playable);

            let marker = if item.is_folder { "/" } else { "" };
            write!(self.output, "{}{}\t{}", item.label, marker, item.path)?;

            if let Some(info) = &item.info {
                write!(
                    self.output,
                    "\t{}\t{}\t{}\t{}\t{}",
                    info.title,
                    info.artist.as_deref().unwrap_or(""),
                    info.album.as_deref().unwrap_or(""),
                    info.duration.map(format_duration).unwrap_or_default(),
                    info.year.map(|y| y.to_string()).unwrap_or_default(),
                )?;
            }

            writeln!(self.output)?;
        }

        self.output.flush()
    }

    fn resolve(&mut self, item: ListItem) -> io::Result<()> {
        info!("playing '{}'", item.label);
        writeln!(self.output, "{}", item.path)?;
        self.output.flush()
    }
}
