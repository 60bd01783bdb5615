use std::io::Write;

use chrono::prelude::*;
use log::{Level, LevelFilter, Metadata, Record};

const CRATE_TARGET: &str = "dstream";

pub struct Logger;

static LOGGER: Logger = Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(CRATE_TARGET)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_record(Local::now(), record.level(), record.target(), record.args());

        let stderr = std::io::stderr();
        let _ = writeln!(stderr.lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_record<Tz>(
    now: DateTime<Tz>,
    level: Level,
    target: &str,
    args: &std::fmt::Arguments,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut target = target;

    if target.starts_with("dstream::") {
        target = &target[CRATE_TARGET.len() + 2..];
    }

    format!(
        "{} {:<5} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level,
        target,
        args
    )
}

pub fn parse_level(value: &str) -> LevelFilter {
    value.parse().unwrap_or(LevelFilter::Info)
}

pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_crate_prefix() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        assert_eq!(
            format_record(now, Level::Info, "dstream::store", &format_args!("using '{}'", "x")),
            "2024-03-01 12:30:00.000 INFO  [store] using 'x'"
        );
        assert_eq!(
            format_record(now, Level::Warn, "dstream", &format_args!("hi")),
            "2024-03-01 12:30:00.000 WARN  [dstream] hi"
        );
    }

    #[test]
    fn filters_foreign_targets() {
        use log::Log;

        let ours = Metadata::builder().target("dstream::router").level(Level::Info).build();
        let theirs = Metadata::builder().target("hyper::proto").level(Level::Info).build();

        assert!(Logger.enabled(&ours));
        assert!(!Logger.enabled(&theirs));
    }

    #[test]
    fn parses_levels() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("TRACE"), LevelFilter::Trace);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }
}
