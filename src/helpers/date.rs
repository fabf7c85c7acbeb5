//! Date helper functions

use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// The only timestamp shape written to and accepted in `date:` fields
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date prefix of post filenames
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// chrono accepts unpadded fields, so the shape is checked first.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let shape_ok = s.len() == 19
        && s.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            10 => c == ' ',
            13 | 16 => c == ':',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Source of "now" for new records
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Clock {
    /// Wall clock in the local zone
    #[default]
    Local,
    /// Wall clock in a named zone (`timezone:` in the config)
    Zone(Tz),
    /// A frozen instant, for tests and reproducible scripts
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Build from the config's `timezone` value; empty means local time
    pub fn from_timezone(name: &str) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Clock::Local);
        }
        name.parse::<Tz>()
            .map(Clock::Zone)
            .map_err(|e| format!("unknown timezone {:?}: {}", name, e))
    }

    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::Local => Local::now().naive_local(),
            Clock::Zone(tz) => Utc::now().with_timezone(tz).naive_local(),
            Clock::Fixed(dt) => *dt,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS` for the current instant
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.now())
    }

    /// `YYYY-MM-DD` for the current instant
    pub fn today(&self) -> String {
        self.now().format(DAY_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-01-15 10:30:00");
    }

    #[test]
    fn test_parse_timestamp_rejects_other_shapes() {
        assert!(parse_timestamp("2024-01-15").is_none());
        assert!(parse_timestamp("2024-1-15 10:30:00").is_none());
        assert!(parse_timestamp("2024-01-15T10:30:00").is_none());
        assert!(parse_timestamp("2024-02-30 10:30:00").is_none());
        assert!(parse_timestamp("2024-01-15 25:00:00").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = Clock::Fixed(parse_timestamp("2024-01-01 08:00:00").unwrap());
        assert_eq!(clock.today(), "2024-01-01");
        assert_eq!(clock.timestamp(), "2024-01-01 08:00:00");
    }

    #[test]
    fn test_clock_from_timezone() {
        assert_eq!(Clock::from_timezone("").unwrap(), Clock::Local);
        assert_eq!(
            Clock::from_timezone("Asia/Shanghai").unwrap(),
            Clock::Zone(chrono_tz::Asia::Shanghai)
        );
        assert!(Clock::from_timezone("Mars/Olympus").is_err());
    }
}
