use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::deserialize_id;

#[derive(Debug, Deserialize, Clone)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created: Option<String>,
}

impl Comment {
    /// Parses `created`, accepting RFC 3339 and the `+0000` offset form Jira emits.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::Comment;
    use chrono::{TimeZone, Utc};

    fn comment(created: &str) -> Comment {
        Comment {
            id: "1".to_string(),
            body: String::new(),
            created: Some(created.to_string()),
        }
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        assert_eq!(
            comment("2020-01-01T00:00:00Z").created_at(),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_jira_offset_timestamps() {
        assert_eq!(
            comment("2021-03-04T10:20:30.000+0200").created_at(),
            Some(Utc.with_ymd_and_hms(2021, 3, 4, 8, 20, 30).unwrap())
        );
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(comment("yesterday").created_at().is_none());
    }
}
