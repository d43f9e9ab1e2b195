//! Selection logic of the expiry sweep: which comments are stale and which
//! attachments they reference.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Comment;

static ATTACHMENT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"secure/attachment/(\d+)/").expect("invalid attachment id regex"));

/// Numeric attachment ids linked from a comment body, in order of appearance.
pub fn attachment_ids(body: &str) -> Vec<String> {
    ATTACHMENT_ID_REGEX
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|id| id.as_str().to_string()))
        .collect()
}

/// True when the comment carries the marker title and was created before the cutoff.
pub fn is_expired(comment: &Comment, title: &str, expiration: DateTime<Utc>) -> bool {
    if !comment.body.contains(title) {
        return false;
    }
    comment
        .created_at()
        .map(|created| created < expiration)
        .unwrap_or(false)
}

/// Outcome of one expiry sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed_comments: Vec<String>,
    pub removed_attachments: Vec<String>,
    pub failed_comments: Vec<String>,
    pub failed_attachments: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed_comments.is_empty() && self.failed_attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{attachment_ids, is_expired};
    use crate::models::Comment;
    use chrono::{TimeZone, Utc};

    const TITLE: &str = "Automated test execution results";

    fn comment(body: &str, created: &str) -> Comment {
        Comment {
            id: "7".to_string(),
            body: body.to_string(),
            created: Some(created.to_string()),
        }
    }

    #[test]
    fn extracts_ids_between_attachment_segment_and_slash() {
        let body = "... secure/attachment/42/foo.png ... secure/attachment/43/bar.png ...";
        assert_eq!(attachment_ids(body), vec!["42", "43"]);
    }

    #[test]
    fn ignores_ids_without_trailing_slash_or_digits() {
        let body = "secure/attachment/44 secure/attachment/abc/x.png secure/attachment//y.png";
        assert!(attachment_ids(body).is_empty());
    }

    #[test]
    fn expiry_requires_title_and_earlier_creation() {
        let cutoff = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let body = format!("h3. {}", TITLE);

        assert!(is_expired(&comment(&body, "2020-06-01T00:00:00Z"), TITLE, cutoff));
        assert!(!is_expired(&comment(&body, "2021-06-01T00:00:00Z"), TITLE, cutoff));
        assert!(!is_expired(&comment("manual note", "2020-06-01T00:00:00Z"), TITLE, cutoff));
        assert!(!is_expired(&comment(&body, "not a date"), TITLE, cutoff));
    }
}
