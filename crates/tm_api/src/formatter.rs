//! Comment body formatting for published test results.
//!
//! Every body starts with the marker title; the expiry sweep relies on it to
//! recognize comments this tool posted.

use std::path::Path;

use crate::models::{AttachmentLinks, TestIssue};

pub const COMMENT_TITLE: &str = "Automated test execution results";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Turns one test result into comment text.
pub trait CommentFormatter: Send + Sync {
    /// Marker title contained in every formatted body.
    fn title(&self) -> &str;

    fn format(
        &self,
        issue: &TestIssue,
        links: Option<&AttachmentLinks>,
        build_number: u64,
        remote_status: Option<&str>,
    ) -> String;
}

/// Jira wiki-markup formatter.
#[derive(Debug, Default, Clone, Copy)]
pub struct WikiFormatter;

impl CommentFormatter for WikiFormatter {
    fn title(&self) -> &str {
        COMMENT_TITLE
    }

    fn format(
        &self,
        issue: &TestIssue,
        links: Option<&AttachmentLinks>,
        build_number: u64,
        remote_status: Option<&str>,
    ) -> String {
        let mut lines = vec![
            format!("h3. {}", COMMENT_TITLE),
            format!("*Build:* #{}", build_number),
            format!("*Status:* {}", remote_status.unwrap_or(issue.status.as_str())),
        ];

        if let Some(summary) = issue.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            lines.push(format!("*Summary:* {}", summary.trim()));
        }

        if let Some(comment) = issue.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            lines.push(format!("{{noformat}}{}{{noformat}}", comment.trim_end()));
        }

        if !issue.attachments.is_empty() {
            lines.push("*Attachments:*".to_string());
            for path in &issue.attachments {
                let link = links.and_then(|map| map.get(path));
                lines.push(attachment_line(path, link.map(String::as_str)));
            }
        }

        lines.join("\n")
    }
}

fn attachment_line(path: &str, link: Option<&str>) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    match link {
        Some(link) if is_image(&name) => format!("* !{}|thumbnail!", link),
        Some(link) => format!("* [{}|{}]", name, link),
        None => format!("* {} (not uploaded)", name),
    }
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
