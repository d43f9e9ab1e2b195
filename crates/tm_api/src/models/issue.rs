use serde::{Deserialize, Serialize};

/// Test execution result of one issue, as handed over by the build.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestIssue {
    pub issue_key: String,
    pub status: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Paths relative to the build workspace.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl TestIssue {
    pub fn new(issue_key: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            issue_key: issue_key.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_attachment(mut self, path: impl Into<String>) -> Self {
        self.attachments.push(path.into());
        self
    }
}
