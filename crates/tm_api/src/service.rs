//! Test-management operations: status updates, labels, attachments, result
//! comments and the expiry sweep.
//!
//! Every operation interprets the HTTP status code of its response, writes one
//! console line describing the outcome and returns a typed result. Transport
//! failures are returned as-is; rejections come back as `TmError::Rejected`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{Connectivity, TmClient};
use crate::config::{ApiNamespace, DeletionFailurePolicy, TmConfig};
use crate::console::BuildConsole;
use crate::error::{Result, TmError};
use crate::formatter::{CommentFormatter, WikiFormatter};
use crate::models::{Attachment, AttachmentLinks, Comment, LabelAction, TestCase, TestIssue};
use crate::sweep::{self, SweepReport};

/// What `post_test_results` achieved for one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub status_updated: bool,
    pub links: AttachmentLinks,
    pub remote_status: Option<String>,
    pub comment_posted: bool,
}

pub struct TestManagementService {
    client: TmClient,
    console: BuildConsole,
    formatter: Box<dyn CommentFormatter>,
}

impl TestManagementService {
    pub fn new(config: TmConfig) -> Result<Self> {
        Ok(Self {
            client: TmClient::new(config)?,
            console: BuildConsole::stdout(),
            formatter: Box::new(WikiFormatter),
        })
    }

    pub fn with_console(mut self, console: BuildConsole) -> Self {
        self.console = console;
        self
    }

    pub fn with_formatter(mut self, formatter: impl CommentFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn client(&self) -> &TmClient {
        &self.client
    }

    pub fn config(&self) -> &TmConfig {
        self.client.config()
    }

    pub async fn check_connection(&self) -> Connectivity {
        self.client.probe().await
    }

    pub async fn update_test_status(&self, issue_key: &str, status: &str) -> Result<()> {
        let path = format!("testcase/{}", issue_key);
        let payload = StatusUpdateRequest { status };
        let response = self
            .client
            .send_with_body(Method::PUT, ApiNamespace::TestManagement, &path, Some(&payload))
            .await?;

        let code = response.status();
        if code == StatusCode::NO_CONTENT {
            self.console
                .println(format!("Issue {} status updated: {}", issue_key, status));
            Ok(())
        } else {
            self.console.println(format!(
                "Cannot update Test Case status. Response code: {}. Check if issue key is valid",
                code.as_u16()
            ));
            Err(TmClient::rejection("update test status", response).await)
        }
    }

    /// Current status of the test case; `None` when the body cannot be decoded.
    pub async fn test_status(&self, issue_key: &str) -> Result<Option<String>> {
        let path = format!("testcase/{}", issue_key);
        let response = self
            .client
            .send(Method::GET, ApiNamespace::TestManagement, &path)
            .await?;
        if !response.status().is_success() {
            return Err(TmClient::rejection("fetch test status", response).await);
        }

        match TmClient::read_json::<TestCase>(response).await {
            Ok(test_case) => Ok(test_case.status),
            Err(TmError::Serialization(message)) => {
                tracing::warn!(issue_key, %message, "test case body is not valid JSON");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn manage_label(&self, issue_key: &str, label: &str, action: LabelAction) -> Result<()> {
        let path = format!("issue/{}", issue_key);
        let payload = IssueUpdateRequest::label(action, label);
        let response = self
            .client
            .send_with_body(Method::PUT, ApiNamespace::Platform, &path, Some(&payload))
            .await?;

        let code = response.status();
        if code == StatusCode::NO_CONTENT {
            self.console.println(format!(
                "Successfully {} label \"{}\" {} issue {}",
                action.past_tense(),
                label,
                action.preposition(),
                issue_key
            ));
            Ok(())
        } else {
            let err = TmClient::rejection("manage label", response).await;
            let reason = match &err {
                TmError::Rejected { reason, .. } => reason.clone(),
                other => other.to_string(),
            };
            self.console.println(format!(
                "Cannot {} label \"{}\" {} issue {}. Response code: {}. Reason: {}",
                action,
                label,
                action.preposition(),
                issue_key,
                code.as_u16(),
                reason
            ));
            Err(err)
        }
    }

    /// Uploads every declared attachment; returns `None` when the issue declares none.
    ///
    /// Files are uploaded one request at a time. A rejected or unreadable file is
    /// reported and skipped; the remaining files are still uploaded.
    pub async fn attach(&self, issue: &TestIssue) -> Result<Option<AttachmentLinks>> {
        if issue.attachments.is_empty() {
            return Ok(None);
        }

        let mut links = AttachmentLinks::new();
        for path in &issue.attachments {
            if let Some(link) = self.upload_attachment(&issue.issue_key, path).await? {
                links.insert(path.clone(), link);
            }
        }
        Ok(Some(links))
    }

    async fn upload_attachment(&self, issue_key: &str, path: &str) -> Result<Option<String>> {
        let file = self.resolve_in_workspace(path);
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let (handle, length) = match open_attachment(&file).await {
            Ok(opened) => opened,
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "cannot read attachment");
                self.console.println(format!(
                    "Cannot read file: \"{}\". {}",
                    file.display(),
                    err
                ));
                return Ok(None);
            }
        };

        let mime = mime_guess::from_path(&file).first_or_octet_stream();
        let part = Part::stream_with_length(handle, length)
            .file_name(file_name.clone())
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("file", part);

        let path = format!("issue/{}/attachments", issue_key);
        let response = self
            .client
            .send_multipart(ApiNamespace::Platform, &path, form)
            .await?;

        match response.status() {
            StatusCode::OK => {
                self.console.println(format!(
                    "File: \"{}\" has been attached successfully.",
                    file_name
                ));
                let attachments = match TmClient::read_json::<Vec<Attachment>>(response).await {
                    Ok(attachments) => attachments,
                    Err(TmError::Serialization(message)) => {
                        tracing::warn!(%message, "attachment upload response is not valid JSON");
                        return Ok(None);
                    }
                    Err(err) => return Err(err),
                };
                Ok(attachments
                    .first()
                    .map(|attachment| self.config().attachment_link(&attachment.id, &attachment.filename)))
            }
            StatusCode::PAYLOAD_TOO_LARGE => {
                self.console
                    .println(format!("File: \"{}\" is too big.", file_name));
                Ok(None)
            }
            StatusCode::FORBIDDEN => {
                self.console.println(
                    "Attachments are disabled or you don't have permission to add attachments to this issue.",
                );
                Ok(None)
            }
            code => {
                self.console.println(format!(
                    "Cannot attach file: \"{}\". Status code: {}",
                    file_name,
                    code.as_u16()
                ));
                Ok(None)
            }
        }
    }

    fn resolve_in_workspace(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches(['/', '\\']);
        self.config().workspace.join(relative)
    }

    pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<()> {
        let path = format!("issue/{}/comment", issue_key);
        let payload = CommentCreateRequest { body };
        let response = self
            .client
            .send_with_body(Method::POST, ApiNamespace::Platform, &path, Some(&payload))
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                self.console.println(format!(
                    "Test execution results for issue {} were successfully attached as comment.\nIssue link: {}",
                    issue_key,
                    self.config().issue_link(issue_key)
                ));
                Ok(())
            }
            StatusCode::BAD_REQUEST => {
                self.console.println(
                    "Cannot attach test results: input is invalid (e.g. missing required fields, invalid values, and so forth)",
                );
                Err(TmClient::rejection("post comment", response).await)
            }
            code => {
                self.console.println(format!(
                    "Cannot attach test results. Status code: {}",
                    code.as_u16()
                ));
                Err(TmClient::rejection("post comment", response).await)
            }
        }
    }

    /// Publishes one test result: status, attachments, then the formatted comment.
    ///
    /// Steps are not transactional. A rejected step is reported and the workflow
    /// continues; only transport failures abort it.
    pub async fn post_test_results(&self, issue: &TestIssue) -> Result<PublishReport> {
        let key = issue.issue_key.as_str();

        let status_updated = tolerate(self.update_test_status(key, &issue.status).await)?.is_some();
        let links = self.attach(issue).await?;
        let remote_status = tolerate(self.test_status(key).await)?.flatten();

        let body = self.formatter.format(
            issue,
            links.as_ref(),
            self.config().build_number,
            remote_status.as_deref(),
        );
        let comment_posted = tolerate(self.add_comment(key, &body).await)?.is_some();

        Ok(PublishReport {
            status_updated,
            links: links.unwrap_or_default(),
            remote_status,
            comment_posted,
        })
    }

    /// Comments of an issue; `None` when the response has no `comments` array.
    pub async fn get_comments(&self, issue_key: &str) -> Result<Option<Vec<Comment>>> {
        let path = format!("issue/{}/comment", issue_key);
        let response = self
            .client
            .send(Method::GET, ApiNamespace::Platform, &path)
            .await?;
        if !response.status().is_success() {
            return Err(TmClient::rejection("list comments", response).await);
        }
        let page: CommentPage = TmClient::read_json(response).await?;
        Ok(page.comments)
    }

    pub async fn remove_comment(&self, issue_key: &str, comment_id: &str) -> Result<bool> {
        self.remove_resource(&format!("issue/{}/comment/{}", issue_key, comment_id))
            .await
    }

    pub async fn remove_attachment(&self, attachment_id: &str) -> Result<bool> {
        self.remove_resource(&format!("attachment/{}", attachment_id))
            .await
    }

    async fn remove_resource(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .send(Method::DELETE, ApiNamespace::Platform, path)
            .await?;
        Ok(response.status() == StatusCode::NO_CONTENT)
    }

    /// Deletes this tool's comments created before `expiration`, together with
    /// the attachments they link.
    pub async fn remove_expired_comments(
        &self,
        issue_key: &str,
        expiration: DateTime<Utc>,
    ) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let Some(comments) = self.get_comments(issue_key).await? else {
            tracing::debug!(issue_key, "no comments field in response, nothing to sweep");
            return Ok(report);
        };

        let title = self.formatter.title().to_string();
        for comment in comments
            .iter()
            .filter(|comment| sweep::is_expired(comment, &title, expiration))
        {
            for attachment_id in sweep::attachment_ids(&comment.body) {
                if self.remove_attachment(&attachment_id).await? {
                    self.console.println(format!(
                        "Attachment with id = {} was successfully removed.",
                        attachment_id
                    ));
                    report.removed_attachments.push(attachment_id);
                } else {
                    self.deletion_failed(format!(
                        "Cannot remove attachment with id = {}.",
                        attachment_id
                    ));
                    report.failed_attachments.push(attachment_id);
                }
            }

            if self.remove_comment(issue_key, &comment.id).await? {
                self.console.println(format!(
                    "Comment with id = {} was successfully removed.",
                    comment.id
                ));
                report.removed_comments.push(comment.id.clone());
            } else {
                self.deletion_failed(format!("Cannot remove comment with id = {}.", comment.id));
                report.failed_comments.push(comment.id.clone());
            }
        }

        Ok(report)
    }

    fn deletion_failed(&self, line: String) {
        match self.config().deletion_policy {
            DeletionFailurePolicy::Silent => tracing::debug!("{}", line),
            DeletionFailurePolicy::Log => self.console.println(line),
        }
    }
}

async fn open_attachment(file: &Path) -> std::io::Result<(tokio::fs::File, u64)> {
    let handle = tokio::fs::File::open(file).await?;
    let length = handle.metadata().await?.len();
    Ok((handle, length))
}

/// Keeps transport failures fatal and turns rejections into `None`.
fn tolerate<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_transport() => Err(err),
        Err(err) => {
            tracing::warn!(error = %err, "step failed, continuing");
            Ok(None)
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusUpdateRequest<'a> {
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentCreateRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct IssueUpdateRequest<'a> {
    update: LabelsUpdate<'a>,
}

impl<'a> IssueUpdateRequest<'a> {
    fn label(action: LabelAction, label: &'a str) -> Self {
        let operation = match action {
            LabelAction::Add => LabelOperation::Add(label),
            LabelAction::Remove => LabelOperation::Remove(label),
        };
        Self {
            update: LabelsUpdate {
                labels: vec![operation],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct LabelsUpdate<'a> {
    labels: Vec<LabelOperation<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum LabelOperation<'a> {
    Add(&'a str),
    Remove(&'a str),
}

#[derive(Debug, Deserialize)]
struct CommentPage {
    #[serde(default)]
    comments: Option<Vec<Comment>>,
}
