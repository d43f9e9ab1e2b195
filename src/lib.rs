//! Build-side publisher: reads settings and test results, then drives the
//! test-management service.

use anyhow::Context;
use chrono::{Duration, Utc};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use tm_api::{TestIssue, TestManagementService};

pub mod cli;
pub mod settings;

use cli::{Cli, Command};
use settings::{Settings, SettingsManager};

/// Results file content: one issue or a list of issues.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultsFile {
    Many(Vec<TestIssue>),
    One(TestIssue),
}

impl ResultsFile {
    fn into_issues(self) -> Vec<TestIssue> {
        match self {
            ResultsFile::Many(issues) => issues,
            ResultsFile::One(issue) => vec![issue],
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let manager = match path {
        Some(path) => SettingsManager::at(path),
        None => SettingsManager::new()?,
    };
    info!("Loading settings from {}", manager.path().display());
    Ok(manager.load().with_env_overrides())
}

pub fn read_results(path: &Path) -> anyhow::Result<Vec<TestIssue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read results file {}", path.display()))?;
    let parsed: ResultsFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid results file {}", path.display()))?;
    Ok(parsed.into_issues())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let service = TestManagementService::new(settings.to_config()?)?;

    match cli.command {
        Command::Check => {
            let outcome = service.check_connection().await;
            println!("{}", outcome.status_code());
            if !outcome.is_authorized() {
                anyhow::bail!("connection check failed: {:?}", outcome);
            }
            Ok(())
        }
        Command::Publish { results, strict } => {
            let issues = read_results(&results)?;
            info!("Publishing {} test result(s)", issues.len());
            let mut incomplete = 0usize;
            for issue in &issues {
                let report = service.post_test_results(issue).await?;
                let uploaded_all = report.links.len() == issue.attachments.len();
                if !(report.status_updated && report.comment_posted && uploaded_all) {
                    warn!("Issue {} was not fully published: {:?}", issue.issue_key, report);
                    incomplete += 1;
                }
            }
            if strict && incomplete > 0 {
                anyhow::bail!("{} of {} issue(s) were not fully published", incomplete, issues.len());
            }
            Ok(())
        }
        Command::Label { action, issue, label } => {
            service.manage_label(&issue, &label, action).await?;
            Ok(())
        }
        Command::Comments { issue } => {
            match service.get_comments(&issue).await? {
                Some(comments) => {
                    for comment in comments {
                        println!(
                            "{}\t{}",
                            comment.id,
                            comment.created.as_deref().unwrap_or("-")
                        );
                    }
                }
                None => warn!("Issue {} returned no comments field", issue),
            }
            Ok(())
        }
        Command::Expire { issue, days } => {
            let days = days.unwrap_or(settings.retention_days);
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            info!("Removing comments on {} created before {}", issue, cutoff.to_rfc3339());
            let report = service.remove_expired_comments(&issue, cutoff).await?;
            if !report.is_clean() {
                warn!(
                    "Sweep left {} comment(s) and {} attachment(s) behind",
                    report.failed_comments.len(),
                    report.failed_attachments.len()
                );
            }
            Ok(())
        }
    }
}
