//! Typed Jira test-management client crate used by the build publisher.

pub mod auth;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod formatter;
pub mod models;
pub mod service;
pub mod sweep;

pub use client::{Connectivity, TmClient};
pub use config::{ApiNamespace, DeletionFailurePolicy, TmConfig};
pub use console::{BuildConsole, SharedBuffer};
pub use error::{Result, TmError};
pub use formatter::{CommentFormatter, WikiFormatter, COMMENT_TITLE};
pub use models::{Attachment, AttachmentLinks, Comment, LabelAction, TestCase, TestIssue};
pub use service::{PublishReport, TestManagementService};
pub use sweep::SweepReport;
