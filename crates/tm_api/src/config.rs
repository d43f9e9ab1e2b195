use std::path::PathBuf;
use std::time::Duration;

pub const TM_API_PATH: &str = "rest/tm/1.0/";
pub const PLATFORM_API_PATH: &str = "rest/api/2/";
pub const DEFAULT_USER_AGENT: &str = "tm-publisher";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BUILD_NUMBER: u64 = 1;

/// REST surface a request is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiNamespace {
    TestManagement,
    Platform,
}

impl ApiNamespace {
    pub fn relative_path(&self) -> &'static str {
        match self {
            ApiNamespace::TestManagement => TM_API_PATH,
            ApiNamespace::Platform => PLATFORM_API_PATH,
        }
    }
}

/// What the expiry sweep does when a delete call is not answered with 204.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletionFailurePolicy {
    #[default]
    Silent,
    Log,
}

#[derive(Clone, Debug)]
pub struct TmConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub workspace: PathBuf,
    pub build_number: u64,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub deletion_policy: DeletionFailurePolicy,
}

impl TmConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            username: username.into(),
            password: password.into(),
            workspace: std::env::current_dir().unwrap_or_default(),
            build_number: DEFAULT_BUILD_NUMBER,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            deletion_policy: DeletionFailurePolicy::default(),
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_build_number(mut self, build_number: u64) -> Self {
        self.build_number = build_number;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    pub fn with_deletion_policy(mut self, policy: DeletionFailurePolicy) -> Self {
        self.deletion_policy = policy;
        self
    }

    /// Base URL joined with the namespace prefix, always ending with `/`.
    pub fn api_root(&self, namespace: ApiNamespace) -> String {
        format!("{}{}", self.base_url, namespace.relative_path())
    }

    /// Browsable link of an uploaded attachment.
    pub fn attachment_link(&self, id: &str, filename: &str) -> String {
        format!("{}secure/attachment/{}/{}", self.base_url, id, filename)
    }

    /// Browsable link of an issue as printed after a successful publish.
    pub fn issue_link(&self, issue_key: &str) -> String {
        format!("{}issue/{}", self.api_root(ApiNamespace::Platform), issue_key)
    }
}

fn normalize_base_url(base_url: String) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}
