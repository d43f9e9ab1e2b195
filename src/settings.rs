//! Publisher settings model and file-backed manager.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tm_api::{DeletionFailurePolicy, TmConfig};

/// Default number of days a published comment is kept before the sweep removes it.
fn default_retention_days() -> u32 {
    30
}

fn default_build_number() -> u64 {
    1
}

/// Mirrors `DeletionFailurePolicy` for the settings file.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeletionFailures {
    #[default]
    Silent,
    Log,
}

impl From<DeletionFailures> for DeletionFailurePolicy {
    fn from(value: DeletionFailures) -> Self {
        match value {
            DeletionFailures::Silent => DeletionFailurePolicy::Silent,
            DeletionFailures::Log => DeletionFailurePolicy::Log,
        }
    }
}

/// Represents the publisher configuration, including server location, credentials, workspace root and sweep settings.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub workspace: Option<PathBuf>,
    #[serde(default = "default_build_number")]
    pub build_number: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    pub deletion_failures: DeletionFailures,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            workspace: None,
            build_number: default_build_number(),
            retention_days: default_retention_days(),
            deletion_failures: DeletionFailures::default(),
        }
    }
}

impl Settings {
    /// Applies `TM_URL`, `TM_USERNAME`, `TM_PASSWORD`, `TM_WORKSPACE` and `BUILD_NUMBER`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TM_URL") {
            self.base_url = url;
        }
        if let Some(username) = lookup("TM_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("TM_PASSWORD") {
            self.password = password;
        }
        if let Some(workspace) = lookup("TM_WORKSPACE") {
            self.workspace = Some(PathBuf::from(workspace));
        }
        if let Some(number) = lookup("BUILD_NUMBER").and_then(|raw| raw.trim().parse().ok()) {
            self.build_number = number;
        }
        self
    }

    /// Builds the client configuration; fails when no server URL is known.
    pub fn to_config(&self) -> anyhow::Result<TmConfig> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("server URL is not configured (set base_url or TM_URL)");
        }
        let mut config = TmConfig::new(self.base_url.trim(), &self.username, &self.password)
            .with_build_number(self.build_number)
            .with_deletion_policy(self.deletion_failures.into());
        if let Some(workspace) = &self.workspace {
            config = config.with_workspace(workspace);
        }
        Ok(config)
    }
}

/// Locates and loads the settings JSON file.
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager bound to the platform-specific config path.
    pub fn new() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("org", "testmanagement", "tm-publisher")
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        Ok(Self {
            path: dirs.config_dir().join("settings.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings from disk, falling back to defaults on read/parse errors.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        let content = fs::read_to_string(&self.path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Ignoring invalid settings file {}: {}", self.path.display(), err);
                Settings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeletionFailures, Settings, SettingsManager};
    use std::collections::HashMap;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tm_api::DeletionFailurePolicy;

    fn unique_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        env::temp_dir().join(format!("tm-publisher-tests-{name}-{nanos}/settings.json"))
    }

    #[test]
    fn default_settings_have_expected_values() {
        let settings = Settings::default();
        assert_eq!(settings.build_number, 1);
        assert_eq!(settings.retention_days, 30);
        assert_eq!(settings.deletion_failures, DeletionFailures::Silent);
        assert!(settings.workspace.is_none());
    }

    #[test]
    fn load_missing_file_returns_default() {
        let manager = SettingsManager::at(unique_path("missing"));
        assert_eq!(manager.load(), Settings::default());
    }

    #[test]
    fn load_reads_hand_written_file() {
        let path = unique_path("handwritten");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(
            &path,
            r#"{
                "base_url": "https://jira.example.com",
                "username": "ci",
                "password": "token",
                "workspace": "/var/build",
                "build_number": 77,
                "retention_days": 7,
                "deletion_failures": "log"
            }"#,
        )
        .expect("write settings");

        let manager = SettingsManager::at(path.clone());
        let expected = Settings {
            base_url: "https://jira.example.com".to_string(),
            username: "ci".to_string(),
            password: "token".to_string(),
            workspace: Some(PathBuf::from("/var/build")),
            build_number: 77,
            retention_days: 7,
            deletion_failures: DeletionFailures::Log,
        };
        assert_eq!(manager.load(), expected);

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let path = unique_path("partial");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(&path, r#"{"base_url": "http://host"}"#).expect("write settings");

        let settings = SettingsManager::at(path.clone()).load();
        assert_eq!(settings.base_url, "http://host");
        assert_eq!(settings.build_number, 1);
        assert_eq!(settings.retention_days, 30);
        assert_eq!(settings.deletion_failures, DeletionFailures::Silent);

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn load_invalid_json_falls_back_to_default() {
        let path = unique_path("invalid");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(&path, "not-valid-json").expect("write invalid settings");

        let manager = SettingsManager::at(path.clone());
        assert_eq!(manager.load().retention_days, 30);

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("TM_URL", "http://override"),
            ("TM_PASSWORD", "from-env"),
            ("BUILD_NUMBER", "123"),
        ]
        .into_iter()
        .collect();

        let settings = Settings {
            base_url: "http://file".to_string(),
            username: "file-user".to_string(),
            ..Settings::default()
        }
        .with_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(settings.base_url, "http://override");
        assert_eq!(settings.username, "file-user");
        assert_eq!(settings.password, "from-env");
        assert_eq!(settings.build_number, 123);
    }

    #[test]
    fn config_requires_url_and_carries_policy() {
        assert!(Settings::default().to_config().is_err());

        let settings = Settings {
            base_url: "http://host".to_string(),
            deletion_failures: DeletionFailures::Log,
            build_number: 9,
            ..Settings::default()
        };
        let config = settings.to_config().expect("valid config");
        assert_eq!(config.base_url, "http://host/");
        assert_eq!(config.build_number, 9);
        assert_eq!(config.deletion_policy, DeletionFailurePolicy::Log);
    }
}
