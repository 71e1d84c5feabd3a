//! Planner configuration.

use crate::board::domain::{BoardDomainError, DEFAULT_PULL_REQUEST_HOST, PullRequestUrl};
use serde::{Deserialize, Serialize};

/// Configuration for board services.
///
/// # Examples
///
/// ```
/// use planboard::board::services::PlannerConfig;
///
/// let config = PlannerConfig::default();
/// assert_eq!(config.allowed_pr_hosts, vec!["github.com".to_owned()]);
/// assert!(config.refetch_on_rollback_failure);
///
/// let enterprise = PlannerConfig::from_json(r#"{"allowed_pr_hosts": ["git.example.com"]}"#)
///     .expect("valid config");
/// assert!(enterprise.parse_pr_url("https://git.example.com/a/b/pull/3").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Hosts whose pull request links satisfy PR-gated columns.
    pub allowed_pr_hosts: Vec<String>,
    /// Whether to re-fetch affected columns when a rollback cannot be
    /// persisted.
    pub refetch_on_rollback_failure: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            allowed_pr_hosts: vec![DEFAULT_PULL_REQUEST_HOST.to_owned()],
            refetch_on_rollback_failure: true,
        }
    }
}

impl PlannerConfig {
    /// Parses a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns the decoding error for malformed input.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Replaces the accepted pull request hosts.
    #[must_use]
    pub fn with_pr_hosts(mut self, hosts: impl IntoIterator<Item = String>) -> Self {
        self.allowed_pr_hosts = hosts.into_iter().collect();
        self
    }

    /// Parses a pull request link against the configured hosts.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidPullRequestUrl`] when the link is
    /// malformed or hosted elsewhere.
    pub fn parse_pr_url(&self, raw: &str) -> Result<PullRequestUrl, BoardDomainError> {
        PullRequestUrl::parse_with_hosts(raw, &self.allowed_pr_hosts)
    }
}
