//! Pull request link value objects used by PR-gated columns.

use super::BoardDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host accepted when no explicit host list is configured.
pub const DEFAULT_PULL_REQUEST_HOST: &str = "github.com";

/// Validated link to a hosted pull request.
///
/// The raw link is kept as entered (trimmed) so that it round-trips through
/// storage unchanged; the parsed components are available for display and
/// status lookups.
///
/// Deserialization accepts any host, as [`PullRequestUrl::parse_stored`]
/// does: links are checked against the configured hosts when they are
/// entered, not when they are read back.
///
/// # Examples
///
/// ```rust
/// use planboard::board::domain::PullRequestUrl;
///
/// let url = PullRequestUrl::parse("github.com/acme/planner/pull/42")
///     .expect("valid pull request link");
/// assert_eq!(url.owner(), "acme");
/// assert_eq!(url.number(), 42);
/// assert_eq!(url.canonical(), "https://github.com/acme/planner/pull/42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PullRequestUrl {
    raw: String,
    host: String,
    owner: String,
    repository: String,
    number: u64,
}

impl PullRequestUrl {
    /// Parses a pull request link hosted on `github.com`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidPullRequestUrl`] when the value is
    /// blank, hosted elsewhere, or does not point at `/owner/repo/pull/<n>`.
    pub fn parse(value: &str) -> Result<Self, BoardDomainError> {
        Self::parse_with_hosts(value, &[DEFAULT_PULL_REQUEST_HOST])
    }

    /// Parses a pull request link, accepting any host in `allowed_hosts`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidPullRequestUrl`] when the link does
    /// not validate.
    pub fn parse_with_hosts<H>(value: &str, allowed_hosts: &[H]) -> Result<Self, BoardDomainError>
    where
        H: AsRef<str>,
    {
        Self::parse_checked(value, |host| {
            allowed_hosts
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(host))
        })
    }

    /// Parses a link that was validated before it was stored, whatever its
    /// host.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidPullRequestUrl`] when the link is
    /// not shaped like a pull request link.
    pub fn parse_stored(value: &str) -> Result<Self, BoardDomainError> {
        Self::parse_checked(value, |host| !host.is_empty())
    }

    fn parse_checked(
        value: &str,
        host_allowed: impl Fn(&str) -> bool,
    ) -> Result<Self, BoardDomainError> {
        let invalid = || BoardDomainError::InvalidPullRequestUrl(value.to_owned());
        let raw = value.trim();
        if raw.is_empty() {
            return Err(invalid());
        }

        let without_scheme = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))
            .unwrap_or(raw);
        let (authority, path) = without_scheme
            .split_once('/')
            .unwrap_or((without_scheme, ""));
        let host = authority.to_ascii_lowercase();
        if !host_allowed(&host) {
            return Err(invalid());
        }

        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let owner = segments.next().ok_or_else(invalid)?;
        let repository = segments.next().ok_or_else(invalid)?;
        if segments.next() != Some("pull") {
            return Err(invalid());
        }
        let number = segments
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .filter(|number| *number > 0)
            .ok_or_else(invalid)?;

        Ok(Self {
            raw: raw.to_owned(),
            host,
            owner: owner.to_owned(),
            repository: repository.to_owned(),
            number,
        })
    }

    /// Returns the link as entered, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the normalised `https://host/owner/repo/pull/n` form.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "https://{}/{}/{}/pull/{}",
            self.host, self.owner, self.repository, self.number
        )
    }

    /// Returns the lower-cased host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the repository owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the pull request number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for PullRequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for PullRequestUrl {
    type Error = BoardDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_stored(&value)
    }
}

impl From<PullRequestUrl> for String {
    fn from(value: PullRequestUrl) -> Self {
        value.raw
    }
}

/// Remote state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    /// The pull request is open.
    Open,
    /// The pull request is closed, merged or not.
    Closed,
}

/// Point-in-time review and merge status of a linked pull request.
///
/// Snapshots are produced by whatever polls the hosting service; the board
/// only consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    /// Open or closed.
    pub state: PullRequestState,
    /// Whether the pull request has been merged.
    pub merged: bool,
    /// Whether the latest reviews approve the change.
    pub approved: bool,
    /// Whether a reviewer has requested changes.
    pub changes_requested: bool,
}

impl PullRequestSnapshot {
    /// Snapshot of an open pull request with no reviews.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            state: PullRequestState::Open,
            merged: false,
            approved: false,
            changes_requested: false,
        }
    }

    /// Snapshot of a merged pull request.
    #[must_use]
    pub const fn merged() -> Self {
        Self {
            state: PullRequestState::Closed,
            merged: true,
            approved: false,
            changes_requested: false,
        }
    }

    /// Snapshot of a pull request closed without merging.
    #[must_use]
    pub const fn closed_unmerged() -> Self {
        Self {
            state: PullRequestState::Closed,
            merged: false,
            approved: false,
            changes_requested: false,
        }
    }

    /// Marks the snapshot as approved.
    #[must_use]
    pub const fn with_approval(mut self) -> Self {
        self.approved = true;
        self
    }

    /// Marks the snapshot as having requested changes.
    #[must_use]
    pub const fn with_changes_requested(mut self) -> Self {
        self.changes_requested = true;
        self
    }
}
