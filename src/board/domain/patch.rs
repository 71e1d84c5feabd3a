//! Tagged task updates accepted at the persistence boundary.

use super::{BoardDomainError, ColumnId, PullRequestUrl, TaskId, TaskStatus};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single permitted change to a task field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFieldUpdate {
    /// Replaces the title.
    Title(String),
    /// Replaces the description.
    Description(String),
    /// Moves the task to another column.
    Column(ColumnId),
    /// Changes the rank within the column.
    Order(u32),
    /// Changes the workflow status.
    Status(TaskStatus),
    /// Links, replaces, or clears the pull request.
    PrUrl(Option<PullRequestUrl>),
    /// Replaces the labels.
    Labels(Vec<String>),
    /// Replaces the assignees.
    Assignees(Vec<String>),
    /// Locks or unlocks the task for non-assignees.
    Locked(bool),
}

/// Validated update for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    id: TaskId,
    updates: Vec<TaskFieldUpdate>,
}

const PATCH_FIELDS: [&str; 11] = [
    "id",
    "title",
    "description",
    "columnId",
    "order",
    "status",
    "prUrl",
    "labels",
    "assignee",
    "assignees",
    "isLocked",
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawTaskPatch {
    id: TaskId,
    title: Option<String>,
    description: Option<String>,
    column_id: Option<ColumnId>,
    order: Option<u32>,
    status: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pr_url: Option<Option<String>>,
    labels: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    assignee: Option<Option<String>>,
    assignees: Option<Vec<String>>,
    is_locked: Option<bool>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Creates an empty patch for a task.
    #[must_use]
    pub const fn new(id: TaskId) -> Self {
        Self {
            id,
            updates: Vec::new(),
        }
    }

    /// Patch that places a task in a column at a rank.
    #[must_use]
    pub fn position(id: TaskId, column_id: ColumnId, order: u32) -> Self {
        Self::new(id)
            .with(TaskFieldUpdate::Column(column_id))
            .with(TaskFieldUpdate::Order(order))
    }

    /// Patch that only changes a task's rank.
    #[must_use]
    pub fn order_only(id: TaskId, order: u32) -> Self {
        Self::new(id).with(TaskFieldUpdate::Order(order))
    }

    /// Appends a field update.
    #[must_use]
    pub fn with(mut self, update: TaskFieldUpdate) -> Self {
        self.updates.push(update);
        self
    }

    /// Parses a camelCase JSON patch body such as
    /// `{"id": "...", "columnId": "...", "order": 2}`.
    ///
    /// A blank or `null` `prUrl` clears the link. The single `assignee`
    /// field is read as a one-element assignee list; `assignees` wins when
    /// both are present.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::UnknownTaskField`] for fields outside the
    /// permitted set, [`BoardDomainError::InvalidPullRequestUrl`] for bad
    /// links, [`BoardDomainError::EmptyTaskTitle`] for blank titles and
    /// [`BoardDomainError::InvalidPatch`] for malformed bodies or statuses.
    pub fn from_json(body: &str) -> Result<Self, BoardDomainError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|err| BoardDomainError::InvalidPatch(err.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| BoardDomainError::InvalidPatch("expected a JSON object".to_owned()))?;
        if let Some(unknown) = object
            .keys()
            .find(|key| !PATCH_FIELDS.contains(&key.as_str()))
        {
            return Err(BoardDomainError::UnknownTaskField(unknown.clone()));
        }

        let raw: RawTaskPatch = serde_json::from_value(value)
            .map_err(|err| BoardDomainError::InvalidPatch(err.to_string()))?;
        Self::from_raw(raw)
    }

    /// Returns the patched task.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the field updates in application order.
    #[must_use]
    pub fn updates(&self) -> &[TaskFieldUpdate] {
        &self.updates
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Returns the last column update, if any.
    #[must_use]
    pub fn column_id(&self) -> Option<ColumnId> {
        self.updates.iter().rev().find_map(|update| match update {
            TaskFieldUpdate::Column(column_id) => Some(*column_id),
            _ => None,
        })
    }

    /// Returns the last order update, if any.
    #[must_use]
    pub fn order(&self) -> Option<u32> {
        self.updates.iter().rev().find_map(|update| match update {
            TaskFieldUpdate::Order(order) => Some(*order),
            _ => None,
        })
    }

    /// Returns the last pull request update, if any.
    #[must_use]
    pub fn pr_url(&self) -> Option<Option<&PullRequestUrl>> {
        self.updates.iter().rev().find_map(|update| match update {
            TaskFieldUpdate::PrUrl(pr_url) => Some(pr_url.as_ref()),
            _ => None,
        })
    }
}

impl TaskPatch {
    fn from_raw(raw: RawTaskPatch) -> Result<Self, BoardDomainError> {
        let mut patch = Self::new(raw.id);
        if let Some(title) = raw.title {
            if title.trim().is_empty() {
                return Err(BoardDomainError::EmptyTaskTitle);
            }
            patch = patch.with(TaskFieldUpdate::Title(title));
        }
        if let Some(description) = raw.description {
            patch = patch.with(TaskFieldUpdate::Description(description));
        }
        if let Some(column_id) = raw.column_id {
            patch = patch.with(TaskFieldUpdate::Column(column_id));
        }
        if let Some(order) = raw.order {
            patch = patch.with(TaskFieldUpdate::Order(order));
        }
        if let Some(status) = raw.status {
            let parsed = TaskStatus::try_from(status.as_str())
                .map_err(|err| BoardDomainError::InvalidPatch(err.to_string()))?;
            patch = patch.with(TaskFieldUpdate::Status(parsed));
        }
        if let Some(pr_url) = raw.pr_url {
            let parsed = match pr_url.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(link) => Some(PullRequestUrl::parse(link)?),
            };
            patch = patch.with(TaskFieldUpdate::PrUrl(parsed));
        }
        if let Some(labels) = raw.labels {
            patch = patch.with(TaskFieldUpdate::Labels(labels));
        }
        if let Some(assignee) = raw.assignee {
            let single = assignee
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty());
            patch = patch.with(TaskFieldUpdate::Assignees(single.into_iter().collect()));
        }
        if let Some(assignees) = raw.assignees {
            patch = patch.with(TaskFieldUpdate::Assignees(assignees));
        }
        if let Some(locked) = raw.is_locked {
            patch = patch.with(TaskFieldUpdate::Locked(locked));
        }
        Ok(patch)
    }
}
