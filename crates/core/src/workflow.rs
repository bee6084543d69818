//! Draft/publish state machine for content entities.
//!
//! Legal transitions:
//!
//! ```text
//! draft ──► published ──► archived
//!   ▲           │             │
//!   └───────────┴─────────────┘
//! ```
//!
//! `published → draft` unpublishes and `archived → draft` restores. Every
//! other request, including a transition to the current state, is rejected.
//! The first entry into `published` stamps `published_at`; later re-entries
//! keep the original value so permalinks and feed dates stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{StatusId, Timestamp};

/// Visibility state of a content entity.
///
/// Discriminants match the seed order of the `content_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft = 1,
    Published = 2,
    Archived = 3,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 3] = [
        ContentStatus::Draft,
        ContentStatus::Published,
        ContentStatus::Archived,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    /// Whether `self → target` is a legal transition.
    pub fn can_transition_to(self, target: ContentStatus) -> bool {
        use ContentStatus::*;
        matches!(
            (self, target),
            (Draft, Published) | (Published, Archived) | (Published, Draft) | (Archived, Draft)
        )
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name or ID does not map to a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl From<ContentStatus> for StatusId {
    fn from(value: ContentStatus) -> Self {
        value as StatusId
    }
}

/// Decodes the `status_id` column.
impl TryFrom<StatusId> for ContentStatus {
    type Error = UnknownStatus;

    fn try_from(id: StatusId) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| UnknownStatus(id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// The workflow-relevant slice of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishState {
    pub status: ContentStatus,
    pub published_at: Option<Timestamp>,
}

impl PublishState {
    pub fn draft() -> Self {
        Self {
            status: ContentStatus::Draft,
            published_at: None,
        }
    }

    /// Whether the entity has ever been published. Slugs freeze from then on.
    pub fn ever_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Apply `target` to `state`, returning the new state.
///
/// `now` is only used when the entity is published for the first time.
pub fn transition(
    state: PublishState,
    target: ContentStatus,
    now: Timestamp,
) -> Result<PublishState, CoreError> {
    if !state.status.can_transition_to(target) {
        return Err(CoreError::InvalidTransition {
            from: state.status,
            to: target,
        });
    }

    let published_at = match (target, state.published_at) {
        (ContentStatus::Published, None) => Some(now),
        (_, existing) => existing,
    };

    Ok(PublishState {
        status: target,
        published_at,
    })
}

/// Soft delete is refused for an entity that has been published and has not
/// been archived, so live permalinks are never silently removed.
pub fn ensure_deletable(state: &PublishState) -> Result<(), CoreError> {
    if state.ever_published() && state.status != ContentStatus::Archived {
        return Err(CoreError::Conflict(format!(
            "entity is {} and has been published; archive it before deleting",
            state.status
        )));
    }
    Ok(())
}
