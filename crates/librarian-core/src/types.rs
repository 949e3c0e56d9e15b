use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Whether an [`Instance`] may be deleted by store-draining operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeletionPolicy {
    Allowed,
    Disallowed,
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        Self::Disallowed
    }
}

/// A unique piece of content known to this node's catalog, identified by
/// its `name`. Immutable after creation except for its association lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub size: i64,
    pub checksum: String,
    pub uploader: String,
    pub source: String,
}

impl File {
    pub fn new(name: String, size: i64, checksum: String, uploader: String, source: String) -> Self {
        Self {
            name,
            create_time: Utc::now(),
            size,
            checksum: checksum.to_lowercase(),
            uploader,
            source,
        }
    }
}

/// A physical copy of a [`File`]'s bytes on one local [`Store`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: Uuid,
    pub file_name: String,
    pub store_name: String,
    pub path: String,
    pub deletion_policy: DeletionPolicy,
    pub create_time: DateTime<Utc>,
    pub available: bool,
}

/// A belief that a peer librarian holds a copy of a [`File`]. Carries no
/// ownership of bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteInstance {
    pub id: Uuid,
    pub file_name: String,
    pub librarian_name: String,
    pub copy_time: DateTime<Utc>,
}

/// The storage transport a [`Store`] exposes. Modeled as a tag, not a
/// subclass hierarchy: the store entity is one type with an embedded
/// transport-capability value (see SPEC_FULL.md design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    Ssh,
    S3,
}

/// A physical disk presented by a node. Owns its [`Instance`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub kind: StoreKind,
    pub root: PathBuf,
    pub ingestable: bool,
    pub available: bool,
    pub enabled: bool,
}

/// A peer node in the federation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Librarian {
    pub name: String,
    pub url: String,
    pub port: u16,
    pub available: bool,
}

/// Shared terminal/non-terminal vocabulary for outgoing and incoming
/// transfers (spec §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Initiated,
    Ongoing,
    Staged,
    Completed,
    Failed,
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Staged
                | TransferStatus::Completed
                | TransferStatus::Failed
                | TransferStatus::Cancelled
        )
    }
}

/// A commitment to ship one [`File`]'s bytes to a peer. See the state
/// machine in spec §4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingTransfer {
    pub id: i64,
    pub file_name: String,
    pub destination_librarian: String,
    pub source_path: String,
    pub dest_path: String,
    pub transfer_size: i64,
    pub transfer_checksum: String,
    pub status: TransferStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Weak back-reference: the id only, nullable, so no in-memory cycle
    /// with [`crate::SendQueueItem`].
    pub send_queue_id: Option<i64>,
    /// Set when this transfer was launched by a [`StandingOrder`]; carries
    /// that order's [`StandingOrder::event_type`] so the transfer's actual
    /// completion (not its launch) can record the success marker.
    pub standing_order_event: Option<String>,
}

/// The destination-side twin of [`OutgoingTransfer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingTransfer {
    pub id: i64,
    pub upload_name: String,
    pub uploader: String,
    pub source: String,
    pub transfer_size: i64,
    pub transfer_checksum: String,
    pub staging_path: String,
    pub store_path: String,
    pub store_name: String,
    pub status: TransferStatus,
    pub end_time: Option<DateTime<Utc>>,
}

/// A batch of one or more [`OutgoingTransfer`]s destined to the same peer,
/// plus the serialized state of the async transfer manager driving them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendQueueItem {
    pub id: i64,
    pub priority: i32,
    pub created_time: DateTime<Utc>,
    pub destination: String,
    pub async_transfer_manager: serde_json::Value,
    pub consumed: bool,
    pub consumed_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_time: Option<DateTime<Utc>>,
    pub retries: i32,
    pub failed: bool,
}

/// One `(source_path, dest_path)` pair belonging to a [`SendQueueItem`],
/// paired with the [`OutgoingTransfer`] it will update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendQueueTransfer {
    pub send_queue_id: i64,
    pub outgoing_transfer_id: i64,
    pub source_path: String,
    pub dest_path: String,
}

/// A tagged union over saved-search predicates (SPEC_FULL.md §10). The
/// string form persisted in `standing_orders.search` is this enum's JSON
/// serialization; there is no `eval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedSearch {
    /// One of a small registry of named, hard-coded predicates.
    NamedQuery { name: String },
    /// Files created within the last `days` days whose name matches a
    /// SQL `LIKE` pattern.
    TimeWindow { days: i64, like_pattern: String },
    /// Matches nothing; useful as a placeholder for newly created orders.
    Empty,
}

impl SavedSearch {
    pub fn to_storage_string(&self) -> String {
        serde_json::to_string(self).expect("SavedSearch always serializes")
    }

    pub fn from_storage_string(s: &str) -> crate::Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| crate::LibrarianError::InvalidConfig(format!("bad saved search: {e}")))
    }
}

/// A rule for auto-replicating files matching `search` to `conn_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingOrder {
    pub name: String,
    pub search: SavedSearch,
    pub conn_name: String,
}

impl StandingOrder {
    pub fn event_type(&self) -> String {
        format!("standing_order_succeeded:{}", self.name)
    }
}

/// A marker row keyed by `(file_name, type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
    pub file_name: String,
    pub event_type: String,
    pub create_time: DateTime<Utc>,
}

/// An append-only audit log row (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: i64,
    pub severity: crate::ErrorSeverity,
    pub category: crate::ErrorCategory,
    pub message: String,
    pub create_time: DateTime<Utc>,
}

/// An `instance_id`'s type discriminator, as used by the
/// `/instances/delete_instance` endpoint (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Local,
    Remote,
}

impl std::str::FromStr for InstanceType {
    type Err = crate::LibrarianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(InstanceType::Local),
            "remote" => Ok(InstanceType::Remote),
            other => Err(crate::LibrarianError::InvalidInstanceType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_search_round_trips_through_storage_string() {
        let search = SavedSearch::TimeWindow {
            days: 14,
            like_pattern: "zen%HH.uvc".to_string(),
        };
        let stored = search.to_storage_string();
        let parsed = SavedSearch::from_storage_string(&stored).unwrap();
        assert_eq!(search, parsed);
    }

    #[test]
    fn saved_search_rejects_eval_style_garbage() {
        assert!(SavedSearch::from_storage_string("not json at all").is_err());
    }

    #[test]
    fn transfer_status_terminal_states() {
        assert!(TransferStatus::Staged.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::Initiated.is_terminal());
        assert!(!TransferStatus::Ongoing.is_terminal());
    }

    #[test]
    fn standing_order_event_type_is_namespaced() {
        let order = StandingOrder {
            name: "nightly-backup".to_string(),
            search: SavedSearch::Empty,
            conn_name: "peer-a".to_string(),
        };
        assert_eq!(order.event_type(), "standing_order_succeeded:nightly-backup");
    }

    #[test]
    fn instance_type_parses_known_values_only() {
        assert_eq!("local".parse::<InstanceType>().unwrap(), InstanceType::Local);
        assert_eq!("remote".parse::<InstanceType>().unwrap(), InstanceType::Remote);
        assert!("bogus".parse::<InstanceType>().is_err());
    }
}
