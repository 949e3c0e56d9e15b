//! Wire types for the `/api/v2/` admin and inter-librarian surface
//! (spec §6). Grounded on the original `hera_librarian.models.admin`
//! pydantic models; field names are kept so a peer librarian speaking
//! the same wire protocol can be modeled against this crate directly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DeletionPolicy, InstanceType};

/// Returned by any admin endpoint that rejects a request instead of
/// performing the requested action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequestFailedResponse {
    pub reason: String,
    pub suggested_remedy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteInstanceRequest {
    pub instance_id: Uuid,
    pub instance_type: InstanceType,
    pub delete_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteInstanceResponse {
    pub deleted: bool,
}

/// One row of a store manifest: a file known to be present in a store's
/// root, keyed by its path relative to that root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub relative_path: PathBuf,
    pub size: i64,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStoreManifestRequest {
    pub store_name: String,
    pub create_outgoing_transfers: bool,
    pub destination_librarian: Option<String>,
    pub disable_store: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStoreManifestResponse {
    pub entries: Vec<ManifestEntry>,
    pub outgoing_transfers_created: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStoreStateChangeRequest {
    pub store_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStoreStateChangeResponse {
    pub store_name: String,
    pub enabled: bool,
}

/// POSTed by the destination librarian back to the source once an
/// incoming transfer has landed and been committed to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneCompleteRequest {
    pub source_transfer_id: i64,
    pub destination_instance_id: Uuid,
    pub store_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneCompleteResponse {
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedStoreRequest {
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedStoreResponse {
    pub name: String,
    pub ssh_host: Option<String>,
    pub path_prefix: PathBuf,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteUploadRequest {
    pub store_name: String,
    pub staged_path: PathBuf,
    pub final_path: PathBuf,
    pub file_name: String,
    pub uploader: String,
    pub source: String,
    pub expected_size: i64,
    pub expected_checksum: String,
    pub deletion_policy: DeletionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub instance_id: Uuid,
    pub already_present: bool,
}
