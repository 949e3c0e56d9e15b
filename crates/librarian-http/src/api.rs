//! `/api/v2/` handlers (spec §6): a `State<AppState>` extractor plus an
//! `ApiResponse<T>` envelope for plain reads, and a
//! `{reason, suggested_remedy}` body (spec §7) on admin-route failure
//! instead of an empty one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use librarian_core::{
    AdminRequestFailedResponse, AdminStoreManifestRequest, AdminStoreManifestResponse,
    AdminStoreStateChangeRequest, AdminStoreStateChangeResponse, CloneCompleteRequest,
    CloneCompleteResponse, CompleteUploadRequest, CompleteUploadResponse, DeleteInstanceRequest,
    DeleteInstanceResponse, ErrorRecord, File, InstanceType, LibrarianError,
    RecommendedStoreRequest, RecommendedStoreResponse, Store, StoreKind, TransferStatus,
};
use librarian_store::LocalStore;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

type AdminFailure = (StatusCode, Json<AdminRequestFailedResponse>);
type AdminResult<T> = std::result::Result<Json<T>, AdminFailure>;

fn admin_failure(status: StatusCode, reason: impl Into<String>, remedy: impl Into<String>) -> AdminFailure {
    (
        status,
        Json(AdminRequestFailedResponse {
            reason: reason.into(),
            suggested_remedy: remedy.into(),
        }),
    )
}

fn db_failure(error: LibrarianError) -> AdminFailure {
    admin_failure(StatusCode::INTERNAL_SERVER_ERROR, error.to_string(), "retry later")
}

fn unknown_store(name: &str) -> AdminFailure {
    admin_failure(
        StatusCode::BAD_REQUEST,
        format!("unknown store '{name}'"),
        "check store_name",
    )
}

pub async fn delete_instance(
    State(state): State<AppState>,
    Json(req): Json<DeleteInstanceRequest>,
) -> std::result::Result<(StatusCode, Json<DeleteInstanceResponse>), AdminFailure> {
    match req.instance_type {
        InstanceType::Local => {
            let Some(instance) = state.db.get_instance(req.instance_id).await.map_err(db_failure)? else {
                return Err(admin_failure(
                    StatusCode::BAD_REQUEST,
                    "no local instance with that id",
                    "check instance_id and retry",
                ));
            };

            if req.delete_file {
                if let Some(store) = state.db.get_store_by_name(&instance.store_name).await.map_err(db_failure)? {
                    LocalStore::new(&store.root)
                        .unstage(std::path::Path::new(&instance.path))
                        .await;
                }
            }

            state.db.delete_instance(req.instance_id).await.map_err(db_failure)?;
            Ok((StatusCode::CREATED, Json(DeleteInstanceResponse { deleted: true })))
        }
        InstanceType::Remote => {
            let deleted = state
                .db
                .delete_remote_instance(req.instance_id)
                .await
                .map_err(db_failure)?;
            if !deleted {
                return Err(admin_failure(
                    StatusCode::BAD_REQUEST,
                    "no remote instance with that id",
                    "check instance_id and retry",
                ));
            }
            Ok((StatusCode::CREATED, Json(DeleteInstanceResponse { deleted: true })))
        }
    }
}

pub async fn admin_manifest(
    State(state): State<AppState>,
    Json(req): Json<AdminStoreManifestRequest>,
) -> AdminResult<AdminStoreManifestResponse> {
    let store = state
        .db
        .get_store_by_name(&req.store_name)
        .await
        .map_err(db_failure)?
        .ok_or_else(|| unknown_store(&req.store_name))?;

    let entries = state
        .db
        .list_manifest_entries(&store.name)
        .await
        .map_err(db_failure)?;

    let mut outgoing_transfers_created = 0;
    if req.create_outgoing_transfers {
        if let Some(destination) = &req.destination_librarian {
            for entry in &entries {
                let file_name = entry
                    .relative_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();

                let created = state
                    .db
                    .create_outgoing_transfer(
                        &file_name,
                        destination,
                        &entry.relative_path.to_string_lossy(),
                        &entry.relative_path.to_string_lossy(),
                        entry.size,
                        &entry.checksum,
                        None,
                    )
                    .await;

                match created {
                    Ok(_) => outgoing_transfers_created += 1,
                    Err(error) => {
                        tracing::warn!(%file_name, %error, "failed to create outgoing transfer from manifest")
                    }
                }
            }
        }
    }

    if req.disable_store {
        state
            .db
            .set_store_enabled(&store.name, false)
            .await
            .map_err(db_failure)?;
    }

    Ok(Json(AdminStoreManifestResponse {
        entries,
        outgoing_transfers_created,
    }))
}

pub async fn admin_store_state(
    State(state): State<AppState>,
    Json(req): Json<AdminStoreStateChangeRequest>,
) -> AdminResult<AdminStoreStateChangeResponse> {
    state
        .db
        .get_store_by_name(&req.store_name)
        .await
        .map_err(db_failure)?
        .ok_or_else(|| unknown_store(&req.store_name))?;

    state
        .db
        .set_store_enabled(&req.store_name, req.enabled)
        .await
        .map_err(db_failure)?;

    Ok(Json(AdminStoreStateChangeResponse {
        store_name: req.store_name,
        enabled: req.enabled,
    }))
}

pub async fn clone_complete(
    State(state): State<AppState>,
    Json(req): Json<CloneCompleteRequest>,
) -> AdminResult<CloneCompleteResponse> {
    let transfer = state
        .db
        .get_outgoing_transfer(req.source_transfer_id)
        .await
        .map_err(db_failure)?
        .ok_or_else(|| {
            admin_failure(
                StatusCode::BAD_REQUEST,
                format!("unknown outgoing transfer {}", req.source_transfer_id),
                "check source_transfer_id",
            )
        })?;

    state
        .db
        .record_remote_instance(&transfer.file_name, &transfer.destination_librarian)
        .await
        .map_err(db_failure)?;

    // Destination-side acceptance is what promotes STAGED -> COMPLETED.
    state
        .db
        .set_outgoing_transfer_status(req.source_transfer_id, TransferStatus::Completed)
        .await
        .map_err(db_failure)?;

    if let Some(event) = &transfer.standing_order_event {
        state
            .db
            .record_file_event(&transfer.file_name, event)
            .await
            .map_err(db_failure)?;
    }

    Ok(Json(CloneCompleteResponse { acknowledged: true }))
}

/// Free bytes per enabled, available local store; non-local store kinds
/// have no [`LocalStore`] counterpart yet (spec §9 names remote store
/// kinds as a non-goal) and are skipped.
async fn local_store_candidates(stores: &[Store]) -> Vec<(String, u64)> {
    let mut candidates = Vec::with_capacity(stores.len());
    for store in stores {
        if store.kind != StoreKind::Local {
            continue;
        }
        match LocalStore::new(&store.root).free_space().await {
            Ok(free) => candidates.push((store.name.clone(), free)),
            Err(error) => tracing::warn!(store = %store.name, %error, "failed to read free space"),
        }
    }
    candidates
}

pub async fn recommended_store(
    State(state): State<AppState>,
    Json(req): Json<RecommendedStoreRequest>,
) -> AdminResult<RecommendedStoreResponse> {
    let stores = state
        .db
        .list_enabled_available_stores()
        .await
        .map_err(db_failure)?;

    let candidates = local_store_candidates(&stores).await;

    let name = librarian_core::recommend_store(&candidates, req.size).map_err(|error| match error {
        LibrarianError::NoStoreAvailable { requested, .. } => admin_failure(
            StatusCode::BAD_REQUEST,
            format!("unable to find a store able to hold {requested} bytes"),
            "free space on an existing store or add a new one",
        ),
        other => admin_failure(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), "retry later"),
    })?;

    let available_bytes = candidates
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, bytes)| bytes)
        .unwrap_or(0);
    let store = stores
        .into_iter()
        .find(|s| s.name == name)
        .expect("recommend_store only returns a name we listed");

    Ok(Json(RecommendedStoreResponse {
        name: store.name,
        ssh_host: None,
        path_prefix: store.root,
        available_bytes,
    }))
}

pub async fn complete_upload(
    State(state): State<AppState>,
    Json(req): Json<CompleteUploadRequest>,
) -> AdminResult<CompleteUploadResponse> {
    let store = state
        .db
        .get_store_by_name(&req.store_name)
        .await
        .map_err(db_failure)?
        .ok_or_else(|| unknown_store(&req.store_name))?;

    let local_store = LocalStore::new(&store.root);

    if let Some(existing) = state
        .db
        .get_instance_by_store_path(&req.store_name, &req.final_path.to_string_lossy())
        .await
        .map_err(db_failure)?
    {
        local_store.unstage(&req.staged_path).await;
        return Ok(Json(CompleteUploadResponse {
            instance_id: existing.id,
            already_present: true,
        }));
    }

    let info = local_store
        .path_info(&req.staged_path)
        .await
        .map_err(|error| admin_failure(StatusCode::BAD_REQUEST, error.to_string(), "check staged_path"))?;

    if info.size != req.expected_size as u64 || info.md5.to_lowercase() != req.expected_checksum.to_lowercase() {
        return Err(admin_failure(
            StatusCode::BAD_REQUEST,
            "observed size/checksum does not match expected",
            "re-upload the file",
        ));
    }

    local_store
        .commit(&req.staged_path, &req.final_path)
        .await
        .map_err(db_failure)?;

    state
        .db
        .create_file(&File::new(
            req.file_name.clone(),
            req.expected_size,
            req.expected_checksum.clone(),
            req.uploader.clone(),
            req.source.clone(),
        ))
        .await
        .map_err(db_failure)?;

    let instance = state
        .db
        .create_instance(
            &req.file_name,
            &req.store_name,
            &req.final_path.to_string_lossy(),
            req.deletion_policy,
        )
        .await
        .map_err(db_failure)?;

    Ok(Json(CompleteUploadResponse {
        instance_id: instance.id,
        already_present: false,
    }))
}

pub async fn recent_errors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ErrorRecord>>>, StatusCode> {
    match state.db.recent_errors(100).await {
        Ok(errors) => Ok(Json(ApiResponse::ok(errors))),
        Err(error) => {
            tracing::error!(%error, "failed to list recent errors");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_store(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Store>>, StatusCode> {
    match state.db.get_store_by_name(&name).await {
        Ok(Some(store)) => Ok(Json(ApiResponse::ok(store))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(error) => {
            tracing::error!(%name, %error, "failed to get store");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
