use chrono::{DateTime, Utc};
use librarian_core::{
    DeletionPolicy, ErrorCategory, ErrorRecord, ErrorSeverity, File, IncomingTransfer, Instance,
    OutgoingTransfer, RemoteInstance, SendQueueItem, SendQueueTransfer, Store, StoreKind,
    TransferStatus,
};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct FileRow {
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub size: i64,
    pub checksum: String,
    pub uploader: String,
    pub source: String,
}

impl From<FileRow> for File {
    fn from(row: FileRow) -> Self {
        File {
            name: row.name,
            create_time: row.create_time,
            size: row.size,
            checksum: row.checksum,
            uploader: row.uploader,
            source: row.source,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct StoreRow {
    pub name: String,
    pub kind: StoreKind,
    pub root: String,
    pub ingestable: bool,
    pub available: bool,
    pub enabled: bool,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            name: row.name,
            kind: row.kind,
            root: row.root.into(),
            ingestable: row.ingestable,
            available: row.available,
            enabled: row.enabled,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct InstanceRow {
    pub id: Uuid,
    pub file_name: String,
    pub store_name: String,
    pub path: String,
    pub deletion_policy: DeletionPolicy,
    pub create_time: DateTime<Utc>,
    pub available: bool,
}

impl From<InstanceRow> for Instance {
    fn from(row: InstanceRow) -> Self {
        Instance {
            id: row.id,
            file_name: row.file_name,
            store_name: row.store_name,
            path: row.path,
            deletion_policy: row.deletion_policy,
            create_time: row.create_time,
            available: row.available,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct RemoteInstanceRow {
    pub id: Uuid,
    pub file_name: String,
    pub librarian_name: String,
    pub copy_time: DateTime<Utc>,
}

impl From<RemoteInstanceRow> for RemoteInstance {
    fn from(row: RemoteInstanceRow) -> Self {
        RemoteInstance {
            id: row.id,
            file_name: row.file_name,
            librarian_name: row.librarian_name,
            copy_time: row.copy_time,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct OutgoingTransferRow {
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
    pub send_queue_id: Option<i64>,
    pub standing_order_event: Option<String>,
}

impl From<OutgoingTransferRow> for OutgoingTransfer {
    fn from(row: OutgoingTransferRow) -> Self {
        OutgoingTransfer {
            id: row.id,
            file_name: row.file_name,
            destination_librarian: row.destination_librarian,
            source_path: row.source_path,
            dest_path: row.dest_path,
            transfer_size: row.transfer_size,
            transfer_checksum: row.transfer_checksum,
            status: row.status,
            start_time: row.start_time,
            end_time: row.end_time,
            send_queue_id: row.send_queue_id,
            standing_order_event: row.standing_order_event,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct IncomingTransferRow {
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

impl From<IncomingTransferRow> for IncomingTransfer {
    fn from(row: IncomingTransferRow) -> Self {
        IncomingTransfer {
            id: row.id,
            upload_name: row.upload_name,
            uploader: row.uploader,
            source: row.source,
            transfer_size: row.transfer_size,
            transfer_checksum: row.transfer_checksum,
            staging_path: row.staging_path,
            store_path: row.store_path,
            store_name: row.store_name,
            status: row.status,
            end_time: row.end_time,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct SendQueueRow {
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

impl From<SendQueueRow> for SendQueueItem {
    fn from(row: SendQueueRow) -> Self {
        SendQueueItem {
            id: row.id,
            priority: row.priority,
            created_time: row.created_time,
            destination: row.destination,
            async_transfer_manager: row.async_transfer_manager,
            consumed: row.consumed,
            consumed_time: row.consumed_time,
            completed: row.completed,
            completed_time: row.completed_time,
            retries: row.retries,
            failed: row.failed,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct SendQueueTransferRow {
    pub send_queue_id: i64,
    pub outgoing_transfer_id: i64,
    pub source_path: String,
    pub dest_path: String,
}

impl From<SendQueueTransferRow> for SendQueueTransfer {
    fn from(row: SendQueueTransferRow) -> Self {
        SendQueueTransfer {
            send_queue_id: row.send_queue_id,
            outgoing_transfer_id: row.outgoing_transfer_id,
            source_path: row.source_path,
            dest_path: row.dest_path,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct ErrorRow {
    pub id: i64,
    pub severity: ErrorSeverity,
    pub category: ErrorCategory,
    pub message: String,
    pub create_time: DateTime<Utc>,
}

impl From<ErrorRow> for ErrorRecord {
    fn from(row: ErrorRow) -> Self {
        ErrorRecord {
            id: row.id,
            severity: row.severity,
            category: row.category,
            message: row.message,
            create_time: row.create_time,
        }
    }
}
