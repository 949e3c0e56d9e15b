mod admin;
mod contract;
mod error;
mod recommend;
mod settings;
mod types;

pub use admin::{
    AdminRequestFailedResponse, AdminStoreManifestRequest, AdminStoreManifestResponse,
    AdminStoreStateChangeRequest, AdminStoreStateChangeResponse, CloneCompleteRequest,
    CloneCompleteResponse, CompleteUploadRequest, CompleteUploadResponse, DeleteInstanceRequest,
    DeleteInstanceResponse, ManifestEntry, RecommendedStoreRequest, RecommendedStoreResponse,
};
pub use contract::{PathInfo, StoreManager, TransferManager};
pub use error::{ErrorCategory, ErrorSeverity, LibrarianError, Result};
pub use recommend::recommend_store;
pub use settings::{LibrarianConnectionConfig, ServerSettings, TransferManagerDefaults};
pub use types::{
    DeletionPolicy, ErrorRecord, File, FileEvent, IncomingTransfer, Instance, InstanceType,
    Librarian, OutgoingTransfer, RemoteInstance, SavedSearch, SendQueueItem, SendQueueTransfer,
    StandingOrder, Store, StoreKind, TransferStatus,
};
