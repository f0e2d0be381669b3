//! Output destination for finished recordings
//!
//! - `store`: durable namespaced key-value storage
//! - `directory`: folder capability (pick, permissions, file writes)
//! - `folder`: single-slot persistence of the chosen folder + permission negotiation
//! - `download`: fallback "save as" delivery
//! - `sink`: folder-write-with-fallback policy and filename generation

pub mod directory;
pub mod download;
pub mod folder;
pub mod sink;
pub mod store;

pub use directory::{
    AccessMode, DirectoryAccess, FolderHandle, LocalDirectories, PermissionResponse,
    PermissionState, WritableFile,
};
pub use download::{BlobRef, Downloader, DownloadsFolder};
pub use folder::{FolderStore, PermissionOutcome, FOLDER_KEY, STORE_NAMESPACE};
pub use sink::{build_filename, OutputSink, SaveOutcome, FILENAME_PREFIX};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
