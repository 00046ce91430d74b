//! Library controller for PDF Cosmos: ingestion, selection and deletion over
//! a record store, with the UI flags the scene and overlays render from.

pub mod capability;
pub mod ingest;
pub mod library;
pub mod notice;

pub use capability::{Confirm, DirectoryAccess, DirectoryAccessError, DirectoryGrant};
pub use ingest::{mime_type_for, FailedFile, IncomingFile, IngestReport, ValidationError};
pub use library::{DeleteOutcome, Library, LibraryEntry, LibraryState, DELETE_PROMPT};
pub use notice::{Notice, StorageAction};
