//! Storage module for member attachments
//!
//! Provides the [`ObjectStore`] seam plus two media hosts behind it:
//! Cloudinary (signed upload API) and MinIO or any S3-compatible service.

mod cloudinary_client;
mod error;
mod minio_client;
mod object_store;
mod payload;
mod sigv4;

pub use cloudinary_client::CloudinaryClient;
pub use error::StorageError;
pub use minio_client::MinIOClient;
pub use object_store::{extension_for, ObjectStore, ObjectUpload, ResourceKind, StoredObject};
pub use payload::{Payload, StagedFile, StagingWriter};
