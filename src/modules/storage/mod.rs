//! Storage module for document payloads
//!
//! Provides the blob store abstraction and its local filesystem implementation.

mod local_blob_store;

pub use local_blob_store::{BlobStore, LocalBlobStore};
