//! Two-phase concurrent SMB indexer and catalog store.
//!
//! The core never talks to a concrete SMB library, text/metadata
//! extractor, or HTTP framework directly — it depends on the `SmbBackend`
//! trait here and the `TextExtractor`/`MetadataExtractor` traits from
//! `nas-contracts`, so `nas-server` (or any other collaborator) supplies
//! the concrete implementations.

pub mod catalog;
pub mod categorizer;
pub mod error;
pub mod lifecycle;
pub mod resolver;
pub mod scanner;
pub mod smb;
pub mod source;
pub mod types;
pub mod vault;

pub use error::{CoreError, Result};
