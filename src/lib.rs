//! iMazing to SMS Backup & Restore
//!
//! Converts call history and message history CSV exports written by the
//! iMazing phone backup tool into the JSON collection format used by the
//! archive tooling.
//!
//! # Features
//!
//! - Detect the export kind from its header row
//! - Convert calls and messages row by row into archive records
//! - Append records to an existing collection file, or start a new one
//! - Layered configuration, structured logging and metrics

/// Loading and saving the collection file
pub mod collection;
/// Configuration management
pub mod config;
/// CSV to record conversion
pub mod convert;
/// Error types
pub mod error;
/// Header row classification
pub mod header;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Import orchestration
pub mod service;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use collection::{CollectionStore, JsonFileStore};
pub use error::{ImportError, Result};
pub use models::{CallRecord, Calls, Collection, FileKind, MessageRecord, Messages, RecordBatch};
pub use service::{ImportRequest, ImportService, ImportSummary};
