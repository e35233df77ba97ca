//! Error types for the imazing-to-sbr library.
//!
//! Every failure is fatal to a single import: nothing is written to the
//! collection unless the whole CSV file converted cleanly.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::FileKind;

/// Rejection of an export date text
#[derive(Error, Debug)]
pub enum DateFormatError {
    /// chrono could not parse the text at all
    #[error("{0}")]
    Parse(#[from] chrono::ParseError),

    /// The text parsed but is not written exactly as `YYYY-MM-DD HH:MM:SS`
    #[error("date is not in YYYY-MM-DD HH:MM:SS layout")]
    Layout,
}

/// Errors that can occur while importing an iMazing export.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The file to import does not exist
    #[error("import file does not exist: {}", path.display())]
    InputNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// A parameter supplied by the caller was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The CSV source had no header row
    #[error("import file is empty, no header row found")]
    EmptyInput,

    /// The header row matched neither the call nor the message layout
    #[error("unrecognized file format, header starts with {header:?}")]
    UnrecognizedFormat {
        /// First header cell as read from the file
        header: String,
    },

    /// A column the layout needs is absent from the header row
    #[error("{kind} header is missing column {column:?}")]
    MissingColumn {
        /// Layout that was being resolved
        kind: FileKind,
        /// Name of the missing column
        column: String,
    },

    /// A data row could not be read, e.g. because its field count differs
    #[error("failed to read {kind} row {row}: {source}")]
    RowRead {
        /// Layout of the file being read
        kind: FileKind,
        /// 1-based data row number (the header is not counted)
        row: usize,
        /// Underlying CSV error, which carries the byte and line position
        #[source]
        source: csv::Error,
    },

    /// A row's date column does not match `YYYY-MM-DD HH:MM:SS`
    #[error("invalid date {value:?} in {kind} row {row}: {source}")]
    DateParse {
        /// Layout of the file being read
        kind: FileKind,
        /// 1-based data row number (the header is not counted)
        row: usize,
        /// Offending date text
        value: String,
        /// Why the text was rejected
        #[source]
        source: DateFormatError,
    },

    /// An existing collection file could not be read or parsed
    #[error("failed to load collection {}: {source}", path.display())]
    CollectionLoad {
        /// Collection file path
        path: PathBuf,
        /// I/O or JSON error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The collection could not be written back
    #[error("failed to save collection {}: {source}", path.display())]
    CollectionSave {
        /// Collection file path
        path: PathBuf,
        /// I/O or JSON error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// File kind that had been detected when the error happened.
    ///
    /// Errors raised before the header was classified report
    /// [`FileKind::Unknown`].
    #[must_use]
    pub const fn file_kind(&self) -> FileKind {
        match self {
            Self::MissingColumn { kind, .. } | Self::RowRead { kind, .. } | Self::DateParse { kind, .. } => *kind,
            _ => FileKind::Unknown,
        }
    }

    /// Stable snake_case label used for metrics and structured logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InputNotFound { .. } => "input_not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::EmptyInput => "empty_input",
            Self::UnrecognizedFormat { .. } => "unrecognized_format",
            Self::MissingColumn { .. } => "missing_column",
            Self::RowRead { .. } => "row_read",
            Self::DateParse { .. } => "date_parse",
            Self::CollectionLoad { .. } => "collection_load",
            Self::CollectionSave { .. } => "collection_save",
            Self::Io(_) => "io",
        }
    }
}

/// Convenience type alias for Result with ImportError
pub type Result<T> = std::result::Result<T, ImportError>;
