use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::collection::CollectionStore;
use crate::convert;
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{FileKind, RecordBatch};
use crate::validation::InputValidator;

/// One file to import, checked before any CSV parsing happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    import_file: PathBuf,
    tag: Option<String>,
}

impl ImportRequest {
    /// Validate the import path. The tag is free text and taken as given.
    ///
    /// A path that does not exist is rejected with
    /// [`ImportError::InputNotFound`](crate::error::ImportError::InputNotFound).
    pub fn new(import_file: impl Into<PathBuf>, tag: Option<String>) -> Result<Self> {
        let import_file = import_file.into();
        InputValidator::validate_import_file(&import_file)?;
        Ok(Self { import_file, tag })
    }

    /// CSV file to convert
    #[must_use]
    pub fn import_file(&self) -> &Path {
        &self.import_file
    }

    /// Tag attached to the import's log events; it is not persisted
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

/// Outcome of a completed import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Detected file kind
    pub file_kind: FileKind,
    /// Records appended by this import
    pub records: usize,
    /// Calls in the collection after the merge
    pub total_calls: usize,
    /// Text messages in the collection after the merge
    pub total_sms: usize,
}

/// Converts exports and merges them into a collection
pub struct ImportService {
    store: Box<dyn CollectionStore>,
    metrics: MetricsCollector,
}

impl ImportService {
    /// Service writing to `store`
    pub fn new(store: Box<dyn CollectionStore>) -> Self {
        Self {
            store,
            metrics: MetricsCollector::default(),
        }
    }

    /// Convert the request's file into a record batch
    pub fn convert(&self, request: &ImportRequest) -> Result<RecordBatch> {
        let timer = OperationTimer::start("convert");
        let batch = convert::convert_file(request.import_file()).inspect_err(|err| {
            self.metrics.record_error(err, "convert");
        })?;
        let elapsed = timer.finish();

        let file_kind = batch.file_kind();
        self.metrics.record_conversion(file_kind, batch.len(), elapsed);
        info!(
            file = %request.import_file().display(),
            file_kind = %file_kind,
            records = batch.len(),
            tag = request.tag().unwrap_or_default(),
            "converted file"
        );
        Ok(batch)
    }

    /// Load the collection, append `batch` and save it back.
    ///
    /// Returns the number of records appended.
    pub fn append(&self, batch: RecordBatch) -> Result<usize> {
        self.merge(batch).map(|summary| summary.records)
    }

    /// Convert the request's file and append the records in one go.
    ///
    /// Nothing is written unless the whole file converted.
    pub fn import(&self, request: &ImportRequest) -> Result<ImportSummary> {
        let batch = self.convert(request)?;
        if batch.is_empty() {
            warn!(file = %request.import_file().display(), "no records found");
        }
        self.merge(batch)
    }

    fn merge(&self, batch: RecordBatch) -> Result<ImportSummary> {
        let timer = OperationTimer::start("append");
        let file_kind = batch.file_kind();

        let mut collection = self.store.load_or_default().inspect_err(|err| {
            self.metrics.record_error(err, "load");
        })?;
        let records = collection.append(batch);
        self.store.save(&collection).inspect_err(|err| {
            self.metrics.record_error(err, "save");
        })?;

        self.metrics.record_append(file_kind, records);
        timer.finish();
        debug!(
            file_kind = %file_kind,
            records,
            calls = collection.calls.len(),
            sms = collection.sms.len(),
            "records appended"
        );

        Ok(ImportSummary {
            file_kind,
            records,
            total_calls: collection.calls.len(),
            total_sms: collection.sms.len(),
        })
    }
}
