//! Loading and saving the collection file.
//!
//! The file is read once, mutated in memory and rewritten in full. There is
//! no locking, so two imports into the same collection at the same time can
//! lose each other's records.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::models::Collection;

/// Storage seam for the persisted collection
#[cfg_attr(test, mockall::automock)]
pub trait CollectionStore {
    /// Load the stored collection, or an empty one if nothing is stored yet
    fn load_or_default(&self) -> Result<Collection>;
    /// Replace the stored collection
    fn save(&self, collection: &Collection) -> Result<()>;
}

/// Collection kept as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the collection file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CollectionStore for JsonFileStore {
    fn load_or_default(&self) -> Result<Collection> {
        load_or_default(&self.path)
    }

    fn save(&self, collection: &Collection) -> Result<()> {
        save(collection, &self.path)
    }
}

/// Read the collection at `path`, or start an empty one if the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Collection> {
    if !path.exists() {
        info!(collection = %path.display(), "collection file not found, starting empty collection");
        return Ok(Collection::default());
    }

    let load_error = |source: Box<dyn std::error::Error + Send + Sync>| ImportError::CollectionLoad {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| load_error(e.into()))?;
    let collection: Collection = serde_json::from_reader(BufReader::new(file)).map_err(|e| load_error(e.into()))?;

    debug!(
        collection = %path.display(),
        calls = collection.calls.len(),
        sms = collection.sms.len(),
        mms = collection.mms.len(),
        "collection loaded"
    );
    Ok(collection)
}

/// Write `collection` to `path`, replacing any existing file.
pub fn save(collection: &Collection, path: &Path) -> Result<()> {
    let save_error = |source: Box<dyn std::error::Error + Send + Sync>| ImportError::CollectionSave {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| save_error(e.into()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection).map_err(|e| save_error(e.into()))?;
    writeln!(writer).map_err(|e| save_error(e.into()))?;
    writer.flush().map_err(|e| save_error(e.into()))?;

    debug!(
        collection = %path.display(),
        calls = collection.calls.len(),
        sms = collection.sms.len(),
        "collection saved"
    );
    Ok(())
}
