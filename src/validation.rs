use std::path::Path;

use crate::error::{ImportError, Result};

/// Validation of the parameters handed to an import
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the CSV file to import
    pub fn validate_import_file(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(ImportError::InvalidArgument("Import file path cannot be empty".to_string()));
        }

        if !path.exists() {
            return Err(ImportError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        if !path.is_file() {
            return Err(ImportError::InvalidArgument(format!(
                "Import path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Validate the collection file path; the file itself may not exist yet
    pub fn validate_collection_file(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(ImportError::InvalidArgument("Collection file path cannot be empty".to_string()));
        }

        if path.is_dir() {
            return Err(ImportError::InvalidArgument(format!(
                "Collection path is a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }
}
