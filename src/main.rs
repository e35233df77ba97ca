use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

use imazing_to_sbr::config::{AppConfig, LoggingConfig};
use imazing_to_sbr::logging::init_logging;
use imazing_to_sbr::validation::InputValidator;
use imazing_to_sbr::{ImportError, ImportRequest, ImportService, JsonFileStore};

/// Append an iMazing call or message export to a collection file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the file to import
    #[arg(long)]
    import_file: Option<PathBuf>,

    /// Path to the collection file to append to
    #[arg(long)]
    collection_file: Option<PathBuf>,

    /// Free-text tag attached to the import's log events
    #[arg(long)]
    tag: Option<String>,

    /// Log level (0=warn, 1=info, 2=debug)
    #[arg(long)]
    log_level: Option<u8>,

    /// Additional JSON log file, rotated daily
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Configuration file layered over config/default and config/local
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags take precedence over configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(level) = self.log_level {
            config.logging.level = LoggingConfig::level_for_verbosity(level).to_string();
        }
        if let Some(path) = &self.log_file {
            config.logging.file_path = Some(path.display().to_string());
        }
        if let Some(path) = &self.import_file {
            config.import.import_file = Some(path.display().to_string());
        }
        if let Some(path) = &self.collection_file {
            config.import.collection_file = Some(path.display().to_string());
        }
        if let Some(tag) = &self.tag {
            config.import.tag = Some(tag.clone());
        }
    }
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let mut config = AppConfig::load_with(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let guard = init_logging(&config.logging)?;
    info!("starting application");
    debug!(
        import_file = config.import.import_file.as_deref().unwrap_or_default(),
        collection_file = config.import.collection_file.as_deref().unwrap_or_default(),
        tag = config.import.tag.as_deref().unwrap_or_default(),
        "input"
    );

    if let Err(err) = run(&config) {
        error!(err = %format!("{err:#}"), duration_ms = start.elapsed().as_millis() as u64, "error running application");
        drop(guard);
        std::process::exit(1);
    }

    info!(duration_ms = start.elapsed().as_millis() as u64, "application stopped");
    Ok(())
}

fn run(config: &AppConfig) -> Result<()> {
    let import_file = config
        .import
        .import_file
        .as_deref()
        .context("no import file given, use --import-file")?;
    let collection_file = PathBuf::from(
        config
            .import
            .collection_file
            .as_deref()
            .context("no collection file given, use --collection-file")?,
    );
    InputValidator::validate_collection_file(&collection_file)?;

    let request = ImportRequest::new(import_file, config.import.tag.clone())
        .with_context(|| format!("cannot import {import_file}"))?;
    let service = ImportService::new(Box::new(JsonFileStore::new(&collection_file)));

    let summary = service.import(&request).map_err(|err: ImportError| {
        let file_kind = err.file_kind();
        anyhow::Error::new(err).context(format!("import of {import_file} failed (file type {file_kind})"))
    })?;

    info!(
        file_type = %summary.file_kind,
        records = summary.records,
        calls = summary.total_calls,
        sms = summary.total_sms,
        collection = %collection_file.display(),
        "import finished"
    );
    Ok(())
}
