use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use tex_gettext_core::{generate_template, ScanError};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ExtractCommandError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Scans the document for translatable markers and writes a PO
/// template, by default `<stem>.pot` next to the input.
pub fn run_extract(options: &ExtractOptions) -> Result<PathBuf, ExtractCommandError> {
    let source = fs::read_to_string(&options.input)?;
    let template = generate_template(&source)?;
    let out_path = options
        .output
        .clone()
        .unwrap_or_else(|| options.input.with_extension("pot"));
    fs::write(&out_path, template)?;
    info!(path = %out_path.display(), "wrote catalog template");
    Ok(out_path)
}
