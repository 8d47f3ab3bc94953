use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use tex_gettext_core::{TranslateError, Translation};

use crate::config::load_config_or_default;
use crate::dates::ChronoDates;
use crate::error::CliError;
use crate::locales::{find_translations, LocaleBinding};

#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub input: PathBuf,
    pub locales: Vec<String>,
    pub po_dir: Option<PathBuf>,
    pub config_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum TranslateCommandError {
    #[error(transparent)]
    Config(#[from] CliError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error("no locales requested and no catalogs found next to {0}")]
    NoLocales(PathBuf),
}

/// Translates the input document once per resolved locale and writes
/// each result next to the input as `<stem>.<locale>.<ext>`.
pub fn run_translate(
    options: &TranslateOptions,
) -> Result<Vec<PathBuf>, TranslateCommandError> {
    let config = load_config_or_default(&options.config_path)?;
    let dir = options
        .po_dir
        .clone()
        .or_else(|| options.input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let requested = if options.locales.is_empty() {
        config.locales.clone()
    } else {
        options.locales.clone()
    };
    let bindings = find_translations(&options.input, &dir, &requested)?;
    if bindings.is_empty() {
        return Err(TranslateCommandError::NoLocales(options.input.clone()));
    }

    let source = fs::read_to_string(&options.input)?;
    let mut written = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        let output = translate_one(binding, &source, &config.command_prefix)?;
        let out_path = output_path(&options.input, &binding.locale);
        fs::write(&out_path, output)?;
        info!(locale = %binding.locale, path = %out_path.display(), "wrote translated document");
        written.push(out_path);
    }
    Ok(written)
}

fn translate_one(
    binding: &LocaleBinding,
    source: &str,
    prefix: &str,
) -> Result<String, TranslateCommandError> {
    let mut translation = if binding.exists {
        Translation::with_catalog_file(&binding.locale, binding.po_path.clone())
    } else {
        warn!(
            locale = %binding.locale,
            path = %binding.po_path.display(),
            "no catalog file, passing text through unchanged"
        );
        Translation::source(&binding.locale)
    }
    .with_prefix(prefix);
    let dates = ChronoDates::new(&binding.locale);
    Ok(translation.translate(source, &dates)?)
}

/// Inserts the locale tag before the input's extension:
/// `paper.tex` + `ru` gives `paper.ru.tex`.
fn output_path(input: &Path, locale: &str) -> PathBuf {
    let stem = crate::locales::document_stem(input);
    let extension = input
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tex".to_string());
    input.with_file_name(format!("{stem}.{locale}.{extension}"))
}
