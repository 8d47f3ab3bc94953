use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Locale the document is written in; it gets the identity translation.
    pub source_locale: String,
    /// Locales to translate into. Empty means discover `*.<locale>.po`
    /// files next to the input document.
    pub locales: Vec<String>,
    /// Namespace prefix of the generated arithmetic macros.
    pub command_prefix: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            source_locale: "en".to_string(),
            locales: Vec::new(),
            command_prefix: tex_gettext_core::DEFAULT_PREFIX.to_string(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> Result<CliConfig, CliError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(CliConfig::default())
    }
}
