use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
