use thiserror::Error;

#[derive(Error, Debug)]
pub enum PkgbumpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version report parsing failed: {0}")]
    ReportParsing(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PkgbumpError>;
