use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Geo lookup error: {0}")]
    Geo(#[from] reqwest::Error),

    #[error("Chart error: {0}")]
    Chart(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
