use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AV1 error: {0}")]
    Av1(#[from] av1::Av1Error),

    #[error("Recipe error: {0}")]
    Recipe(#[from] toml::de::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Verification failed for {name}: {detail}")]
    VerificationFailed { name: String, detail: String },
}

pub type Result<T> = std::result::Result<T, AppError>;
