use thiserror::Error;

#[derive(Error, Debug)]
pub enum QzError {
    #[error("Arena exhausted: requested {requested} bytes, {remaining} remaining")]
    ArenaExhausted { requested: usize, remaining: usize },
    #[error("Frame too large: {len} bytes exceeds limit {limit}")]
    FrameTooLarge { len: usize, limit: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Bad magic bytes in compressed stream")]
    BadMagic,
    #[error("Unsupported stream version: {0}")]
    UnsupportedVersion(u16),
    #[error("Compressed stream truncated: {0}")]
    TruncatedStream(String),
    #[error("Length mismatch: header declares {expected} bytes, frames cover {got}")]
    LengthMismatch { expected: u64, got: u64 },
    #[error("Corrupt stream: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QzError>;
