use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Trash item not found: {0}")]
    TrashItemNotFound(String),

    #[error("Share not found: {0}")]
    ShareNotFound(String),

    #[error("Shared file no longer exists: {0}")]
    ShareTargetMissing(String),

    #[error("Shared item is a directory and cannot be downloaded: {0}")]
    ShareIsDirectory(String),

    #[error("Unknown job: {0}")]
    JobNotFound(String),

    #[error("Could not generate a free id after {0} attempts, retry later")]
    IdExhausted(usize),

    #[error("Archive engine is shut down")]
    EngineStopped,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ShelfError {
    /// Logical "nothing there" conditions, as opposed to I/O failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ShelfError::NotFound(_)
                | ShelfError::TrashItemNotFound(_)
                | ShelfError::ShareNotFound(_)
                | ShelfError::JobNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
