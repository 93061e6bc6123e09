#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest: {0}")]
    MalformedInput(String),

    #[error("unterminated metadata block: {0}")]
    UnterminatedBlock(String),

    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("skill not found: {0}")]
    NotFound(String),

    #[error("skill already installed: {0}")]
    AlreadyInstalled(String),
}
