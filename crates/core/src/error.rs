#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown export format: {0}")]
    InvalidFormat(String),

    #[error("Unknown week convention: {0}")]
    InvalidConvention(String),

    #[error("Invalid week: {year}-W{week:02}")]
    InvalidWeek { year: i32, week: u32 },

    #[error("Invalid draft scope: {0}")]
    InvalidScope(String),

    #[error("Malformed draft: {0}")]
    Draft(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
