#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("could not parse {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl AuditError {
    pub(crate) fn parse(what: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
