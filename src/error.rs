use thiserror::Error;

/// Which half of a proof verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationKind {
    Membership,
    Consistency,
}

impl std::fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationKind::Membership => write!(f, "membership"),
            VerificationKind::Consistency => write!(f, "consistency"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("canonicalization error: {0}")]
    CanonicalizationError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("verification failed: {0}")]
    VerificationError(VerificationKind),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        AuditError::TransportError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
