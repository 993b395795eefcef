use thiserror::Error;

/// Failure taxonomy for every catalog operation.
///
/// Only [`CatalogError::Authorization`] has behavioural meaning for the core:
/// it is routed into session recovery and never shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Session rejected by catalog (HTTP {status})")]
    Authorization { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed catalog response: {0}")]
    Decoding(String),
}

impl CatalogError {
    /// 401 and 403 are the catalog's "session is not usable" answers.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => CatalogError::Authorization { status },
            _ => CatalogError::Transport(format!(
                "HTTP {status}: {}",
                message.into()
            )),
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, CatalogError::Authorization { .. })
    }

    /// Text suitable for a scoped, dismissible error banner.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Authorization { .. } => {
                "Your session has expired".to_string()
            }
            CatalogError::Transport(msg) => msg.clone(),
            // Decoding failures look the same as transport failures to users
            CatalogError::Decoding(_) => {
                "The catalog returned an unexpected response".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return CatalogError::Decoding(err.to_string());
        }
        if let Some(status) = err.status() {
            return CatalogError::from_status(status.as_u16(), err.to_string());
        }
        CatalogError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decoding(err.to_string())
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
