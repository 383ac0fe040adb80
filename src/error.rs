use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Which user action produced an error; selects the fallback wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Predict,
    Save,
}

#[derive(Debug, Error, Diagnostic)]
pub enum KcatError {
    #[error("{message}")]
    #[diagnostic(code(kcat::validation))]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("login expired (HTTP 401)")]
    #[diagnostic(
        code(kcat::auth_expired),
        help("log in again with `kcat-hub login`")
    )]
    AuthExpired,

    #[error("insufficient permissions (HTTP 403)")]
    #[diagnostic(code(kcat::auth_forbidden))]
    AuthForbidden,

    #[error(
        "upstream service returned status {status}: {}",
        .message.as_deref().unwrap_or("no error details")
    )]
    #[diagnostic(code(kcat::upstream))]
    Upstream {
        status: u16,
        message: Option<String>,
    },

    #[error("cannot reach server: {0}")]
    #[diagnostic(code(kcat::network))]
    Network(String),

    #[error("unexpected response body: {0}")]
    MalformedResponse(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KcatError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        KcatError::Validation {
            message: format!("missing required field(s): {}", fields.join(", ")),
            fields: fields.iter().map(|field| field.to_string()).collect(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        KcatError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Only an expired login tears the session down; 403 keeps it.
    pub fn clears_session(&self) -> bool {
        matches!(self, KcatError::AuthExpired)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, KcatError::AuthExpired | KcatError::AuthForbidden)
    }

    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            KcatError::Validation { message, .. } => message.clone(),
            KcatError::AuthExpired => "Your login has expired, please log in again".to_string(),
            KcatError::AuthForbidden => {
                "Insufficient permissions, please confirm you are logged in".to_string()
            }
            KcatError::Upstream {
                message: Some(message),
                ..
            } => match operation {
                Operation::Save => format!("Failed to save to database: {message}"),
                _ => message.clone(),
            },
            KcatError::Upstream { message: None, .. } | KcatError::MalformedResponse(_) => {
                generic_message(operation).to_string()
            }
            KcatError::Network(_) => {
                "Cannot reach the server, please check your network connection".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn generic_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Search => "An error occurred while searching",
        Operation::Predict => "An error occurred during prediction",
        Operation::Save => "Failed to save to database",
    }
}
