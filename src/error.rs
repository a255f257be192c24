//! Bifrost error types

use serde::{Deserialize, Serialize};

/// Bifrost error types
#[derive(Debug, thiserror::Error)]
pub enum BifrostError {
    // Request shape errors (never retried)
    #[error("configuration error: {0}")]
    Configuration(String),

    // Vendor payload errors
    #[error("protocol error: {0}")]
    Protocol(String),

    /// HTTP failure that survived the primary → fallback retry.
    ///
    /// `primary` holds the primary endpoint's failure when this error came
    /// from the fallback attempt.
    #[error("upstream error from {endpoint} ({status}): {body}{}", primary_note(.primary))]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
        primary: Option<Box<BifrostError>>,
    },

    /// Network-level failure talking to the endpoint (connect, TLS, reset).
    #[error("transport error from {endpoint}: {message}{}", primary_note(.primary))]
    Transport {
        endpoint: String,
        message: String,
        primary: Option<Box<BifrostError>>,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),
}

impl BifrostError {
    /// Whether this is the caller-initiated cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BifrostError::Cancelled)
    }

    /// HTTP status of an upstream failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BifrostError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn transport(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        BifrostError::Transport {
            endpoint: endpoint.into(),
            message: err.to_string(),
            primary: None,
        }
    }

    /// The primary endpoint's failure, when this error is the fallback's.
    pub fn primary_error(&self) -> Option<&BifrostError> {
        match self {
            BifrostError::Upstream { primary, .. } | BifrostError::Transport { primary, .. } => {
                primary.as_deref()
            }
            _ => None,
        }
    }

    /// Record the primary attempt's failure on a fallback failure.
    ///
    /// Other variants are returned unchanged.
    pub fn with_primary(mut self, primary_error: BifrostError) -> Self {
        if let BifrostError::Upstream { primary, .. } | BifrostError::Transport { primary, .. } =
            &mut self
        {
            *primary = Some(Box::new(primary_error));
        }
        self
    }
}

fn primary_note(primary: &Option<Box<BifrostError>>) -> String {
    match primary {
        Some(err) => format!(" (after primary failed: {err})"),
        None => String::new(),
    }
}

/// A tool call whose argument string is not valid JSON.
///
/// Scoped to a single function-call part: the rest of the response is
/// still delivered, with this error standing in for the broken call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("invalid arguments for tool call '{name}' ({id}): {message}")]
pub struct ParseError {
    pub id: String,
    pub name: String,
    /// The raw argument string as the vendor sent it.
    pub arguments: String,
    pub message: String,
}

/// Result type alias for Bifrost operations
pub type Result<T> = std::result::Result<T, BifrostError>;
