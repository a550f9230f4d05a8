use crate::event::{DecodeError, FeatureId};
use std::fmt;

/// Errors surfaced by the synchronization core.
///
/// Each one is terminal for the frame (or connect attempt) that caused it;
/// none of them tears down the session or touches the entity table.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Channel-level failure: bad URL, refused or dropped connection
    Transport(String),
    /// Frame text is not valid JSON
    MalformedPayload { raw: String },
    /// Valid JSON that matches no known message kind
    UnknownShape { pretty: String },
    /// Event refers to a geofence that is not loaded locally
    UnresolvedReference(FeatureId),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Transport(reason) => write!(f, "transport error: {}", reason),
            SyncError::MalformedPayload { raw } => {
                write!(f, "unable to parse payload as JSON: {}", raw)
            }
            SyncError::UnknownShape { pretty } => {
                write!(f, "unknown JSON object on channel: {}", pretty)
            }
            SyncError::UnresolvedReference(id) => {
                write!(f, "geofence {} is not loaded", id)
            }
        }
    }
}

impl std::error::Error for SyncError {}

impl From<DecodeError> for SyncError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::MalformedPayload { raw } => SyncError::MalformedPayload { raw },
            DecodeError::UnknownShape { pretty } => SyncError::UnknownShape { pretty },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_convert() {
        let err: SyncError = DecodeError::MalformedPayload {
            raw: "not json".to_string(),
        }
        .into();
        assert_eq!(
            err,
            SyncError::MalformedPayload {
                raw: "not json".to_string()
            }
        );
        assert_eq!(err.to_string(), "unable to parse payload as JSON: not json");
    }

    #[test]
    fn test_unresolved_reference_display() {
        let err = SyncError::UnresolvedReference(FeatureId::Number(3));
        assert_eq!(err.to_string(), "geofence 3 is not loaded");
    }
}
