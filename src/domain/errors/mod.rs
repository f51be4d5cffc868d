// Domain errors - Failures raised by editor models, rules and ports

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Rejected argument: time, crop, ratio, tracker name, parameter range
    BadArgs(String),
    FileNotFound(String),
    /// The file exists but holds no decodable video
    InvalidFormat(String),
    /// A selection that leaves no frames to export
    InvalidTimeRange(String),
    /// Listing, creating or removing files failed
    FileSystem(String),
    /// Background task or serialization failure
    InternalError(String),
}

impl DomainError {
    /// Whether the user can fix this by changing the command line
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DomainError::BadArgs(_) | DomainError::FileNotFound(_) | DomainError::InvalidTimeRange(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "{}", msg),
            DomainError::FileNotFound(path) => write!(f, "File not found: {}", path),
            DomainError::InvalidFormat(msg) => write!(f, "Not a readable video: {}", msg),
            DomainError::InvalidTimeRange(msg) => write!(f, "Invalid selection: {}", msg),
            DomainError::FileSystem(msg) => write!(f, "{}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors() {
        assert!(DomainError::BadArgs("--skip-frames must be 0..=5".into()).is_user_error());
        assert!(DomainError::FileNotFound("walk.mp4".into()).is_user_error());
        assert!(!DomainError::FileSystem("disk full".into()).is_user_error());
    }

    #[test]
    fn test_display_keeps_path() {
        let err = DomainError::FileNotFound("/videos/walk.mp4".into());
        assert_eq!(err.to_string(), "File not found: /videos/walk.mp4");
    }
}
