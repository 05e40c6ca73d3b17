use thiserror::Error;

/// Error reported by a player backend for the current source
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{code_name} ({code})")]
pub struct PlaybackException {
    pub code_name: String,
    pub code: i32,
}

impl PlaybackException {
    pub const UNSUPPORTED_TYPE_CODE: i32 = 10002;
    pub const LOAD_TIMEOUT_CODE: i32 = 10003;

    pub fn new(code_name: impl Into<String>, code: i32) -> Self {
        Self {
            code_name: code_name.into(),
            code,
        }
    }

    pub fn unsupported_type() -> Self {
        Self::new("ERROR_UNSUPPORTED_TYPE", Self::UNSUPPORTED_TYPE_CODE)
    }

    /// Raised by the hub when a prepared source never became ready
    pub fn load_timeout() -> Self {
        Self::new("ERROR_LOAD_TIMEOUT", Self::LOAD_TIMEOUT_CODE)
    }

    pub fn is_load_timeout(&self) -> bool {
        *self == Self::load_timeout()
    }
}

#[derive(Error, Debug)]
pub enum VideoPlayerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Probe failed with status {status}: {stderr}")]
    ProbeFailed { status: i32, stderr: String },
    #[error("Invalid probe output: {0}")]
    InvalidProbeOutput(#[from] serde_json::Error),
    #[error("No stream found")]
    NoStream,
}

impl VideoPlayerError {
    /// Map a backend failure into the error event vocabulary
    pub fn to_playback_exception(&self) -> PlaybackException {
        match self {
            VideoPlayerError::IoError(_) => PlaybackException::new("FFPROBE_SPAWN_FAILED", -1),
            VideoPlayerError::ProbeFailed { status, .. } => {
                PlaybackException::new(format!("FFPROBE_EXIT_{status}"), *status)
            }
            VideoPlayerError::InvalidProbeOutput(_) => {
                PlaybackException::new("FFPROBE_INVALID_OUTPUT", -2)
            }
            VideoPlayerError::NoStream => PlaybackException::unsupported_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_timeout_identity() {
        assert!(PlaybackException::load_timeout().is_load_timeout());
        assert!(!PlaybackException::new("ERROR_LOAD_TIMEOUT", 1).is_load_timeout());
        assert!(!PlaybackException::unsupported_type().is_load_timeout());
    }

    #[test]
    fn test_error_mapping() {
        let err = VideoPlayerError::ProbeFailed {
            status: 1,
            stderr: "Connection refused".to_string(),
        };
        assert_eq!(err.to_playback_exception(), PlaybackException::new("FFPROBE_EXIT_1", 1));
        assert_eq!(
            VideoPlayerError::NoStream.to_playback_exception(),
            PlaybackException::unsupported_type()
        );
        assert_eq!(
            PlaybackException::load_timeout().to_string(),
            "ERROR_LOAD_TIMEOUT (10003)"
        );
    }
}
