use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    #[error("Malformed pause directive {directive:?}: {reason}")]
    MalformedPauseDirective { directive: String, reason: String },

    #[error("Synthesis backend {program:?} could not be started: {source}")]
    BackendUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Synthesis backend exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Synthesis backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Phonetic dictionary error: {0}")]
    Dictionary(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VoiceError {
    /// Whether this error means no process can be spawned at all, in which
    /// case the rest of the utterance is abandoned.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::BackendUnavailable { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}
