//! The external text-to-speech program.
//!
//! The engine only needs one operation from a synthesizer: speak this text in
//! this voice and return once the audio has finished. [`SynthesisBackend`]
//! is that seam; [`ProcessBackend`] implements it by running a program once
//! per segment.

use crate::config::SpeechSettings;
use crate::error::VoiceError;
use async_trait::async_trait;
use narrator_types::VoiceProfile;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Renders one segment of text to audible speech.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Speaks `text` in `voice`, returning when playback has finished.
    async fn render(&self, text: &str, voice: &VoiceProfile) -> Result<(), VoiceError>;
}

/// How text and voice are passed to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationShape {
    /// One argument: the text wrapped in voice/pitch/rate/volume markup.
    Markup,
    /// Two arguments: the voice name, then the plain text.
    VoiceAndText,
}

impl InvocationShape {
    /// Gender-specific voices pass the voice by name; otherwise the voice is
    /// selected through markup.
    pub fn for_settings(settings: &SpeechSettings) -> Self {
        if settings.use_gender_specific_voices {
            Self::VoiceAndText
        } else {
            Self::Markup
        }
    }
}

/// Neutralizes characters that could alter the invoked command.
///
/// Quotes, backticks, backslashes and `$` are dropped; command separators,
/// redirections and control characters become spaces.
pub fn sanitize_argument(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '"' | '`' | '\\' | '$' => None,
            ';' | '|' | '&' | '<' | '>' => Some(' '),
            c if c.is_control() => Some(' '),
            c => Some(c),
        })
        .collect()
}

/// Wraps already sanitized text in voice selection markup.
pub fn voice_markup(text: &str, voice: &VoiceProfile) -> String {
    format!(
        r#"<voice required="Name={}"><pitch absmiddle="{}"/><rate absspeed="{}"/><volume level="{}"/>{}</voice>"#,
        sanitize_argument(&voice.name),
        voice.pitch,
        voice.rate,
        voice.volume,
        text
    )
}

/// Builds the argument list for one invocation.
pub fn command_args(shape: InvocationShape, text: &str, voice: &VoiceProfile) -> Vec<String> {
    let text = sanitize_argument(text);
    match shape {
        InvocationShape::Markup => vec![voice_markup(&text, voice)],
        InvocationShape::VoiceAndText => vec![sanitize_argument(&voice.name), text],
    }
}

/// Runs an external program once per segment.
///
/// The program is started directly, never through a shell, and awaited
/// asynchronously so the calling task yields while audio plays.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: PathBuf,
    shape: InvocationShape,
    log_commands: bool,
    timeout: Option<Duration>,
}

impl ProcessBackend {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            shape: InvocationShape::VoiceAndText,
            log_commands: false,
            timeout: None,
        }
    }

    /// Configures program, argument shape, command logging and timeout from
    /// the settings.
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self {
            program: settings.backend.program.clone(),
            shape: InvocationShape::for_settings(settings),
            log_commands: settings.log_voiced_lines,
            timeout: settings
                .backend
                .timeout_secs
                .map(|secs| Duration::from_secs(secs.max(1))),
        }
    }

    pub fn with_shape(mut self, shape: InvocationShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_command_logging(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    /// Kills the program and fails with `Timeout` when one render runs
    /// longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn shape(&self) -> InvocationShape {
        self.shape
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl SynthesisBackend for ProcessBackend {
    async fn render(&self, text: &str, voice: &VoiceProfile) -> Result<(), VoiceError> {
        if sanitize_argument(text).trim().is_empty() {
            return Ok(());
        }
        let args = command_args(self.shape, text, voice);

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if self.log_commands {
            tracing::info!(
                program = %self.program.display(),
                args = ?args,
                "final speak command"
            );
        }

        let child = command
            .spawn()
            .map_err(|source| VoiceError::BackendUnavailable {
                program: self.program.display().to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| VoiceError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(VoiceError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_types::VoiceKind;

    fn alex() -> VoiceProfile {
        VoiceProfile {
            kind: VoiceKind::Male,
            name: "Alex".to_string(),
            pitch: -2,
            rate: 3,
            volume: 80,
        }
    }

    #[test]
    fn sanitize_neutralizes_shell_metacharacters() {
        assert_eq!(
            sanitize_argument(r#"say "hi" `id` $HOME \n; ls | cat & x > y"#),
            "say hi id HOME n  ls   cat   x   y"
        );
        assert_eq!(sanitize_argument("line\nbreak\ttab"), "line break tab");
        assert_eq!(sanitize_argument("don't stop"), "don't stop");
    }

    #[test]
    fn voice_and_text_shape_has_two_arguments() {
        assert_eq!(
            command_args(InvocationShape::VoiceAndText, "Hello \"there\"", &alex()),
            vec!["Alex".to_string(), "Hello there".to_string()]
        );
    }

    #[test]
    fn markup_shape_has_one_argument() {
        let args = command_args(InvocationShape::Markup, "Hi <b>", &alex());
        assert_eq!(
            args,
            vec![r#"<voice required="Name=Alex"><pitch absmiddle="-2"/><rate absspeed="3"/><volume level="80"/>Hi  b </voice>"#.to_string()]
        );
    }

    #[test]
    fn shape_follows_gender_setting() {
        let mut settings = SpeechSettings::default();
        assert_eq!(InvocationShape::for_settings(&settings), InvocationShape::VoiceAndText);
        settings.use_gender_specific_voices = false;
        assert_eq!(InvocationShape::for_settings(&settings), InvocationShape::Markup);
        let backend = ProcessBackend::from_settings(&settings);
        assert_eq!(backend.shape(), InvocationShape::Markup);
        assert_eq!(backend.program(), Path::new("say"));
    }

    #[test]
    fn default_settings_never_cut_speech_short() {
        let backend = ProcessBackend::from_settings(&SpeechSettings::default());
        assert_eq!(backend.timeout(), None);
        assert_eq!(ProcessBackend::new("say").timeout(), None);
    }

    #[test]
    fn configured_timeout_is_applied() {
        let mut settings = SpeechSettings::default();
        settings.backend.timeout_secs = Some(90);
        let backend = ProcessBackend::from_settings(&settings);
        assert_eq!(backend.timeout(), Some(Duration::from_secs(90)));
    }
}
