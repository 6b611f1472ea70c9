//! Public entry points used by host hooks.

use crate::backend::SynthesisBackend;
use crate::config::SettingsHandle;
use crate::dictionary::DictionaryStore;
use crate::duck::{AudioMixer, Ducker};
use crate::error::VoiceError;
use crate::normalize::{spoken_length, TextNormalizer};
use crate::scheduler::{PlaybackReport, UtteranceScheduler};
use crate::split::{split, Utterance};
use narrator_types::{Gender, VoiceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// The character behind an overhead bark, when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarkSpeaker {
    pub name: String,
    pub gender: Gender,
}

impl BarkSpeaker {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
        }
    }
}

/// Narrates text through a synthesis backend.
///
/// Every `speak*` method returns immediately. The utterance plays on a
/// background task whose handle is returned for callers that want to wait;
/// `None` means nothing was scheduled.
#[derive(Debug, Clone)]
pub struct SpeechEngine {
    normalizer: TextNormalizer,
    scheduler: UtteranceScheduler,
    settings: SettingsHandle,
}

impl SpeechEngine {
    pub fn new(
        settings: SettingsHandle,
        dictionary: DictionaryStore,
        backend: Arc<dyn SynthesisBackend>,
        mixer: Arc<dyn AudioMixer>,
    ) -> Self {
        let scheduler = UtteranceScheduler::new(backend, Ducker::new(mixer), settings.clone());
        Self {
            normalizer: TextNormalizer::new(dictionary),
            scheduler,
            settings,
        }
    }

    /// Runs playback on `runtime`. Needed when the engine is built and
    /// called from host threads outside any Tokio runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.scheduler = self.scheduler.with_runtime(runtime);
        self
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn scheduler(&self) -> &UtteranceScheduler {
        &self.scheduler
    }

    /// Re-reads the phonetic dictionary file.
    pub fn reload_dictionary(&self) -> Result<usize, VoiceError> {
        self.normalizer.dictionary().reload()
    }

    /// Builds the utterance for a dialogue line.
    ///
    /// With gender-specific voices the line is spoken in the speaker's voice
    /// and narration spans in the narrator's; without them everything is
    /// spoken by the narrator.
    pub fn prepare_dialog(&self, raw: &str, speaker: Gender) -> Utterance {
        let settings = self.settings.snapshot();
        let normalized = self.normalizer.normalize(raw);
        let default_voice = if settings.use_gender_specific_voices {
            VoiceKind::for_gender(speaker)
        } else {
            VoiceKind::Narrator
        };
        split(&normalized, default_voice, VoiceKind::Narrator)
    }

    /// Builds an utterance spoken entirely in one voice.
    pub fn prepare_as(&self, raw: &str, voice: VoiceKind) -> Utterance {
        let settings = self.settings.snapshot();
        let voice = if settings.use_gender_specific_voices {
            voice
        } else {
            VoiceKind::Narrator
        };
        let normalized = self.normalizer.normalize(raw);
        split(&normalized, voice, voice)
    }

    /// Speaks a dialogue line for a speaker of the given gender.
    pub fn speak(
        &self,
        raw: &str,
        speaker: Gender,
        initial_delay: Duration,
    ) -> Option<JoinHandle<PlaybackReport>> {
        if raw.trim().is_empty() {
            tracing::warn!("no text to speak");
            return None;
        }
        let utterance = self.prepare_dialog(raw, speaker);
        if self.settings.snapshot().log_voiced_lines {
            tracing::info!(
                speaker_gender = speaker.label(),
                spoken_chars = spoken_length(&utterance.text()),
                text = %escape_markup(raw),
                "speak dialog"
            );
        }
        self.schedule(utterance, initial_delay)
    }

    /// Speaks a line in one voice, without narration-span handling.
    pub fn speak_as(&self, text: &str, voice: VoiceKind) -> Option<JoinHandle<PlaybackReport>> {
        if text.trim().is_empty() {
            tracing::warn!("no text to speak");
            return None;
        }
        self.schedule(self.prepare_as(text, voice), Duration::ZERO)
    }

    /// Speaks an overhead bark.
    ///
    /// Does nothing when barks are disabled or the text is blank. A known
    /// speaker's name is read out first and selects the voice; anonymous
    /// barks use the narrator.
    pub fn speak_bark(
        &self,
        speaker: Option<&BarkSpeaker>,
        text: &str,
    ) -> Option<JoinHandle<PlaybackReport>> {
        let settings = self.settings.snapshot();
        if !settings.play_barks || text.trim().is_empty() {
            return None;
        }

        let (line, voice, gender) = match speaker {
            Some(speaker) => (
                format!("{}: {}", speaker.name, text),
                VoiceKind::for_gender(speaker.gender),
                speaker.gender,
            ),
            None => (text.to_string(), VoiceKind::Narrator, Gender::Unknown),
        };

        if settings.log_voiced_lines {
            tracing::info!(
                voice = gender.label(),
                spoken_chars = spoken_length(&line),
                text = %escape_markup(&line),
                "bark"
            );
        }
        self.speak_as(&line, voice)
    }

    /// Speaks a sample line for the settings screen.
    pub fn speak_preview(&self, text: &str, voice: VoiceKind) -> Option<JoinHandle<PlaybackReport>> {
        self.speak_as(text, voice)
    }

    fn schedule(
        &self,
        utterance: Utterance,
        initial_delay: Duration,
    ) -> Option<JoinHandle<PlaybackReport>> {
        if utterance.is_empty() {
            return None;
        }
        self.scheduler.spawn(utterance, initial_delay)
    }
}

/// Escapes angle brackets so logged lines are not taken for markup.
fn escape_markup(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
