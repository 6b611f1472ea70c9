//! Voice selection.

use crate::config::{SettingsHandle, SpeechSettings};
use narrator_types::{Gender, VoiceKind, VoiceProfile};

/// Resolves the profile for a voice from one settings snapshot.
pub fn resolve_voice(settings: &SpeechSettings, kind: VoiceKind) -> VoiceProfile {
    VoiceProfile::from_settings(kind, settings.voice(kind))
}

/// Male speakers get the male voice, female speakers the female voice and
/// everything else the narrator.
pub fn select_voice(settings: &SpeechSettings, gender: Gender) -> VoiceProfile {
    resolve_voice(settings, VoiceKind::for_gender(gender))
}

/// Selects voices against the live settings.
///
/// Each call reads the snapshot current at that moment, so a profile
/// resolved for an earlier segment is never changed by a later settings
/// update.
#[derive(Debug, Clone, Default)]
pub struct VoiceSelector {
    settings: SettingsHandle,
}

impl VoiceSelector {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn select(&self, gender: Gender) -> VoiceProfile {
        select_voice(&self.settings.snapshot(), gender)
    }

    pub fn resolve(&self, kind: VoiceKind) -> VoiceProfile {
        resolve_voice(&self.settings.snapshot(), kind)
    }
}
