use narrator_types::{VoiceKind, VoiceSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

fn default_true() -> bool {
    true
}

fn default_duck_factor() -> f32 {
    0.3
}

fn default_backend_program() -> PathBuf {
    PathBuf::from("say")
}

/// Everything the engine reads from the user's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    #[serde(default = "default_narrator_voice")]
    pub narrator: VoiceSettings,
    #[serde(default = "default_female_voice")]
    pub female: VoiceSettings,
    #[serde(default = "default_male_voice")]
    pub male: VoiceSettings,

    /// Render each speaker with their own voice and split narration spans
    /// into the narrator voice. Also selects the backend argument shape.
    #[serde(default = "default_true")]
    pub use_gender_specific_voices: bool,

    #[serde(default)]
    pub ducking: DuckingConfig,

    /// Log every spoken line and the exact backend command line.
    #[serde(default)]
    pub log_voiced_lines: bool,

    /// Speak the short overhead barks of characters.
    #[serde(default = "default_true")]
    pub play_barks: bool,

    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_narrator_voice() -> VoiceSettings {
    VoiceSettings::named("Daniel")
}

fn default_female_voice() -> VoiceSettings {
    VoiceSettings::named("Samantha")
}

fn default_male_voice() -> VoiceSettings {
    VoiceSettings::named("Alex")
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            narrator: default_narrator_voice(),
            female: default_female_voice(),
            male: default_male_voice(),
            use_gender_specific_voices: true,
            ducking: DuckingConfig::default(),
            log_voiced_lines: false,
            play_barks: true,
            backend: BackendConfig::default(),
        }
    }
}

impl SpeechSettings {
    /// Returns the configured settings for one voice.
    pub fn voice(&self, kind: VoiceKind) -> &VoiceSettings {
        match kind {
            VoiceKind::Narrator => &self.narrator,
            VoiceKind::Female => &self.female,
            VoiceKind::Male => &self.male,
        }
    }
}

/// Lowering of competing audio while speech plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuckingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Multiplier applied to each channel level, in `[0, 1]`. Lower values
    /// attenuate more; `0.0` silences the channels, `1.0` leaves them alone.
    #[serde(default = "default_duck_factor")]
    pub factor: f32,
}

impl Default for DuckingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: default_duck_factor(),
        }
    }
}

impl DuckingConfig {
    /// The factor clamped into `[0, 1]`; NaN counts as no attenuation.
    pub fn effective_factor(&self) -> f32 {
        if self.factor.is_nan() {
            1.0
        } else {
            self.factor.clamp(0.0, 1.0)
        }
    }
}

/// The external synthesis program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_program")]
    pub program: PathBuf,
    /// Upper bound on one segment's render. Unset means wait for the
    /// program however long the audio runs.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_backend_program(),
            timeout_secs: None,
        }
    }
}

/// Shared, replaceable settings snapshot.
///
/// Readers take an `Arc` of the current snapshot and keep using it; a
/// `replace` never mutates a snapshot somebody already holds. Uses
/// `std::sync::RwLock` because the lock is only held to clone an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    current: Arc<RwLock<Arc<SpeechSettings>>>,
}

impl SettingsHandle {
    pub fn new(settings: SpeechSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn snapshot(&self) -> Arc<SpeechSettings> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, settings: SpeechSettings) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(settings);
    }
}
