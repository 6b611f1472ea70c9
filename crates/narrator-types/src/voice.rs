//! Voice profile and per-voice settings definitions.
//!
//! A `VoiceSettings` is what the user configures for one of the three voices.
//! A `VoiceProfile` is that configuration resolved for a concrete segment:
//! the kind it was selected for plus a copy of the settings at that moment.

use crate::VoiceKind;
use serde::{Deserialize, Serialize};

/// User-facing settings for one voice.
///
/// Pitch and rate use the `-10..=10` scale of SAPI-style voice markup, volume
/// uses `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Name of the installed system voice.
    pub name: String,
    pub pitch: i32,
    pub rate: i32,
    pub volume: i32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            pitch: 0,
            rate: 0,
            volume: 100,
        }
    }
}

impl VoiceSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A voice resolved for rendering one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Which of the three voices this profile was resolved for.
    pub kind: VoiceKind,
    /// Name of the installed system voice.
    pub name: String,
    pub pitch: i32,
    pub rate: i32,
    pub volume: i32,
}

impl VoiceProfile {
    /// Resolves a profile from the settings of one voice, clamping values
    /// into their markup ranges.
    pub fn from_settings(kind: VoiceKind, settings: &VoiceSettings) -> Self {
        Self {
            kind,
            name: settings.name.clone(),
            pitch: settings.pitch.clamp(-10, 10),
            rate: settings.rate.clamp(-10, 10),
            volume: settings.volume.clamp(0, 100),
        }
    }
}
