//! Shared types for the narrator workspace.
//!
//! This crate holds the small closed vocabularies every other crate speaks:
//! speaker genders, the three voice kinds, audio channels and their levels.
//! The engine crate (`narrator-voice`) and the binary depend on these
//! definitions.

use serde::{Deserialize, Serialize};

pub mod voice;
pub use voice::{VoiceProfile, VoiceSettings};

/// Gender of the character who is speaking a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    /// No speaker, an unsexed creature, or a narration context.
    #[default]
    Unknown,
}

impl Gender {
    /// Returns the string label for this gender.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unknown => "None",
        }
    }
}

/// The three voices a line can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceKind {
    #[default]
    Narrator,
    Female,
    Male,
}

impl VoiceKind {
    /// Maps a speaker gender onto a voice.
    ///
    /// No wildcard arm: a new `Gender` variant must be given a voice here.
    pub fn for_gender(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self::Male,
            Gender::Female => Self::Female,
            Gender::Unknown => Self::Narrator,
        }
    }

    /// Returns the string label for this voice.
    pub fn label(self) -> &'static str {
        match self {
            Self::Narrator => "Narrator",
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }

    /// All voice kinds, in settings order.
    pub const ALL: [VoiceKind; 3] = [Self::Narrator, Self::Female, Self::Male];
}

/// Host audio channels that compete with narrated speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannel {
    /// Character voice-over.
    Voice,
    /// Dialogue barks and cutscene speech.
    Dialogue,
    Music,
}

impl AudioChannel {
    /// The channels lowered while speech plays, in capture order.
    pub const DUCKED: [AudioChannel; 3] = [Self::Voice, Self::Dialogue, Self::Music];

    pub fn label(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Dialogue => "dialogue",
            Self::Music => "music",
        }
    }
}

/// A level for each ducked channel, in the host's `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelLevels {
    pub voice: f32,
    pub dialogue: f32,
    pub music: f32,
}

impl ChannelLevels {
    pub fn get(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Voice => self.voice,
            AudioChannel::Dialogue => self.dialogue,
            AudioChannel::Music => self.music,
        }
    }

    pub fn set(&mut self, channel: AudioChannel, level: f32) {
        match channel {
            AudioChannel::Voice => self.voice = level,
            AudioChannel::Dialogue => self.dialogue = level,
            AudioChannel::Music => self.music = level,
        }
    }
}
