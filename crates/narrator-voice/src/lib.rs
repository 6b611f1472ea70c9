//! Narration engine for in-game dialogue.
//!
//! Raw, annotated text goes through the [`TextNormalizer`], is cut into
//! [`DialogueSegment`]s by [`split`], and is played by the
//! [`UtteranceScheduler`]: one [`DuckingScope`] around the whole utterance,
//! one [`SynthesisBackend`] render per segment in order, and a pause after
//! each segment. [`SpeechEngine`] ties these together behind fire-and-forget
//! entry points for host hooks.
//!
//! Host integration points are traits: [`SynthesisBackend`] for the speech
//! program and [`AudioMixer`] for the game's audio levels.

pub mod backend;
pub mod config;
pub mod dictionary;
pub mod duck;
pub mod engine;
pub mod error;
mod markup;
pub mod normalize;
pub mod scheduler;
pub mod select;
pub mod split;

pub use backend::{InvocationShape, ProcessBackend, SynthesisBackend};
pub use config::{BackendConfig, DuckingConfig, SettingsHandle, SpeechSettings};
pub use dictionary::{DictionaryStore, PhoneticDictionary, DICTIONARY_FILE_NAME};
pub use duck::{AudioMixer, DuckState, Ducker, DuckingScope, MemoryMixer};
pub use engine::{BarkSpeaker, SpeechEngine};
pub use error::VoiceError;
pub use markup::NARRATION_COLOR;
pub use normalize::{spoken_length, TextNormalizer};
pub use scheduler::{PlaybackReport, UtteranceScheduler};
pub use select::{resolve_voice, select_voice, VoiceSelector};
pub use split::{split, DialogueSegment, Utterance, DEFAULT_PAUSE_MS};
