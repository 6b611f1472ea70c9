//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use narrator_types::{AudioChannel, ChannelLevels, VoiceKind, VoiceProfile};
use narrator_voice::{MemoryMixer, SynthesisBackend, VoiceError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const START_LEVELS: ChannelLevels = ChannelLevels {
    voice: 0.9,
    dialogue: 0.7,
    music: 0.55,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start {
        index: usize,
        text: String,
        voice: VoiceKind,
        voice_name: String,
        music_level: f32,
    },
    Finish {
        index: usize,
    },
}

/// Backend that records every render, takes `render_time` of (virtual) time
/// per segment, and fails on chosen call indices.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    next: Mutex<usize>,
    render_time: Duration,
    fail_on: HashSet<usize>,
    fatal_on: HashSet<usize>,
    mixer: Option<Arc<MemoryMixer>>,
}

impl RecordingBackend {
    pub fn new(render_time: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next: Mutex::new(0),
            render_time,
            fail_on: HashSet::new(),
            fatal_on: HashSet::new(),
            mixer: None,
        }
    }

    pub fn failing_on(mut self, index: usize) -> Self {
        self.fail_on.insert(index);
        self
    }

    pub fn fatal_on(mut self, index: usize) -> Self {
        self.fatal_on.insert(index);
        self
    }

    pub fn observing(mut self, mixer: Arc<MemoryMixer>) -> Self {
        self.mixer = Some(mixer);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts passed to the backend, trimmed.
    pub fn rendered_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Start { text, .. } => Some(text.trim().to_string()),
                Call::Finish { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl SynthesisBackend for RecordingBackend {
    async fn render(&self, text: &str, voice: &VoiceProfile) -> Result<(), VoiceError> {
        let index = {
            let mut next = self.next.lock().unwrap();
            let index = *next;
            *next += 1;
            index
        };
        let music_level = self
            .mixer
            .as_ref()
            .map(|m| m.levels().get(AudioChannel::Music))
            .unwrap_or(-1.0);
        self.calls.lock().unwrap().push(Call::Start {
            index,
            text: text.to_string(),
            voice: voice.kind,
            voice_name: voice.name.clone(),
            music_level,
        });

        if self.fatal_on.contains(&index) {
            return Err(VoiceError::BackendUnavailable {
                program: "say".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        tokio::time::sleep(self.render_time).await;
        self.calls.lock().unwrap().push(Call::Finish { index });

        if self.fail_on.contains(&index) {
            return Err(VoiceError::NonZeroExit {
                code: Some(1),
                stderr: "voice not installed".to_string(),
            });
        }
        Ok(())
    }
}

pub fn mixer() -> Arc<MemoryMixer> {
    Arc::new(MemoryMixer::new(START_LEVELS))
}

pub fn assert_levels_restored(mixer: &MemoryMixer) {
    let levels = mixer.levels();
    for channel in AudioChannel::DUCKED {
        assert_eq!(
            levels.get(channel).to_bits(),
            START_LEVELS.get(channel).to_bits(),
            "{channel:?} not restored"
        );
    }
}
