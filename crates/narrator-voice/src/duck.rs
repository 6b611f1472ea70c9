//! Scoped lowering of competing audio while speech plays.
//!
//! The host's mixer is reached through the [`AudioMixer`] trait. A
//! [`Ducker`] hands out [`DuckingScope`] guards and reference-counts them:
//! the first live scope captures the current levels and applies the
//! attenuation, later overlapping scopes only join it, and the last scope to
//! be released restores the captured levels. Overlapping utterances therefore
//! never capture each other's ducked levels.

use crate::config::DuckingConfig;
use narrator_types::{AudioChannel, ChannelLevels};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// The host's live audio levels.
pub trait AudioMixer: Send + Sync {
    /// Raw level of a channel in `[0, 1]`.
    fn level(&self, channel: AudioChannel) -> f32;

    /// Whether the user muted the channel; a muted channel counts as level 0.
    fn is_muted(&self, _channel: AudioChannel) -> bool {
        false
    }

    fn set_level(&self, channel: AudioChannel, level: f32);
}

/// Levels captured when ducking starts, used only to restore them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckState {
    levels: ChannelLevels,
    muted: [bool; 3],
}

impl DuckState {
    pub fn capture(mixer: &dyn AudioMixer) -> Self {
        let mut levels = ChannelLevels::default();
        let mut muted = [false; 3];
        for (i, channel) in AudioChannel::DUCKED.into_iter().enumerate() {
            levels.set(channel, mixer.level(channel));
            muted[i] = mixer.is_muted(channel);
        }
        Self { levels, muted }
    }

    /// Raw levels as captured.
    pub fn levels(&self) -> ChannelLevels {
        self.levels
    }

    /// Level as heard at capture time: 0 for muted channels.
    pub fn effective_level(&self, channel: AudioChannel) -> f32 {
        let index = AudioChannel::DUCKED
            .iter()
            .position(|c| *c == channel)
            .unwrap_or(0);
        if self.muted[index] {
            0.0
        } else {
            self.levels.get(channel)
        }
    }

    fn apply(&self, mixer: &dyn AudioMixer, factor: f32) {
        for channel in AudioChannel::DUCKED {
            mixer.set_level(channel, self.effective_level(channel) * factor);
        }
    }

    fn restore(&self, mixer: &dyn AudioMixer) {
        for channel in AudioChannel::DUCKED {
            mixer.set_level(channel, self.levels.get(channel));
        }
    }
}

#[derive(Debug, Default)]
struct DuckCount {
    holders: usize,
    saved: Option<DuckState>,
}

/// Hands out ducking scopes over one mixer.
#[derive(Clone)]
pub struct Ducker {
    mixer: Arc<dyn AudioMixer>,
    count: Arc<Mutex<DuckCount>>,
}

impl fmt::Debug for Ducker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ducker")
            .field("active_scopes", &self.active_scopes())
            .finish()
    }
}

impl Ducker {
    pub fn new(mixer: Arc<dyn AudioMixer>) -> Self {
        Self {
            mixer,
            count: Arc::new(Mutex::new(DuckCount::default())),
        }
    }

    /// Starts a scope. With ducking disabled the scope does nothing for its
    /// whole lifetime.
    pub fn acquire(&self, config: &DuckingConfig) -> DuckingScope {
        if !config.enabled {
            return DuckingScope { ducker: None };
        }

        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        if count.holders == 0 {
            let state = DuckState::capture(self.mixer.as_ref());
            let factor = config.effective_factor();
            state.apply(self.mixer.as_ref(), factor);
            tracing::debug!(factor, levels = ?state.levels(), "ducked competing audio");
            count.saved = Some(state);
        }
        count.holders += 1;

        DuckingScope {
            ducker: Some(self.clone()),
        }
    }

    /// Number of scopes currently holding the duck.
    pub fn active_scopes(&self) -> usize {
        self.count.lock().unwrap_or_else(|e| e.into_inner()).holders
    }

    fn release_one(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        count.holders = count.holders.saturating_sub(1);
        if count.holders == 0 {
            if let Some(state) = count.saved.take() {
                state.restore(self.mixer.as_ref());
                tracing::debug!(levels = ?state.levels(), "restored competing audio");
            }
        }
    }
}

/// Guard that keeps competing audio ducked until released or dropped.
#[derive(Debug)]
#[must_use = "audio is restored as soon as the scope is dropped"]
pub struct DuckingScope {
    ducker: Option<Ducker>,
}

impl DuckingScope {
    /// Whether this scope still holds the duck.
    pub fn is_active(&self) -> bool {
        self.ducker.is_some()
    }

    /// Releases the scope. Calling it again does nothing.
    pub fn release(&mut self) {
        if let Some(ducker) = self.ducker.take() {
            ducker.release_one();
        }
    }
}

impl Drop for DuckingScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// In-process mixer for hosts without an audio system of their own, and for
/// tests.
#[derive(Debug, Default)]
pub struct MemoryMixer {
    levels: Mutex<ChannelLevels>,
    muted: Mutex<HashSet<AudioChannel>>,
}

impl MemoryMixer {
    pub fn new(levels: ChannelLevels) -> Self {
        Self {
            levels: Mutex::new(levels),
            muted: Mutex::new(HashSet::new()),
        }
    }

    pub fn levels(&self) -> ChannelLevels {
        *self.levels.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_muted(&self, channel: AudioChannel, muted: bool) {
        let mut set = self.muted.lock().unwrap_or_else(|e| e.into_inner());
        if muted {
            set.insert(channel);
        } else {
            set.remove(&channel);
        }
    }
}

impl AudioMixer for MemoryMixer {
    fn level(&self, channel: AudioChannel) -> f32 {
        self.levels().get(channel)
    }

    fn is_muted(&self, channel: AudioChannel) -> bool {
        self.muted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&channel)
    }

    fn set_level(&self, channel: AudioChannel, level: f32) {
        self.levels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set(channel, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: ChannelLevels = ChannelLevels {
        voice: 0.8,
        dialogue: 0.65,
        music: 0.3,
    };

    fn setup() -> (Arc<MemoryMixer>, Ducker) {
        let mixer = Arc::new(MemoryMixer::new(START));
        let ducker = Ducker::new(mixer.clone());
        (mixer, ducker)
    }

    fn config(factor: f32) -> DuckingConfig {
        DuckingConfig {
            enabled: true,
            factor,
        }
    }

    fn assert_bits_eq(a: ChannelLevels, b: ChannelLevels) {
        for channel in AudioChannel::DUCKED {
            assert_eq!(a.get(channel).to_bits(), b.get(channel).to_bits(), "{channel:?}");
        }
    }

    #[test]
    fn ducks_then_restores_exactly() {
        let (mixer, ducker) = setup();
        let mut scope = ducker.acquire(&config(0.5));

        let ducked = mixer.levels();
        assert_eq!(ducked.voice, 0.4);
        assert_eq!(ducked.dialogue, 0.325);
        assert_eq!(ducked.music, START.music * 0.5);

        scope.release();
        assert_bits_eq(mixer.levels(), START);
    }

    #[test]
    fn release_is_idempotent() {
        let (mixer, ducker) = setup();
        let mut scope = ducker.acquire(&config(0.2));
        scope.release();
        mixer.set_level(AudioChannel::Music, 0.9);
        scope.release();
        drop(scope);
        assert_eq!(mixer.levels().music, 0.9);
        assert_eq!(ducker.active_scopes(), 0);
    }

    #[test]
    fn disabled_ducking_is_a_no_op() {
        let (mixer, ducker) = setup();
        let scope = ducker.acquire(&DuckingConfig {
            enabled: false,
            factor: 0.0,
        });
        assert!(!scope.is_active());
        assert_bits_eq(mixer.levels(), START);
        mixer.set_level(AudioChannel::Voice, 0.1);
        drop(scope);
        assert_eq!(mixer.levels().voice, 0.1);
    }

    #[test]
    fn muted_channel_ducks_to_zero_and_restores_raw_level() {
        let (mixer, ducker) = setup();
        mixer.set_muted(AudioChannel::Music, true);
        let scope = ducker.acquire(&config(0.5));
        assert_eq!(mixer.levels().music, 0.0);
        drop(scope);
        assert_bits_eq(mixer.levels(), START);
    }

    #[test]
    fn overlapping_scopes_restore_original_levels() {
        let (mixer, ducker) = setup();
        let first = ducker.acquire(&config(0.5));
        let second = ducker.acquire(&config(0.5));
        assert_eq!(ducker.active_scopes(), 2);
        // The second scope does not duck twice.
        assert_eq!(mixer.levels().voice, 0.4);

        drop(first);
        assert_eq!(mixer.levels().voice, 0.4);
        drop(second);
        assert_bits_eq(mixer.levels(), START);
    }

    #[test]
    fn restores_on_error_path() {
        fn render(ducker: &Ducker, fail: bool) -> Result<(), String> {
            let _scope = ducker.acquire(&config(0.0));
            if fail {
                return Err("backend exploded".to_string());
            }
            Ok(())
        }

        let (mixer, ducker) = setup();
        assert!(render(&ducker, true).is_err());
        assert_bits_eq(mixer.levels(), START);
    }

    #[test]
    fn restores_on_panic() {
        let (mixer, ducker) = setup();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = ducker.acquire(&config(0.1));
            panic!("segment failed");
        }));
        assert!(result.is_err());
        assert_bits_eq(mixer.levels(), START);
    }

    #[test]
    fn factor_outside_unit_range_is_clamped() {
        let (mixer, ducker) = setup();
        let scope = ducker.acquire(&config(4.0));
        assert_bits_eq(mixer.levels(), START);
        drop(scope);
        let scope = ducker.acquire(&config(-1.0));
        assert_eq!(mixer.levels().voice, 0.0);
        drop(scope);
        assert_bits_eq(mixer.levels(), START);
    }
}
