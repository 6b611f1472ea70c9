//! Plays one utterance: segments strictly in order, each followed by its
//! pause, inside a single ducking scope.

use crate::backend::SynthesisBackend;
use crate::config::SettingsHandle;
use crate::duck::Ducker;
use crate::select::resolve_voice;
use crate::split::Utterance;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// What happened while an utterance played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Segments the backend finished rendering.
    pub rendered: usize,
    /// Silent segments whose pause was waited without rendering.
    pub skipped: usize,
    /// Segments whose render failed; playback moved on to the next one.
    pub failed: usize,
    /// Playback stopped early because no process could be started.
    pub aborted: bool,
}

#[derive(Clone)]
pub struct UtteranceScheduler {
    backend: Arc<dyn SynthesisBackend>,
    ducker: Ducker,
    settings: SettingsHandle,
    runtime: Option<Handle>,
}

impl fmt::Debug for UtteranceScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtteranceScheduler")
            .field("ducker", &self.ducker)
            .field("settings", &self.settings)
            .field("has_runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

impl UtteranceScheduler {
    /// Creates a scheduler. When called inside a Tokio runtime, utterances
    /// are spawned onto that runtime; otherwise see [`Self::with_runtime`].
    pub fn new(backend: Arc<dyn SynthesisBackend>, ducker: Ducker, settings: SettingsHandle) -> Self {
        Self {
            backend,
            ducker,
            settings,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawns utterances onto `runtime`, so `spawn` works from threads that
    /// are not part of any runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn ducker(&self) -> &Ducker {
        &self.ducker
    }

    /// Plays an utterance to completion.
    ///
    /// The initial delay is waited once, before ducking starts. Each segment
    /// is rendered only after the previous one finished, and its pause is
    /// waited whether it rendered, was silent or failed. The ducking scope is
    /// released after the last pause, or as soon as playback is abandoned.
    pub async fn play(&self, utterance: Utterance, initial_delay: Duration) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        if utterance.is_empty() {
            return report;
        }

        if !initial_delay.is_zero() {
            tokio::time::sleep(initial_delay).await;
        }

        let ducking = self.settings.snapshot().ducking.clone();
        let mut scope = self.ducker.acquire(&ducking);
        let total = utterance.len();

        for (index, segment) in utterance.into_iter().enumerate() {
            if segment.is_silent() {
                report.skipped += 1;
            } else {
                // Resolved per segment, so the profile reflects the settings
                // at the moment this segment starts.
                let voice = resolve_voice(&self.settings.snapshot(), segment.voice);
                tracing::debug!(
                    segment = index,
                    voice = voice.kind.label(),
                    chars = segment.text.len(),
                    pause_ms = segment.pause().as_millis() as u64,
                    "rendering segment"
                );
                match self.backend.render(&segment.text, &voice).await {
                    Ok(()) => report.rendered += 1,
                    Err(e) if e.is_fatal() => {
                        tracing::error!(
                            segment = index,
                            remaining = total - index - 1,
                            error = %e,
                            "synthesis backend unavailable, abandoning utterance"
                        );
                        report.failed += 1;
                        report.aborted = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(segment = index, error = %e, "segment render failed");
                        report.failed += 1;
                    }
                }
            }

            let pause = segment.pause();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        scope.release();
        tracing::debug!(
            rendered = report.rendered,
            skipped = report.skipped,
            failed = report.failed,
            aborted = report.aborted,
            "utterance finished"
        );
        report
    }

    /// Plays an utterance on a background task.
    ///
    /// The handle may be dropped; the utterance still runs to completion.
    /// Returns `None` without panicking when no runtime was configured and
    /// the caller is not inside one.
    pub fn spawn(
        &self,
        utterance: Utterance,
        initial_delay: Duration,
    ) -> Option<JoinHandle<PlaybackReport>> {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::error!("no async runtime available, utterance dropped");
            return None;
        };
        let scheduler = self.clone();
        let span = tracing::info_span!(
            "utterance",
            utterance_id = %Uuid::new_v4(),
            segments = utterance.len()
        );
        Some(runtime.spawn(
            async move { scheduler.play(utterance, initial_delay).await }.instrument(span),
        ))
    }
}
