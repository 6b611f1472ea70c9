//! Splits normalized text into the ordered segments of one utterance.
//!
//! Two passes compose. The first cuts the text at narration-span markers and
//! tags each run with the narrator or the default (speaker) voice. The second
//! cuts each run at `[[slnc N]]` directives and records an `N` millisecond
//! pause after the text preceding the directive. Markers and directives are
//! the only characters removed; every other character ends up in exactly one
//! segment.

use crate::error::VoiceError;
use crate::markup::{NARRATION_SPAN, PAUSE_DIRECTIVE};
use narrator_types::VoiceKind;
use std::time::Duration;

/// Pause after a segment that has no explicit directive, so consecutive runs
/// do not collide.
pub const DEFAULT_PAUSE_MS: u32 = 100;

/// A contiguous span of text in one voice, optionally followed by a pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSegment {
    pub text: String,
    pub voice: VoiceKind,
    /// Explicit pause from a directive; `None` means the default pause.
    pub pause_after_ms: Option<u32>,
}

impl DialogueSegment {
    pub fn new(text: impl Into<String>, voice: VoiceKind, pause_after_ms: Option<u32>) -> Self {
        Self {
            text: text.into(),
            voice,
            pause_after_ms,
        }
    }

    /// The pause to wait after this segment.
    pub fn pause(&self) -> Duration {
        Duration::from_millis(u64::from(self.pause_after_ms.unwrap_or(DEFAULT_PAUSE_MS)))
    }

    /// Whether there is nothing to render; the pause still applies.
    pub fn is_silent(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The ordered segments produced from one speak request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utterance {
    segments: Vec<DialogueSegment>,
}

impl Utterance {
    pub fn new(segments: Vec<DialogueSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[DialogueSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenated text of every segment.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

impl IntoIterator for Utterance {
    type Item = DialogueSegment;
    type IntoIter = std::vec::IntoIter<DialogueSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

/// A run of text in one voice, before pause directives are extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRun {
    pub text: String,
    pub voice: VoiceKind,
}

/// Cuts text at narration-span markers.
///
/// Span contents go to `narrator_voice`, everything else to `default_voice`.
/// Empty runs are dropped; whitespace is kept verbatim.
pub fn split_voice_runs(
    normalized: &str,
    default_voice: VoiceKind,
    narrator_voice: VoiceKind,
) -> Vec<VoiceRun> {
    let mut runs = Vec::new();
    let mut push = |text: &str, voice: VoiceKind| {
        if !text.is_empty() {
            runs.push(VoiceRun {
                text: text.to_string(),
                voice,
            });
        }
    };

    let mut pos = 0;
    for caps in NARRATION_SPAN.captures_iter(normalized) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push(&normalized[pos..whole.start()], default_voice);
        push(inner.as_str(), narrator_voice);
        pos = whole.end();
    }
    push(&normalized[pos..], default_voice);

    runs
}

/// Parses one complete `[[slnc N]]` directive into milliseconds.
///
/// # Errors
///
/// Returns `MalformedPauseDirective` when the text is not a directive or its
/// value is not a non-negative integer that fits in `u32`.
pub fn parse_pause_directive(directive: &str) -> Result<u32, VoiceError> {
    let value = PAUSE_DIRECTIVE
        .captures(directive)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| VoiceError::MalformedPauseDirective {
            directive: directive.to_string(),
            reason: "not a pause directive".to_string(),
        })?;
    parse_pause_value(directive, value.as_str())
}

fn parse_pause_value(directive: &str, value: &str) -> Result<u32, VoiceError> {
    value
        .parse::<u32>()
        .map_err(|e| VoiceError::MalformedPauseDirective {
            directive: directive.to_string(),
            reason: e.to_string(),
        })
}

/// Cuts one run at its pause directives.
///
/// Text before each valid directive becomes a piece carrying that pause,
/// even when the text is empty. Trailing text after the last directive
/// becomes a piece with no explicit pause. A malformed directive is logged
/// and kept as plain text.
pub fn split_pauses(run: &str) -> Vec<(String, Option<u32>)> {
    let mut pieces = Vec::new();
    let mut pending = String::new();
    let mut pos = 0;

    for caps in PAUSE_DIRECTIVE.captures_iter(run) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        pending.push_str(&run[pos..whole.start()]);
        match parse_pause_value(whole.as_str(), value.as_str()) {
            Ok(ms) => pieces.push((std::mem::take(&mut pending), Some(ms))),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed pause directive");
                pending.push_str(whole.as_str());
            }
        }
        pos = whole.end();
    }
    pending.push_str(&run[pos..]);
    if !pending.is_empty() {
        pieces.push((pending, None));
    }

    pieces
}

/// Splits normalized text into the segments of one utterance.
///
/// Empty input yields an empty utterance.
pub fn split(normalized: &str, default_voice: VoiceKind, narrator_voice: VoiceKind) -> Utterance {
    let segments = split_voice_runs(normalized, default_voice, narrator_voice)
        .into_iter()
        .flat_map(|run| {
            split_pauses(&run.text)
                .into_iter()
                .map(move |(text, pause)| DialogueSegment::new(text, run.voice, pause))
        })
        .collect();
    Utterance::new(segments)
}
