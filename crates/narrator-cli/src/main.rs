//! Narrator binary: reads lines from stdin and speaks them.
//!
//! Each line is one request:
//! - `male: text` / `female: text` speaks a dialogue line for that speaker
//! - `bark: text` speaks an anonymous bark
//! - `bark female Name: text` speaks a bark for a named character
//! - `:reload` re-reads the phonetic dictionary
//! - anything else is spoken as a dialogue line by the narrator
//!
//! Playback is sequential per line but lines are not queued: a line read
//! while another is playing starts playing immediately.

mod config;

use narrator_types::{AudioChannel, ChannelLevels, Gender, VoiceKind};
use narrator_voice::{
    BarkSpeaker, DictionaryStore, MemoryMixer, PlaybackReport, ProcessBackend, SettingsHandle,
    SpeechEngine, VoiceSelector,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("NARRATOR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
enum Request {
    Dialog { speaker: Gender, text: String },
    Bark { speaker: Option<BarkSpeaker>, text: String },
    Reload,
}

fn parse_gender(word: &str) -> Option<Gender> {
    match word.to_ascii_lowercase().as_str() {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        _ => None,
    }
}

fn parse_request(line: &str) -> Option<Request> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line == ":reload" {
        return Some(Request::Reload);
    }

    if let Some((head, text)) = line.split_once(':') {
        let text = text.trim().to_string();
        let mut words = head.split_whitespace();
        match (words.next(), words.next()) {
            (Some(word), None) if word.eq_ignore_ascii_case("bark") => {
                return Some(Request::Bark { speaker: None, text });
            }
            (Some(word), Some(gender)) if word.eq_ignore_ascii_case("bark") => {
                let name = words.collect::<Vec<_>>().join(" ");
                if let Some(gender) = parse_gender(gender).filter(|_| !name.is_empty()) {
                    return Some(Request::Bark {
                        speaker: Some(BarkSpeaker::new(name, gender)),
                        text,
                    });
                }
            }
            (Some(word), None) => {
                if let Some(speaker) = parse_gender(word) {
                    return Some(Request::Dialog { speaker, text });
                }
            }
            _ => {}
        }
    }

    Some(Request::Dialog {
        speaker: Gender::Unknown,
        text: line.to_string(),
    })
}

fn handle(engine: &SpeechEngine, request: Request) -> Option<JoinHandle<PlaybackReport>> {
    match request {
        Request::Dialog { speaker, text } => engine.speak(&text, speaker, Duration::ZERO),
        Request::Bark { speaker, text } => engine.speak_bark(speaker.as_ref(), &text),
        Request::Reload => {
            match engine.reload_dictionary() {
                Ok(rules) => tracing::info!(rules, "reloaded phonetic dictionary"),
                Err(e) => tracing::warn!(error = %e, "dictionary reload failed, keeping previous"),
            }
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("narrator.toml"));

    let (config, origin) = match config::load_config(selected_config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("narrator: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );
    if origin == config::ConfigOrigin::Defaults {
        tracing::info!(
            path = selected_config_path.unwrap_or("<none>"),
            "config file not found, using defaults"
        );
    }

    let backend = ProcessBackend::from_settings(&config.speech);
    tracing::info!(
        program = %backend.program().display(),
        shape = ?backend.shape(),
        "synthesis backend"
    );

    let settings = SettingsHandle::new(config.speech);
    let selector = VoiceSelector::new(settings.clone());
    for kind in VoiceKind::ALL {
        let voice = selector.resolve(kind);
        tracing::debug!(
            kind = kind.label(),
            name = %voice.name,
            pitch = voice.pitch,
            rate = voice.rate,
            volume = voice.volume,
            "configured voice"
        );
    }

    let dictionary = DictionaryStore::in_install_dir(config.dictionary.dir.as_deref());
    if let Some(path) = dictionary.path() {
        tracing::info!(path = %path.display(), "phonetic dictionary location");
    }

    // No host mixer here; levels are tracked in memory so ducking still runs.
    let mixer = Arc::new(MemoryMixer::new(ChannelLevels {
        voice: 1.0,
        dialogue: 1.0,
        music: 1.0,
    }));
    let engine = SpeechEngine::new(settings, dictionary, Arc::new(backend), mixer.clone());

    let mut pending = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(job) = parse_request(&line).and_then(|r| handle(&engine, r)) {
                    pending.push(job);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        }
    }

    let mut aborted = false;
    for job in pending {
        match job.await {
            Ok(report) => aborted |= report.aborted,
            Err(e) => tracing::error!(error = %e, "playback task failed"),
        }
    }

    tracing::debug!(
        music = mixer.levels().get(AudioChannel::Music),
        "final mixer levels"
    );

    if aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_prefix_selects_speaker() {
        assert_eq!(
            parse_request("female: Stay back!"),
            Some(Request::Dialog {
                speaker: Gender::Female,
                text: "Stay back!".to_string()
            })
        );
        assert_eq!(
            parse_request("MALE:hello"),
            Some(Request::Dialog {
                speaker: Gender::Male,
                text: "hello".to_string()
            })
        );
    }

    #[test]
    fn unprefixed_line_is_narrated() {
        assert_eq!(
            parse_request("  The wind howls: cold and long. "),
            Some(Request::Dialog {
                speaker: Gender::Unknown,
                text: "The wind howls: cold and long.".to_string()
            })
        );
    }

    #[test]
    fn bark_forms() {
        assert_eq!(
            parse_request("bark: A door creaks."),
            Some(Request::Bark {
                speaker: None,
                text: "A door creaks.".to_string()
            })
        );
        assert_eq!(
            parse_request("bark female Queen Galfrey: Onward!"),
            Some(Request::Bark {
                speaker: Some(BarkSpeaker::new("Queen Galfrey", Gender::Female)),
                text: "Onward!".to_string()
            })
        );
    }

    #[test]
    fn reload_and_blank_lines() {
        assert_eq!(parse_request(":reload"), Some(Request::Reload));
        assert_eq!(parse_request("   "), None);
    }
}
