//! Turns raw, annotated game text into text a synthesizer can read.

use crate::dictionary::{DictionaryStore, PhoneticDictionary};
use crate::markup::{LINK, NARRATION_SPAN, SLASH_DATE, TAG};

/// Quote characters removed from spoken text.
const QUOTES: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

/// Cleans text for speech.
///
/// Markup is removed except for narration-span markers and pause
/// directives, which the splitter consumes afterwards. Line breaks become
/// sentence pauses, quotes are dropped, `dd/dd/dddd` dates are spaced out and
/// finally every phonetic rule is applied in dictionary order.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    dictionary: DictionaryStore,
}

impl TextNormalizer {
    pub fn new(dictionary: DictionaryStore) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &DictionaryStore {
        &self.dictionary
    }

    pub fn normalize(&self, raw: &str) -> String {
        let dictionary = self.dictionary.snapshot();
        let unwrapped = LINK.replace_all(raw, "${1}");

        let mut out = String::with_capacity(unwrapped.len());
        let mut pos = 0;
        for caps in NARRATION_SPAN.captures_iter(&unwrapped) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&clean_run(&unwrapped[pos..whole.start()], &dictionary));
            out.push_str(&unwrapped[whole.start()..inner.start()]);
            out.push_str(&clean_run(inner.as_str(), &dictionary));
            out.push_str(&unwrapped[inner.end()..whole.end()]);
            pos = whole.end();
        }
        out.push_str(&clean_run(&unwrapped[pos..], &dictionary));

        out.trim().to_string()
    }
}

/// Structural cleanup plus phonetic rules for text between markers.
fn clean_run(text: &str, dictionary: &PhoneticDictionary) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = TAG.replace_all(text, "");
    let text = text
        .replace(QUOTES, "")
        .replace("\r\n", ". ")
        .replace(['\n', '\r'], ". ");
    let text = SLASH_DATE.replace_all(&text, "$1 / $2 / $3");
    dictionary.apply(&text)
}

/// Length of a line as heard, ignoring dashes and quotes.
///
/// Hosts use this to size how long a subtitle stays on screen.
pub fn spoken_length(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    text.chars()
        .filter(|c| !matches!(c, '\u{2014}' | '-' | '"'))
        .count()
}
