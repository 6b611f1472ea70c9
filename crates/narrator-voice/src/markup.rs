//! Markup patterns shared by the normalizer and the splitter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Colour value that marks a span as narration inside a spoken line.
pub const NARRATION_COLOR: &str = "#616060";

/// `<color=#616060>inner</color>`; group 1 is the inner text.
pub(crate) static NARRATION_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)<color\s*=\s*{}\s*>(.*?)</color\s*>",
        NARRATION_COLOR
    ))
    .expect("narration span pattern is valid")
});

/// Any markup tag.
pub(crate) static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// `<link ...>inner</link>`; group 1 is the inner text.
pub(crate) static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<link[^>]*>(.*?)</link\s*>").expect("link pattern is valid")
});

/// `[[slnc N]]` pause directive plus the whitespace following it; group 1 is
/// the raw value, which may be malformed.
pub(crate) static PAUSE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[\[\s*slnc\b\s*([^\]]*?)\s*\]\]\s*").expect("pause pattern is valid")
});

/// `dd/dd/dddd`, which synthesizers tend to read as a fraction.
pub(crate) static SLASH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{2})/([0-9]{2})/([0-9]{4})").expect("date pattern is valid")
});
