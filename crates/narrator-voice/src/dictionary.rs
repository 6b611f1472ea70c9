//! Phonetic substitution dictionary.
//!
//! The dictionary is an ordered list of regex rules that rewrite words the
//! synthesizer mispronounces ("Golarion" -> "Goolaarion"). It is read from a
//! JSON object whose key order is the application order, so authors can put a
//! broad rule after the narrower rules it would otherwise shadow.

use crate::error::VoiceError;
use regex::Regex;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// File name of the dictionary inside the installation directory.
pub const DICTIONARY_FILE_NAME: &str = "PhoneticDictionary.json";

/// One compiled `pattern -> replacement` rule.
#[derive(Debug, Clone)]
pub struct PhoneticRule {
    pattern: Regex,
    replacement: String,
}

impl PhoneticRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// An immutable, ordered set of phonetic rules.
#[derive(Debug, Clone, Default)]
pub struct PhoneticDictionary {
    rules: Vec<PhoneticRule>,
}

impl PhoneticDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles every pair in order. A single invalid pattern rejects the
    /// whole set.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, VoiceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let rules = pairs
            .into_iter()
            .map(|(pattern, replacement)| {
                let pattern = pattern.as_ref();
                let compiled = Regex::new(pattern).map_err(|e| {
                    VoiceError::Dictionary(format!("invalid pattern {:?}: {}", pattern, e))
                })?;
                Ok(PhoneticRule {
                    pattern: compiled,
                    replacement: replacement.into(),
                })
            })
            .collect::<Result<Vec<_>, VoiceError>>()?;
        Ok(Self { rules })
    }

    /// Parses a JSON object of `pattern: replacement` strings, keeping the
    /// document order.
    pub fn from_json(json: &str) -> Result<Self, VoiceError> {
        let OrderedPairs(pairs) = serde_json::from_str(json)?;
        Self::from_pairs(pairs)
    }

    /// Reads and parses a dictionary file.
    pub fn load(path: &Path) -> Result<Self, VoiceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PhoneticRule] {
        &self.rules
    }

    /// Applies every rule in order; each rule sees the output of the previous
    /// one.
    pub fn apply(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |current, rule| {
            rule.pattern
                .replace_all(&current, rule.replacement.as_str())
                .into_owned()
        })
    }
}

/// A JSON object read as a list of pairs in document order.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping patterns to replacement strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    pairs.push((key, value));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Resolves the directory the dictionary file lives in.
///
/// Preference order: the explicit installation directory, the directory of
/// the running executable, the current working directory.
pub fn resolve_dictionary_dir(install_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = install_dir.filter(|d| !d.as_os_str().is_empty()) {
        return dir.to_path_buf();
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .filter(|d| !d.as_os_str().is_empty())
    {
        return dir;
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Process-wide holder of the current dictionary.
///
/// The dictionary is loaded lazily on the first `snapshot` and can be
/// reloaded on demand. A reload swaps the whole dictionary; a failed reload
/// leaves the previous one in place.
#[derive(Debug, Clone, Default)]
pub struct DictionaryStore {
    path: Option<PathBuf>,
    current: Arc<RwLock<Option<Arc<PhoneticDictionary>>>>,
}

impl DictionaryStore {
    /// A store backed by the dictionary file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// A store backed by `PhoneticDictionary.json` in the resolved
    /// installation directory.
    pub fn in_install_dir(install_dir: Option<&Path>) -> Self {
        Self::new(resolve_dictionary_dir(install_dir).join(DICTIONARY_FILE_NAME))
    }

    /// A store holding an already built dictionary and no backing file.
    pub fn with_dictionary(dictionary: PhoneticDictionary) -> Self {
        Self {
            path: None,
            current: Arc::new(RwLock::new(Some(Arc::new(dictionary)))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the current dictionary, loading it on first use.
    ///
    /// Never fails: when nothing can be loaded an empty dictionary is
    /// returned and a warning is logged once.
    pub fn snapshot(&self) -> Arc<PhoneticDictionary> {
        {
            let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
            if let Some(dictionary) = guard.as_ref() {
                return Arc::clone(dictionary);
            }
        }

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if let Some(dictionary) = guard.as_ref() {
            return Arc::clone(dictionary);
        }

        let loaded = match self.read_file() {
            Ok(dictionary) => dictionary,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "phonetic dictionary unavailable, substitutions disabled"
                );
                PhoneticDictionary::empty()
            }
        };
        let loaded = Arc::new(loaded);
        *guard = Some(Arc::clone(&loaded));
        loaded
    }

    /// Re-reads the backing file and swaps it in, returning the rule count.
    ///
    /// # Errors
    ///
    /// Returns the read or parse error; the previously loaded dictionary
    /// stays active.
    pub fn reload(&self) -> Result<usize, VoiceError> {
        let dictionary = self.read_file().inspect_err(|e| {
            tracing::error!(error = %e, "failed to reload phonetic dictionary");
        })?;
        let count = dictionary.len();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(dictionary));
        tracing::info!(rules = count, "phonetic dictionary loaded");
        Ok(count)
    }

    /// Replaces the dictionary without touching the backing file.
    pub fn replace(&self, dictionary: PhoneticDictionary) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(dictionary));
    }

    fn read_file(&self) -> Result<PhoneticDictionary, VoiceError> {
        let path = self.path.as_deref().ok_or_else(|| {
            VoiceError::ConfigurationUnavailable("no phonetic dictionary file configured".into())
        })?;
        let dictionary = PhoneticDictionary::load(path)?;
        for rule in dictionary.rules() {
            tracing::debug!(pattern = rule.pattern(), replacement = rule.replacement(), "phonetic rule");
        }
        Ok(dictionary)
    }
}
