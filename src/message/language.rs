use serde::{Deserialize, Serialize};
use std::fmt;

/// Target language name as understood by the translation backend (e.g. "Hindi")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of languages a session may translate into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl LanguageCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut languages: Vec<Language> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if name.is_empty() || languages.iter().any(|l| l.0.eq_ignore_ascii_case(&name)) {
                continue;
            }
            languages.push(Language(name));
        }
        Self { languages }
    }

    /// Look up a language by name, ignoring case
    pub fn resolve(&self, name: &str) -> Option<Language> {
        let name = name.trim();
        self.languages
            .iter()
            .find(|l| l.0.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::new(["Hindi", "English", "Telugu", "Tamil", "German"])
    }
}
