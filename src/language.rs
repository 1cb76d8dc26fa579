//! Response languages offered by the page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output language offered in the language selector.
///
/// Only the label travels anywhere: it is spliced into prompts so the model
/// answers in that language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Spanish,
    German,
    Hindi,
    Bengali,
    Korean,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Spanish,
        Language::German,
        Language::Hindi,
        Language::Bengali,
        Language::Korean,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Hindi => "Hindi",
            Language::Bengali => "Bengali",
            Language::Korean => "Korean",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported language {0:?}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("spanish".parse::<Language>().unwrap(), Language::Spanish);
        assert_eq!(" Korean ".parse::<Language>().unwrap(), Language::Korean);
        assert!("Klingon".parse::<Language>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"Hindi\"");
        let parsed: Language = serde_json::from_str("\"Bengali\"").unwrap();
        assert_eq!(parsed, Language::Bengali);
    }
}
