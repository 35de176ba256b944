// Language Context - session-wide display language
//
// Two supported values. Anything unknown falls back to English.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Parse a language code, falling back to English
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }

    pub fn direction(&self) -> TextDirection {
        match self {
            Language::Ar => TextDirection::Rtl,
            Language::En => TextDirection::Ltr,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Ar,
            Language::Ar => Language::En,
        }
    }

    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ar => "العربية",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Current display language for one session
///
/// Owned by [`crate::app::AppContext`] and handed to every view that renders text.
#[derive(Debug, Clone, Default)]
pub struct LanguageContext {
    current: Language,
}

impl LanguageContext {
    pub fn new(language: Language) -> Self {
        LanguageContext { current: language }
    }

    pub fn language(&self) -> Language {
        self.current
    }

    pub fn set_language(&mut self, language: Language) {
        if self.current != language {
            tracing::debug!(from = %self.current, to = %language, "language changed");
        }
        self.current = language;
    }

    /// Switch between English and Arabic, returning the new value
    pub fn toggle(&mut self) -> Language {
        self.set_language(self.current.toggled());
        self.current
    }

    pub fn direction(&self) -> TextDirection {
        self.current.direction()
    }

    pub fn is_rtl(&self) -> bool {
        self.direction() == TextDirection::Rtl
    }

    /// Translated string for `text` in the current language
    pub fn t(&self, text: crate::i18n::Text) -> &'static str {
        crate::i18n::translate(text, self.current)
    }
}
