use serde::{Deserialize, Serialize};

/// Display language of the app and the chatbot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Sinhala,
}

impl Language {
    /// Name the chatbot server expects in `language`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Sinhala => "sinhala",
        }
    }

    /// Accepts both the chatbot names and the UI locale codes.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "english" | "en" => Some(Language::English),
            "sinhala" | "si" | "si-lk" => Some(Language::Sinhala),
            _ => None,
        }
    }

    /// BCP 47 tag for speech output.
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Sinhala => "si-LK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_codes() {
        assert_eq!(Language::parse("English"), Some(Language::English));
        assert_eq!(Language::parse("si"), Some(Language::Sinhala));
        assert_eq!(Language::parse("tamil"), None);
        assert_eq!(Language::Sinhala.as_str(), "sinhala");
    }
}
