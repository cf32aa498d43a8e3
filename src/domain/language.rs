use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Languages supported by the Addis AI speech endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "am")]
    Amharic,
    #[serde(rename = "om")]
    AfanOromo,
}

impl LanguageCode {
    /// Get the code the backends expect as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Amharic => "am",
            LanguageCode::AfanOromo => "om",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LanguageCode::Amharic => "Amharic",
            LanguageCode::AfanOromo => "Afan Oromo",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "am" | "amharic" => Ok(LanguageCode::Amharic),
            "om" | "oromo" | "afan-oromo" => Ok(LanguageCode::AfanOromo),
            other => Err(format!(
                "unsupported language '{}', expected 'am' or 'om'",
                other
            )),
        }
    }
}
