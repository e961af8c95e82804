//! Writing-style presets for generated articles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four writing styles a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Friendly, like talking to a friend
    #[default]
    Casual,
    /// Polite and professional without being stiff
    Professional,
    /// Narrative voice that pulls the reader into a story
    Storytelling,
    /// Personal essay mixing thoughts and feelings
    Essay,
}

impl Tone {
    /// Returns the ID string for this tone.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Professional => "professional",
            Self::Storytelling => "storytelling",
            Self::Essay => "essay",
        }
    }

    /// Returns the style directive inserted into the prompt.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Casual => "A casual, friendly voice, as if talking to a friend.",
            Self::Professional => "A polite, professional voice that never gets too stiff.",
            Self::Storytelling => "A storytelling voice that draws the reader into the narrative.",
            Self::Essay => "An essay voice that weaves in personal thoughts and feelings.",
        }
    }

    /// Returns all available tones.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Casual,
            Self::Professional,
            Self::Storytelling,
            Self::Essay,
        ]
    }

    /// Parse a tone from its string ID.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "casual" => Some(Self::Casual),
            "professional" => Some(Self::Professional),
            "storytelling" => Some(Self::Storytelling),
            "essay" => Some(Self::Essay),
            _ => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| {
            let known: Vec<_> = Self::all().iter().map(|t| t.id()).collect();
            format!("unknown tone '{s}', expected one of: {}", known.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for tone in Tone::all() {
            assert_eq!(Tone::from_id(tone.id()), Some(*tone));
        }
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(Tone::from_id("shouty"), None);
        let err = "shouty".parse::<Tone>().unwrap_err();
        assert!(err.contains("casual, professional, storytelling, essay"));
    }

    #[test]
    fn test_directives_are_distinct() {
        let mut directives: Vec<_> = Tone::all().iter().map(|t| t.directive()).collect();
        directives.sort_unstable();
        directives.dedup();
        assert_eq!(directives.len(), 4);
    }

    #[test]
    fn test_default_is_casual() {
        assert_eq!(Tone::default(), Tone::Casual);
    }
}
