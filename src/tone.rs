use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Writing tone passed through to the description service.
///
/// The wire value is the lowercase variant name (`"professional"`,
/// `"casual"`, `"luxury"`, `"technical"`), which is also how it appears in
/// `config.json`.
///
/// # Example
///
/// ```rust
/// use product_describer::tone::Tone;
///
/// let tone: Tone = "Luxury".parse().unwrap();
/// assert_eq!(tone, Tone::Luxury);
/// assert_eq!(tone.as_str(), "luxury");
/// assert_eq!(Tone::default(), Tone::Professional);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Luxury,
    Technical,
}

impl Tone {
    /// Every tone, in the order the selector lists them.
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Casual, Tone::Luxury, Tone::Technical];

    /// The value sent in the `tone` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Luxury => "luxury",
            Self::Technical => "technical",
        }
    }

    /// Human-readable label for selectors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Casual => "Casual",
            Self::Luxury => "Luxury",
            Self::Technical => "Technical",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four tone names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tone `{0}` (expected professional, casual, luxury or technical)")]
pub struct ParseToneError(String);

impl FromStr for Tone {
    type Err = ParseToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ParseToneError(s.to_string()))
    }
}
