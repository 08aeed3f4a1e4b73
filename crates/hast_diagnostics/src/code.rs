//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of a diagnostic code, which determines its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Structural errors and unsupported input, prefixed with `E`.
    Error,
    /// Degraded-but-continued lowering, prefixed with `W`.
    Warning,
    /// Violations of the transformer configuration, prefixed with `C`.
    Configuration,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Configuration => 'C',
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'E' => Some(Category::Error),
            'W' => Some(Category::Warning),
            'C' => Some(Category::Configuration),
            _ => None,
        }
    }
}

/// A category prefix plus a number, displayed as e.g. `E101` or `W001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Error returned when a string is not a valid diagnostic code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCodeError(pub String);

impl fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid diagnostic code '{}'", self.0)
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for DiagnosticCode {
    type Err = ParseCodeError;

    /// Parses codes as written in `hast.toml` policy lists (`"W001"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| ParseCodeError(s.to_string()))?;
        let number = chars
            .as_str()
            .parse::<u16>()
            .map_err(|_| ParseCodeError(s.to_string()))?;
        Ok(Self::new(category, number))
    }
}
