//! Label Catalogue
//!
//! Gesture classes grouped the way the capture view offers them.

use serde::{Deserialize, Serialize};

const VOWELS: &[&str] = &["A", "E", "I", "O", "U"];
const ALPHABET: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z",
];
const NUMBERS: &[&str] = &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
const OPERATIONS: &[&str] = &["+", "-", "×", "÷", "=", "%"];

/// Label category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Vowels,
    Alphabet,
    Numbers,
    Operations,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Vowels, Self::Alphabet, Self::Numbers, Self::Operations];

    /// Symbols offered for this category, in display order.
    pub const fn symbols(self) -> &'static [&'static str] {
        match self {
            Self::Vowels => VOWELS,
            Self::Alphabet => ALPHABET,
            Self::Numbers => NUMBERS,
            Self::Operations => OPERATIONS,
        }
    }

    /// First symbol, selected when switching to this category.
    pub const fn default_label(self) -> &'static str {
        self.symbols()[0]
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Vowels => "Vowels",
            Self::Alphabet => "Alphabet",
            Self::Numbers => "Numbers",
            Self::Operations => "Operations",
        }
    }

    pub fn contains(self, label: &str) -> bool {
        self.symbols().contains(&label)
    }

    /// Parse a category name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "vowels" => Some(Self::Vowels),
            "alphabet" => Some(Self::Alphabet),
            "numbers" => Some(Self::Numbers),
            "operations" => Some(Self::Operations),
            _ => None,
        }
    }
}
