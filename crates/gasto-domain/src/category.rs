//! Expense categories with the fallback rule for unknown stored values.

use std::fmt;

use serde::{de::Deserializer, Deserialize, Serialize, Serializer};

use crate::common::RawText;

/// Closed set of expense categories. Unknown stored keys collapse into [`ExpenseCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Services,
    Leisure,
    Health,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Food,
        ExpenseCategory::Transport,
        ExpenseCategory::Services,
        ExpenseCategory::Leisure,
        ExpenseCategory::Health,
        ExpenseCategory::Other,
    ];

    /// Resolves a stored or user-entered key. Accepts English and Spanish keys in any case.
    pub fn from_key(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "food" | "comida" => ExpenseCategory::Food,
            "transport" | "transporte" => ExpenseCategory::Transport,
            "services" | "servicios" => ExpenseCategory::Services,
            "leisure" | "ocio" => ExpenseCategory::Leisure,
            "health" | "salud" => ExpenseCategory::Health,
            _ => ExpenseCategory::Other,
        }
    }

    /// Strict variant of [`ExpenseCategory::from_key`] used for user input, where a typo
    /// should be reported instead of silently filed under `other`.
    pub fn parse_known(value: &str) -> Option<Self> {
        let category = Self::from_key(value);
        match value.trim().to_lowercase().as_str() {
            "other" | "otros" => Some(ExpenseCategory::Other),
            _ if category == ExpenseCategory::Other => None,
            _ => Some(category),
        }
    }

    /// Canonical storage key.
    pub fn key(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Services => "services",
            ExpenseCategory::Leisure => "leisure",
            ExpenseCategory::Health => "health",
            ExpenseCategory::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::Services => "Services",
            ExpenseCategory::Leisure => "Leisure",
            ExpenseCategory::Health => "Health",
            ExpenseCategory::Other => "Other",
        }
    }

    /// Chart colour assigned to the category.
    pub fn color(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "#4361ee",
            ExpenseCategory::Transport => "#3f37c9",
            ExpenseCategory::Services => "#4cc9f0",
            ExpenseCategory::Leisure => "#7209b7",
            ExpenseCategory::Health => "#4bb543",
            ExpenseCategory::Other => "#f72585",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<RawText>::deserialize(deserializer)?;
        Ok(value
            .and_then(RawText::into_text)
            .map(|key| ExpenseCategory::from_key(&key))
            .unwrap_or_default())
    }
}
