//! Per-user budget settings: monthly budget, fixed expenses, and spending limit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{coerce_amount, lenient_setting};

/// The three numeric settings. `0` means "unset" for every field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetConfiguration {
    #[serde(default, deserialize_with = "lenient_setting")]
    pub monthly_budget: f64,
    #[serde(default, deserialize_with = "lenient_setting")]
    pub fixed_expenses: f64,
    #[serde(default, deserialize_with = "lenient_setting")]
    pub spending_limit: f64,
}

impl BudgetConfiguration {
    pub fn new(monthly_budget: f64, fixed_expenses: f64, spending_limit: f64) -> Self {
        Self {
            monthly_budget: sanitize_setting(monthly_budget),
            fixed_expenses: sanitize_setting(fixed_expenses),
            spending_limit: sanitize_setting(spending_limit),
        }
    }

    pub fn get(&self, field: ConfigField) -> f64 {
        match field {
            ConfigField::MonthlyBudget => self.monthly_budget,
            ConfigField::FixedExpenses => self.fixed_expenses,
            ConfigField::SpendingLimit => self.spending_limit,
        }
    }

    pub fn set(&mut self, field: ConfigField, value: f64) {
        let value = sanitize_setting(value);
        match field {
            ConfigField::MonthlyBudget => self.monthly_budget = value,
            ConfigField::FixedExpenses => self.fixed_expenses = value,
            ConfigField::SpendingLimit => self.spending_limit = value,
        }
    }

    /// Returns `true` when the field holds a positive value.
    pub fn is_set(&self, field: ConfigField) -> bool {
        self.get(field) > 0.0
    }
}

/// Partial update: `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigurationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_limit: Option<f64>,
}

impl ConfigurationPatch {
    pub fn single(field: ConfigField, value: f64) -> Self {
        let mut patch = Self::default();
        match field {
            ConfigField::MonthlyBudget => patch.monthly_budget = Some(value),
            ConfigField::FixedExpenses => patch.fixed_expenses = Some(value),
            ConfigField::SpendingLimit => patch.spending_limit = Some(value),
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_budget.is_none()
            && self.fixed_expenses.is_none()
            && self.spending_limit.is_none()
    }

    /// Iterates the fields present in the patch.
    pub fn entries(&self) -> impl Iterator<Item = (ConfigField, f64)> {
        [
            (ConfigField::MonthlyBudget, self.monthly_budget),
            (ConfigField::FixedExpenses, self.fixed_expenses),
            (ConfigField::SpendingLimit, self.spending_limit),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }

    /// Merges this patch onto `base`, leaving unspecified fields as they were.
    pub fn apply_to(&self, base: BudgetConfiguration) -> BudgetConfiguration {
        let mut merged = base;
        for (field, value) in self.entries() {
            merged.set(field, value);
        }
        merged
    }
}

impl From<BudgetConfiguration> for ConfigurationPatch {
    fn from(configuration: BudgetConfiguration) -> Self {
        Self {
            monthly_budget: Some(configuration.monthly_budget),
            fixed_expenses: Some(configuration.fixed_expenses),
            spending_limit: Some(configuration.spending_limit),
        }
    }
}

/// Names one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigField {
    MonthlyBudget,
    FixedExpenses,
    SpendingLimit,
}

impl ConfigField {
    pub const ALL: [ConfigField; 3] = [
        ConfigField::MonthlyBudget,
        ConfigField::FixedExpenses,
        ConfigField::SpendingLimit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ConfigField::MonthlyBudget => "monthly_budget",
            ConfigField::FixedExpenses => "fixed_expenses",
            ConfigField::SpendingLimit => "spending_limit",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigField::MonthlyBudget => "Monthly budget",
            ConfigField::FixedExpenses => "Fixed expenses",
            ConfigField::SpendingLimit => "Spending limit",
        };
        f.write_str(label)
    }
}

/// Settings are non-negative and finite; anything else reads as unset.
pub fn sanitize_setting(value: f64) -> f64 {
    coerce_amount(value).max(0.0)
}
