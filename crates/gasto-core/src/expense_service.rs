use std::cmp::Ordering;

use gasto_domain::{coerce_amount, ExpenseCategory, ExpenseDraft, ExpenseRecord};

use crate::{aggregation_service::AggregationService, CoreError};

/// Filter applied to the expense listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub search: Option<String>,
    /// `None` lists every category.
    pub category: Option<ExpenseCategory>,
}

impl ExpenseQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let trimmed = term.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let needle = term.to_lowercase();
        record.description.to_lowercase().contains(&needle)
            || record.category.key().contains(&needle)
            || record.category.label().to_lowercase().contains(&needle)
            || record.amount.to_string().contains(&needle)
    }
}

pub struct ExpenseService;

impl ExpenseService {
    /// Rejects drafts that would corrupt aggregates: non-finite or non-positive amounts and
    /// blank descriptions.
    pub fn validate(draft: &ExpenseDraft) -> Result<(), CoreError> {
        if !draft.amount.is_finite() {
            return Err(CoreError::Validation("amount must be a number".into()));
        }
        if draft.amount <= 0.0 {
            return Err(CoreError::Validation(
                "amount must be greater than zero".into(),
            ));
        }
        if draft.description.trim().is_empty() {
            return Err(CoreError::Validation("description cannot be empty".into()));
        }
        Ok(())
    }

    /// Records matching `query`, newest first.
    pub fn search(records: &[ExpenseRecord], query: &ExpenseQuery) -> Vec<ExpenseRecord> {
        let mut listed: Vec<ExpenseRecord> = records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        Self::sort_newest_first(&mut listed);
        listed
    }

    /// Footer total of a listing: listed amounts plus fixed expenses.
    pub fn listing_total(records: &[ExpenseRecord], fixed_expenses: f64) -> f64 {
        AggregationService::sum_amounts(records) + coerce_amount(fixed_expenses)
    }

    /// Orders by date descending, then by creation time descending. Undated records sink.
    pub fn sort_newest_first(records: &mut [ExpenseRecord]) {
        records.sort_by(|a, b| match (a.date, b.date) {
            (Some(left), Some(right)) => right
                .cmp(&left)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        });
    }
}

/// Cleans a typed amount: keeps digits and the first `.`, then at most two decimals.
/// Returns `None` when nothing numeric is left.
pub fn parse_amount_input(text: &str) -> Option<f64> {
    let mut cleaned = String::with_capacity(text.len());
    let mut seen_dot = false;
    let mut decimals = 0;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if seen_dot {
                if decimals == 2 {
                    continue;
                }
                decimals += 1;
            }
            cleaned.push(ch);
        } else if ch == '.' && !seen_dot {
            seen_dot = true;
            cleaned.push(ch);
        }
    }

    let digits = cleaned.trim_end_matches('.');
    if digits.is_empty() || digits == "." {
        return None;
    }
    let normalized = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    normalized.parse::<f64>().ok()
}
