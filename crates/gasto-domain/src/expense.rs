//! Expense records as persisted per user, plus the draft payload used to create or overwrite them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    category::ExpenseCategory,
    common::{coerce_amount, lenient_amount, lenient_date, lenient_text, lenient_timestamp},
};

/// A single recorded expense.
///
/// Decoding is lenient: a non-numeric amount reads as `0.0`, a malformed date reads as
/// `None`, and a category of any other type reads as `other`. Only the id is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn new(
        amount: f64,
        date: NaiveDate,
        description: impl Into<String>,
        category: ExpenseCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            date: Some(date),
            description: description.into(),
            category,
            created_at: Utc::now(),
        }
    }

    /// Materializes a draft under a repository-assigned identifier.
    pub fn from_draft(id: Uuid, draft: ExpenseDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: draft.amount,
            date: Some(draft.date),
            description: draft.description,
            category: draft.category,
            created_at,
        }
    }

    /// Replaces every user-editable field. Identity and creation time are kept.
    pub fn overwrite(&mut self, draft: ExpenseDraft) {
        self.amount = draft.amount;
        self.date = Some(draft.date);
        self.description = draft.description;
        self.category = draft.category;
    }

    /// Amount as used in every sum: always finite.
    pub fn amount_value(&self) -> f64 {
        coerce_amount(self.amount)
    }

    /// Rebuilds the editable fields, or `None` when the stored date is unusable.
    pub fn to_draft(&self) -> Option<ExpenseDraft> {
        self.date.map(|date| ExpenseDraft {
            amount: self.amount,
            date,
            description: self.description.clone(),
            category: self.category,
        })
    }
}

/// User-entered expense fields, used for both creation and full-field updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
}

impl ExpenseDraft {
    pub fn new(
        amount: f64,
        date: NaiveDate,
        description: impl Into<String>,
        category: ExpenseCategory,
    ) -> Self {
        Self {
            amount,
            date,
            description: description.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_fields_decode_to_safe_defaults() {
        let json = r#"{
            "id": "6f1c1f8e-0f7e-4a43-9df5-5d1f6ad0c001",
            "amount": "not a number",
            "date": "yesterday",
            "description": "Lunch",
            "category": "mascotas"
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.date, None);
        assert_eq!(record.category, ExpenseCategory::Other);
    }

    #[test]
    fn numeric_strings_and_missing_amounts_are_accepted() {
        let json = r#"{
            "id": "6f1c1f8e-0f7e-4a43-9df5-5d1f6ad0c002",
            "amount": "125.50",
            "date": "2024-05-02",
            "category": "transporte"
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.amount, 125.5);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(record.category, ExpenseCategory::Transport);

        let json = r#"{ "id": "6f1c1f8e-0f7e-4a43-9df5-5d1f6ad0c003", "amount": null }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.amount, 0.0);
    }

    #[test]
    fn foreign_category_and_description_types_keep_the_record() {
        let json = r#"{
            "id": "6f1c1f8e-0f7e-4a43-9df5-5d1f6ad0c004",
            "amount": 300,
            "date": "2024-05-02",
            "description": 1234,
            "category": 7,
            "created_at": false
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.amount_value(), 300.0);
        assert_eq!(record.description, "1234");
        assert_eq!(record.category, ExpenseCategory::Other);
    }

    #[test]
    fn overwrite_keeps_identity() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut record = ExpenseRecord::new(10.0, date, "Bus", ExpenseCategory::Transport);
        let id = record.id;
        let created = record.created_at;
        let next = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        record.overwrite(ExpenseDraft::new(12.0, next, "Taxi", ExpenseCategory::Transport));
        assert_eq!(record.id, id);
        assert_eq!(record.created_at, created);
        assert_eq!(record.amount, 12.0);
        assert_eq!(record.date, Some(next));
        assert_eq!(record.description, "Taxi");
    }
}
