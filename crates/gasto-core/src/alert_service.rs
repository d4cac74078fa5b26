//! Spending-limit alerts.

use std::fmt;

use gasto_domain::coerce_amount;

use crate::format::CurrencyFormatter;

pub const INFO_THRESHOLD_PERCENT: f64 = 80.0;
pub const WARNING_THRESHOLD_PERCENT: f64 = 90.0;
pub const CRITICAL_THRESHOLD_PERCENT: f64 = 100.0;

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertSeverity {
    /// Approaching the limit (80% or more).
    Info,
    /// Very close to the limit (90% or more).
    Warning,
    /// Limit reached or exceeded.
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetAlert {
    pub severity: AlertSeverity,
    /// Spend as a percentage of the limit, rounded to one decimal.
    pub percent: f64,
    pub total_spent: f64,
    pub spending_limit: f64,
    pub message: String,
}

pub struct AlertService;

impl AlertService {
    /// Severity tier for the given spend, or `None` below 80% or without a limit.
    pub fn severity_for(total_spent: f64, spending_limit: f64) -> Option<AlertSeverity> {
        let percent = Self::percent_of_limit(total_spent, spending_limit)?;
        if percent >= CRITICAL_THRESHOLD_PERCENT {
            Some(AlertSeverity::Critical)
        } else if percent >= WARNING_THRESHOLD_PERCENT {
            Some(AlertSeverity::Warning)
        } else if percent >= INFO_THRESHOLD_PERCENT {
            Some(AlertSeverity::Info)
        } else {
            None
        }
    }

    pub fn evaluate(
        total_spent: f64,
        spending_limit: f64,
        formatter: &dyn CurrencyFormatter,
    ) -> Option<BudgetAlert> {
        let severity = Self::severity_for(total_spent, spending_limit)?;
        let percent = Self::percent_of_limit(total_spent, spending_limit)?;
        let rounded = (percent * 10.0).round() / 10.0;
        let headline = match severity {
            AlertSeverity::Critical => "Spending limit exceeded",
            AlertSeverity::Warning => "Very close to the spending limit",
            AlertSeverity::Info => "Approaching the spending limit",
        };
        let message = format!(
            "{}: {} of {} ({:.1}%)",
            headline,
            formatter.format_amount(total_spent),
            formatter.format_amount(spending_limit),
            percent
        );

        Some(BudgetAlert {
            severity,
            percent: rounded,
            total_spent: coerce_amount(total_spent),
            spending_limit,
            message,
        })
    }

    fn percent_of_limit(total_spent: f64, spending_limit: f64) -> Option<f64> {
        let limit = coerce_amount(spending_limit);
        if limit <= 0.0 {
            return None;
        }
        Some(coerce_amount(total_spent) * 100.0 / limit)
    }
}
