//! Terminal rendering of dashboard summaries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gasto_core::{
    AlertSeverity, BudgetStatus, CurrencyFormatter, DashboardSummary, DateFormatter,
    LocaleFormatter, PresentationAdapter,
};
use serde::Serialize;

use super::output;

const BAR_WIDTH: usize = 20;

/// Keeps the latest summary for the `summary` command and announces alert changes as they
/// happen.
pub struct TerminalPresenter {
    formatter: Arc<LocaleFormatter>,
    latest: Mutex<Option<DashboardSummary>>,
    last_alert: Mutex<Option<AlertSeverity>>,
}

impl TerminalPresenter {
    pub fn new(formatter: Arc<LocaleFormatter>) -> Self {
        Self {
            formatter,
            latest: Mutex::new(None),
            last_alert: Mutex::new(None),
        }
    }

    pub fn latest(&self) -> Option<DashboardSummary> {
        lock(&self.latest).clone()
    }

    /// Dashboard lines for the most recent render, if any.
    pub fn latest_lines(&self) -> Option<Vec<String>> {
        self.latest()
            .map(|summary| dashboard_lines(&summary, &self.formatter))
    }
}

impl PresentationAdapter for TerminalPresenter {
    fn render(&self, summary: &DashboardSummary) {
        let severity = summary.alert.as_ref().map(|alert| alert.severity);
        let previous = std::mem::replace(&mut *lock(&self.last_alert), severity);
        if severity != previous {
            if let Some(alert) = &summary.alert {
                output::warning(&alert.message);
            }
        }
        tracing::debug!(
            period_total = summary.totals.period_total,
            filtered = summary.filtered_count,
            "dashboard rendered"
        );
        *lock(&self.latest) = Some(summary.clone());
    }

    fn clear(&self) {
        *lock(&self.latest) = None;
        *lock(&self.last_alert) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Human-readable dashboard, one entry per output line.
pub fn dashboard_lines(summary: &DashboardSummary, formatter: &LocaleFormatter) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Range        : {} to {} ({} days)",
            formatter.format_date(summary.range.from()),
            formatter.format_date(summary.range.to()),
            summary.range.day_count()
        ),
        format!(
            "Period total : {} (fixed expenses {})",
            formatter.format_amount(summary.totals.period_total),
            formatter.format_amount(summary.configuration.fixed_expenses)
        ),
        format!(
            "Today        : {}",
            formatter.format_amount(summary.totals.today_total)
        ),
        format!(
            "Last 7 days  : {}",
            formatter.format_amount(summary.totals.weekly_total)
        ),
    ];

    match summary.budget {
        BudgetStatus::Unset => lines.push("Budget       : not set".to_string()),
        BudgetStatus::Tracked {
            monthly_budget,
            remaining,
            used_percent,
        } => {
            lines.push(format!(
                "Budget       : {} (remaining {})",
                formatter.format_amount(monthly_budget),
                formatter.format_amount(remaining)
            ));
            lines.push(format!(
                "Usage        : {} {:.1}%",
                progress_bar(&summary.budget),
                used_percent
            ));
        }
    }

    if summary.breakdown.is_empty() {
        lines.push("No expenses in this range.".to_string());
    } else {
        lines.push(format!("Categories ({} expenses):", summary.filtered_count));
        for bucket in &summary.breakdown {
            let label = format!("{:<10}", bucket.category.label());
            lines.push(format!(
                "  {} {:>16} {:>6.1}%",
                output::paint_hex(&label, bucket.category.color()),
                formatter.format_amount(bucket.amount),
                bucket.percent_of_total
            ));
        }
        lines.push(format!(
            "  Chart total: {}",
            formatter.format_plain(summary.spent_in_range)
        ));
    }

    if let Some(alert) = &summary.alert {
        lines.push(format!("Alert ({}) : {}", alert.severity, alert.message));
    }
    lines
}

fn progress_bar(status: &BudgetStatus) -> String {
    let (Some(progress), Some(level)) = (status.progress_percent(), status.usage_level()) else {
        return String::new();
    };
    let filled = ((progress / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "[{}{}]",
        "#".repeat(filled.min(BAR_WIDTH)),
        "-".repeat(BAR_WIDTH.saturating_sub(filled))
    );
    output::paint_hex(&bar, level.color())
}

/// Machine-readable form of a summary for `summary --json`.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub from: String,
    pub to: String,
    pub expense_count: usize,
    pub period_total: f64,
    pub today_total: f64,
    pub weekly_total: f64,
    pub monthly_budget: Option<f64>,
    pub remaining: Option<f64>,
    pub used_percent: Option<f64>,
    pub categories: Vec<CategoryReport>,
    pub alert: Option<AlertReport>,
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub category: &'static str,
    pub amount: f64,
    pub percent: f64,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AlertReport {
    pub severity: String,
    pub percent: f64,
    pub message: String,
}

impl From<&DashboardSummary> for SummaryReport {
    fn from(summary: &DashboardSummary) -> Self {
        let monthly_budget = match summary.budget {
            BudgetStatus::Unset => None,
            BudgetStatus::Tracked { monthly_budget, .. } => Some(monthly_budget),
        };
        Self {
            from: summary.range.from().to_string(),
            to: summary.range.to().to_string(),
            expense_count: summary.filtered_count,
            period_total: summary.totals.period_total,
            today_total: summary.totals.today_total,
            weekly_total: summary.totals.weekly_total,
            monthly_budget,
            remaining: summary.budget.remaining(),
            used_percent: summary.budget.used_percent(),
            categories: summary
                .breakdown
                .iter()
                .map(|bucket| CategoryReport {
                    category: bucket.category.key(),
                    amount: bucket.amount,
                    percent: bucket.percent_of_total,
                    color: bucket.category.color(),
                })
                .collect(),
            alert: summary.alert.as_ref().map(|alert| AlertReport {
                severity: alert.severity.to_string(),
                percent: alert.percent,
                message: alert.message.clone(),
            }),
        }
    }
}
