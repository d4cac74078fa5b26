//! Expense aggregation over a date range: totals, budget usage, and the category breakdown.

use chrono::{Duration, NaiveDate};
use gasto_domain::{coerce_amount, BudgetConfiguration, DateRange, ExpenseCategory, ExpenseRecord};

use crate::{
    alert_service::{AlertService, BudgetAlert},
    format::CurrencyFormatter,
    time::Clock,
};

/// Spending totals for the selected range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Range spend plus fixed expenses.
    pub period_total: f64,
    pub today_total: f64,
    /// Spend dated within the last seven days.
    pub weekly_total: f64,
}

/// Budget usage relative to the monthly budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetStatus {
    /// No monthly budget configured; render a neutral state.
    Unset,
    Tracked {
        monthly_budget: f64,
        remaining: f64,
        /// Unclamped; above 100 signals overspend.
        used_percent: f64,
    },
}

impl BudgetStatus {
    pub fn remaining(&self) -> Option<f64> {
        match self {
            BudgetStatus::Unset => None,
            BudgetStatus::Tracked { remaining, .. } => Some(*remaining),
        }
    }

    pub fn used_percent(&self) -> Option<f64> {
        match self {
            BudgetStatus::Unset => None,
            BudgetStatus::Tracked { used_percent, .. } => Some(*used_percent),
        }
    }

    /// Usage clamped to 100 for progress bars.
    pub fn progress_percent(&self) -> Option<f64> {
        self.used_percent().map(|percent| percent.clamp(0.0, 100.0))
    }

    pub fn usage_level(&self) -> Option<BudgetUsageLevel> {
        self.used_percent().map(BudgetUsageLevel::for_percent)
    }
}

/// Colour band of the budget progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetUsageLevel {
    /// Below 60% used.
    Healthy,
    /// 60% up to 90% used.
    Caution,
    /// 90% or more used.
    Danger,
}

impl BudgetUsageLevel {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 60.0 {
            BudgetUsageLevel::Healthy
        } else if percent < 90.0 {
            BudgetUsageLevel::Caution
        } else {
            BudgetUsageLevel::Danger
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            BudgetUsageLevel::Healthy => "#4bb543",
            BudgetUsageLevel::Caution => "#f9c74f",
            BudgetUsageLevel::Danger => "#ef476f",
        }
    }
}

/// One slice of the category breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryBucket {
    pub category: ExpenseCategory,
    pub amount: f64,
    pub percent_of_total: f64,
}

/// Everything a presenter needs, computed from a single consistent set of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub configuration: BudgetConfiguration,
    pub filtered_count: usize,
    /// Range spend without fixed expenses.
    pub spent_in_range: f64,
    pub totals: Totals,
    pub budget: BudgetStatus,
    /// Empty when no expenses fall in the range.
    pub breakdown: Vec<CategoryBucket>,
    pub alert: Option<BudgetAlert>,
}

impl DashboardSummary {
    pub fn has_data(&self) -> bool {
        !self.breakdown.is_empty()
    }
}

/// Stateless aggregation helpers that operate over expense snapshots.
pub struct AggregationService;

impl AggregationService {
    /// Keeps records dated within `range` (inclusive), preserving their relative order.
    /// Records without a usable date are excluded.
    pub fn filter_by_date(records: &[ExpenseRecord], range: &DateRange) -> Vec<ExpenseRecord> {
        records
            .iter()
            .filter(|record| record.date.is_some_and(|date| range.contains(date)))
            .cloned()
            .collect()
    }

    pub fn sum_amounts<'a>(records: impl IntoIterator<Item = &'a ExpenseRecord>) -> f64 {
        records.into_iter().map(ExpenseRecord::amount_value).sum()
    }

    /// Computes period, today, and last-seven-days totals. Fixed expenses count once, in the
    /// period total only. The weekly cutoff is taken from `today` so both windows share one
    /// calendar.
    pub fn compute_totals(
        filtered: &[ExpenseRecord],
        fixed_expenses: f64,
        today: NaiveDate,
    ) -> Totals {
        let week_start = today - Duration::days(7);
        let spent = Self::sum_amounts(filtered);
        let today_total =
            Self::sum_amounts(filtered.iter().filter(|record| record.date == Some(today)));
        let weekly_total = Self::sum_amounts(
            filtered
                .iter()
                .filter(|record| record.date.is_some_and(|date| date >= week_start)),
        );

        Totals {
            period_total: spent + coerce_amount(fixed_expenses),
            today_total,
            weekly_total,
        }
    }

    pub fn compute_budget_status(period_total: f64, monthly_budget: f64) -> BudgetStatus {
        let monthly_budget = coerce_amount(monthly_budget);
        if monthly_budget <= 0.0 {
            return BudgetStatus::Unset;
        }
        let period_total = coerce_amount(period_total);
        BudgetStatus::Tracked {
            monthly_budget,
            remaining: (monthly_budget - period_total).max(0.0),
            used_percent: period_total / monthly_budget * 100.0,
        }
    }

    /// Groups amounts per category, sorted by amount descending. Equal amounts keep the
    /// order in which their category first appeared.
    pub fn compute_category_breakdown(filtered: &[ExpenseRecord]) -> Vec<CategoryBucket> {
        let mut sums: Vec<(ExpenseCategory, f64)> =
            Vec::with_capacity(ExpenseCategory::ALL.len());
        for record in filtered {
            let amount = record.amount_value();
            match sums.iter_mut().find(|(category, _)| *category == record.category) {
                Some((_, total)) => *total += amount,
                None => sums.push((record.category, amount)),
            }
        }

        let total: f64 = sums.iter().map(|(_, amount)| amount).sum();
        let mut buckets: Vec<CategoryBucket> = sums
            .into_iter()
            .map(|(category, amount)| CategoryBucket {
                category,
                amount,
                percent_of_total: if total == 0.0 {
                    0.0
                } else {
                    amount / total * 100.0
                },
            })
            .collect();
        buckets.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        buckets
    }

    /// Full recomputation for one set of inputs.
    pub fn summarize(
        records: &[ExpenseRecord],
        range: DateRange,
        configuration: &BudgetConfiguration,
        clock: &dyn Clock,
        formatter: &dyn CurrencyFormatter,
    ) -> DashboardSummary {
        let filtered = Self::filter_by_date(records, &range);
        let totals = Self::compute_totals(&filtered, configuration.fixed_expenses, clock.today());
        let budget =
            Self::compute_budget_status(totals.period_total, configuration.monthly_budget);
        let alert = AlertService::evaluate(
            totals.period_total,
            configuration.spending_limit,
            formatter,
        );

        tracing::debug!(
            range = %range,
            records = records.len(),
            filtered = filtered.len(),
            period_total = totals.period_total,
            "dashboard recomputed"
        );

        DashboardSummary {
            range,
            configuration: *configuration,
            filtered_count: filtered.len(),
            spent_in_range: Self::sum_amounts(&filtered),
            totals,
            budget,
            breakdown: Self::compute_category_breakdown(&filtered),
            alert,
        }
    }
}
