use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use gasto::init;
use gasto_core::{
    AlertSeverity, AuthEvent, BudgetStatus, CurrencyLocale, DashboardSession, DashboardSummary,
    ExpenseQuery, FixedClock, LocaleFormatter, PresentationAdapter,
};
use gasto_domain::{ConfigField, ConfigurationPatch, ExpenseCategory, ExpenseDraft, UserId};
use gasto_storage_json::JsonExpenseStore;
use tempfile::tempdir;

#[derive(Default)]
struct Screen {
    frames: Mutex<Vec<Option<DashboardSummary>>>,
}

impl Screen {
    fn last(&self) -> Option<DashboardSummary> {
        self.frames.lock().unwrap().last().cloned().flatten()
    }
}

impl PresentationAdapter for Screen {
    fn render(&self, summary: &DashboardSummary) {
        self.frames.lock().unwrap().push(Some(summary.clone()));
    }

    fn clear(&self) {
        self.frames.lock().unwrap().push(None);
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session(root: std::path::PathBuf, screen: Arc<Screen>) -> DashboardSession {
    let store = Arc::new(JsonExpenseStore::new(root).unwrap());
    DashboardSession::new(
        store.clone(),
        store,
        screen,
        Arc::new(FixedClock::on(date(2024, 5, 15))),
        Arc::new(LocaleFormatter::new(CurrencyLocale::es_ar())),
    )
}

#[test]
fn dashboard_follows_stored_expenses_across_sessions() {
    init();
    let dir = tempdir().unwrap();
    let screen = Arc::new(Screen::default());
    let first = session(dir.path().to_path_buf(), screen.clone());
    let alice = UserId::new("alice");

    first
        .handle_auth_event(AuthEvent::LoggedIn(alice.clone()))
        .unwrap();
    first
        .update_configuration(&ConfigurationPatch {
            monthly_budget: Some(1000.0),
            fixed_expenses: Some(200.0),
            spending_limit: Some(800.0),
        })
        .unwrap();
    first
        .add_expense(ExpenseDraft::new(
            450.0,
            date(2024, 5, 14),
            "Groceries",
            ExpenseCategory::Food,
        ))
        .unwrap();
    first
        .add_expense(ExpenseDraft::new(
            60.0,
            date(2024, 4, 30),
            "Taxi",
            ExpenseCategory::Transport,
        ))
        .unwrap();

    let summary = screen.last().expect("rendered");
    assert_eq!(summary.filtered_count, 1);
    assert_eq!(summary.totals.period_total, 650.0);
    assert_eq!(summary.totals.weekly_total, 450.0);
    assert_eq!(
        summary.budget,
        BudgetStatus::Tracked {
            monthly_budget: 1000.0,
            remaining: 350.0,
            used_percent: 65.0,
        }
    );
    assert_eq!(
        summary.alert.map(|alert| alert.severity),
        Some(AlertSeverity::Info)
    );

    first.handle_auth_event(AuthEvent::LoggedOut).unwrap();
    assert!(screen.last().is_none());

    let second_screen = Arc::new(Screen::default());
    let second = session(dir.path().to_path_buf(), second_screen.clone());
    second.login(alice).unwrap();
    let listing = second.expenses(&ExpenseQuery::all().with_search("taxi"));
    assert_eq!(listing.records.len(), 1);
    assert_eq!(listing.total, 260.0);
    assert_eq!(second.configuration().get(ConfigField::SpendingLimit), 800.0);
    assert_eq!(
        second_screen.last().expect("rendered").totals.period_total,
        650.0
    );
}
