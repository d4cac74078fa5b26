use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use chrono::{NaiveDate, Utc};
use gasto_domain::{
    BudgetConfiguration, ConfigField, ConfigurationPatch, DateRange, ExpenseCategory,
    ExpenseDraft, ExpenseRecord, UserId,
};
use uuid::Uuid;

use crate::{
    aggregation_service::{AggregationService, BudgetStatus, BudgetUsageLevel, DashboardSummary},
    alert_service::{AlertService, AlertSeverity},
    config_store::ConfigurationChange,
    expense_service::ExpenseQuery,
    format::{CurrencyLocale, LocaleFormatter},
    repository::{ConfigurationPersistence, ExpenseRepository, SnapshotListener, Subscription},
    session::{AuthEvent, DashboardSession, PresentationAdapter},
    time::{Clock, FixedClock},
    CoreError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(amount: f64, on: NaiveDate, category: ExpenseCategory) -> ExpenseRecord {
    ExpenseRecord::new(amount, on, "expense", category)
}

fn may_2024() -> DateRange {
    DateRange::new(date(2024, 5, 1), date(2024, 5, 31))
}

fn formatter() -> LocaleFormatter {
    LocaleFormatter::new(CurrencyLocale::es_ar())
}

#[test]
fn period_total_includes_fixed_and_breakdown_splits_by_category() {
    let records = vec![
        expense(100.0, date(2024, 5, 1), ExpenseCategory::Food),
        expense(50.0, date(2024, 5, 2), ExpenseCategory::Transport),
    ];
    let filtered = AggregationService::filter_by_date(&records, &may_2024());
    let clock = FixedClock::on(date(2024, 5, 20));
    let totals = AggregationService::compute_totals(&filtered, 20.0, clock.today());
    assert_eq!(totals.period_total, 170.0);

    let breakdown = AggregationService::compute_category_breakdown(&filtered);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].category, ExpenseCategory::Food);
    assert_eq!(breakdown[0].amount, 100.0);
    assert!((breakdown[0].percent_of_total - 66.666).abs() < 0.01);
    assert_eq!(breakdown[1].category, ExpenseCategory::Transport);
    assert!((breakdown[1].percent_of_total - 33.333).abs() < 0.01);
}

#[test]
fn zero_budget_is_unset_whatever_the_spend() {
    let status = AggregationService::compute_budget_status(500.0, 0.0);
    assert_eq!(status, BudgetStatus::Unset);
    assert!(status.progress_percent().is_none());
}

#[test]
fn alert_tiers_follow_limit_percentage() {
    let fmt = formatter();
    let warning = AlertService::evaluate(950.0, 1000.0, &fmt).expect("warning");
    assert_eq!(warning.severity, AlertSeverity::Warning);
    assert_eq!(warning.percent, 95.0);

    let critical = AlertService::evaluate(1200.0, 1000.0, &fmt).expect("critical");
    assert_eq!(critical.severity, AlertSeverity::Critical);
    assert_eq!(critical.percent, 120.0);
    assert!(critical.message.contains("$ 1.200,00"));

    let info = AlertService::evaluate(800.0, 1000.0, &fmt).expect("info");
    assert_eq!(info.severity, AlertSeverity::Info);
    assert!(AlertService::evaluate(799.0, 1000.0, &fmt).is_none());
    assert!(AlertService::evaluate(5000.0, 0.0, &fmt).is_none());
}

#[test]
fn empty_input_produces_empty_breakdown_and_zero_totals() {
    let clock = FixedClock::on(date(2024, 5, 20));
    assert!(AggregationService::compute_category_breakdown(&[]).is_empty());
    let totals = AggregationService::compute_totals(&[], 0.0, clock.today());
    assert_eq!(totals.period_total, 0.0);
    assert_eq!(totals.today_total, 0.0);
    assert_eq!(totals.weekly_total, 0.0);
}

#[test]
fn date_filter_is_inclusive_and_skips_undated_records() {
    let mut undated = expense(999.0, date(2024, 5, 10), ExpenseCategory::Other);
    undated.date = None;
    let records = vec![
        expense(1.0, date(2024, 4, 30), ExpenseCategory::Food),
        expense(2.0, date(2024, 5, 1), ExpenseCategory::Food),
        expense(3.0, date(2024, 5, 31), ExpenseCategory::Food),
        expense(4.0, date(2024, 6, 1), ExpenseCategory::Food),
        undated,
    ];
    let filtered = AggregationService::filter_by_date(&records, &may_2024());
    let amounts: Vec<f64> = filtered.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![2.0, 3.0]);
}

#[test]
fn today_and_weekly_totals_share_one_calendar_day() {
    let records = vec![
        expense(10.0, date(2024, 5, 20), ExpenseCategory::Food),
        expense(20.0, date(2024, 5, 13), ExpenseCategory::Food),
        expense(40.0, date(2024, 5, 12), ExpenseCategory::Food),
    ];
    let totals = AggregationService::compute_totals(&records, 100.0, date(2024, 5, 20));
    assert_eq!(totals.today_total, 10.0);
    assert_eq!(totals.weekly_total, 30.0);
    assert_eq!(totals.period_total, 170.0);
}

#[test]
fn non_finite_amounts_count_as_zero_in_every_total() {
    let mut nan = expense(0.0, date(2024, 5, 20), ExpenseCategory::Food);
    nan.amount = f64::NAN;
    let mut infinite = expense(0.0, date(2024, 5, 19), ExpenseCategory::Leisure);
    infinite.amount = f64::INFINITY;
    let mut negative_infinite = expense(0.0, date(2024, 5, 18), ExpenseCategory::Food);
    negative_infinite.amount = f64::NEG_INFINITY;
    let records = vec![
        nan,
        infinite,
        negative_infinite,
        expense(25.0, date(2024, 5, 20), ExpenseCategory::Food),
    ];

    let totals = AggregationService::compute_totals(&records, f64::NAN, date(2024, 5, 20));
    assert_eq!(totals.period_total, 25.0);
    assert_eq!(totals.today_total, 25.0);
    assert_eq!(totals.weekly_total, 25.0);

    let breakdown = AggregationService::compute_category_breakdown(&records);
    assert!(breakdown
        .iter()
        .all(|bucket| bucket.amount.is_finite() && bucket.percent_of_total.is_finite()));
    assert_eq!(breakdown[0].category, ExpenseCategory::Food);
    assert_eq!(breakdown[0].amount, 25.0);
    assert_eq!(breakdown[0].percent_of_total, 100.0);
    assert_eq!(breakdown[1].amount, 0.0);
    assert_eq!(breakdown[1].percent_of_total, 0.0);
}

#[test]
fn breakdown_partitions_the_filtered_spend() {
    let records = vec![
        expense(12.5, date(2024, 5, 3), ExpenseCategory::Leisure),
        expense(30.0, date(2024, 5, 4), ExpenseCategory::Health),
        expense(7.5, date(2024, 5, 5), ExpenseCategory::Leisure),
        expense(30.0, date(2024, 5, 6), ExpenseCategory::Services),
        expense(0.0, date(2024, 5, 7), ExpenseCategory::Other),
    ];
    let breakdown = AggregationService::compute_category_breakdown(&records);
    let amount_sum: f64 = breakdown.iter().map(|b| b.amount).sum();
    let percent_sum: f64 = breakdown.iter().map(|b| b.percent_of_total).sum();
    assert_eq!(amount_sum, AggregationService::sum_amounts(&records));
    assert!((percent_sum - 100.0).abs() < 1e-9);

    // ties keep first-seen order: health before services
    let order: Vec<ExpenseCategory> = breakdown.iter().map(|b| b.category).collect();
    assert_eq!(
        order,
        vec![
            ExpenseCategory::Health,
            ExpenseCategory::Services,
            ExpenseCategory::Leisure,
            ExpenseCategory::Other,
        ]
    );
}

#[test]
fn all_zero_amounts_report_zero_percent() {
    let records = vec![expense(0.0, date(2024, 5, 3), ExpenseCategory::Food)];
    let breakdown = AggregationService::compute_category_breakdown(&records);
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].percent_of_total, 0.0);
}

#[test]
fn alert_severity_never_decreases_as_spend_grows() {
    let mut previous = None;
    for step in 0..=150 {
        let spent = f64::from(step) * 10.0;
        let severity = AlertService::severity_for(spent, 1000.0);
        assert!(severity >= previous, "severity dropped at {spent}");
        previous = severity;
    }
    assert_eq!(previous, Some(AlertSeverity::Critical));
}

#[test]
fn budget_status_tracks_usage_bands() {
    let status = AggregationService::compute_budget_status(1200.0, 1000.0);
    assert_eq!(status.remaining(), Some(0.0));
    assert_eq!(status.used_percent(), Some(120.0));
    assert_eq!(status.progress_percent(), Some(100.0));
    assert_eq!(status.usage_level(), Some(BudgetUsageLevel::Danger));

    let calm = AggregationService::compute_budget_status(300.0, 1000.0);
    assert_eq!(calm.remaining(), Some(700.0));
    assert_eq!(calm.usage_level(), Some(BudgetUsageLevel::Healthy));
    assert_eq!(
        BudgetUsageLevel::for_percent(60.0),
        BudgetUsageLevel::Caution
    );
}

#[test]
fn summarize_is_deterministic_for_identical_inputs() {
    let records = vec![
        expense(400.0, date(2024, 5, 2), ExpenseCategory::Food),
        expense(450.0, date(2024, 5, 9), ExpenseCategory::Services),
    ];
    let configuration = BudgetConfiguration::new(2000.0, 100.0, 1000.0);
    let clock = FixedClock::on(date(2024, 5, 9));
    let fmt = formatter();

    let first = AggregationService::summarize(&records, may_2024(), &configuration, &clock, &fmt);
    let second = AggregationService::summarize(&records, may_2024(), &configuration, &clock, &fmt);
    assert_eq!(first, second);
    assert_eq!(first.totals.period_total, 950.0);
    assert_eq!(first.spent_in_range, 850.0);
    assert_eq!(first.filtered_count, 2);
    assert_eq!(
        first.alert.as_ref().map(|alert| alert.severity),
        Some(AlertSeverity::Warning)
    );
    assert!(first.has_data());
}

#[derive(Default)]
struct MemoryInner {
    records: Mutex<HashMap<UserId, Vec<ExpenseRecord>>>,
    listeners: Mutex<Vec<(u64, UserId, SnapshotListener)>>,
    next_listener: AtomicU64,
}

impl MemoryInner {
    fn snapshot(&self, user: &UserId) -> Vec<ExpenseRecord> {
        self.records
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    fn notify(&self, user: &UserId) {
        let snapshot = self.snapshot(user);
        let listeners: Vec<SnapshotListener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, owner, _)| owner == user)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[derive(Default, Clone)]
struct MemoryRepository {
    inner: Arc<MemoryInner>,
}

impl MemoryRepository {
    fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }
}

impl ExpenseRepository for MemoryRepository {
    fn subscribe(
        &self,
        user: &UserId,
        listener: SnapshotListener,
    ) -> Result<Subscription, CoreError> {
        let id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .lock()
            .unwrap()
            .push((id, user.clone(), Arc::clone(&listener)));
        listener(&self.inner.snapshot(user));
        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            inner
                .listeners
                .lock()
                .unwrap()
                .retain(|(listener_id, _, _)| *listener_id != id);
        }))
    }

    fn create(&self, user: &UserId, draft: ExpenseDraft) -> Result<Uuid, CoreError> {
        let id = Uuid::new_v4();
        self.inner
            .records
            .lock()
            .unwrap()
            .entry(user.clone())
            .or_default()
            .push(ExpenseRecord::from_draft(id, draft, Utc::now()));
        self.inner.notify(user);
        Ok(id)
    }

    fn update(&self, user: &UserId, id: Uuid, draft: ExpenseDraft) -> Result<(), CoreError> {
        {
            let mut records = self.inner.records.lock().unwrap();
            let record = records
                .get_mut(user)
                .and_then(|list| list.iter_mut().find(|record| record.id == id))
                .ok_or(CoreError::ExpenseNotFound(id))?;
            record.overwrite(draft);
        }
        self.inner.notify(user);
        Ok(())
    }

    fn delete(&self, user: &UserId, id: Uuid) -> Result<(), CoreError> {
        {
            let mut records = self.inner.records.lock().unwrap();
            let list = records.entry(user.clone()).or_default();
            let before = list.len();
            list.retain(|record| record.id != id);
            if list.len() == before {
                return Err(CoreError::ExpenseNotFound(id));
            }
        }
        self.inner.notify(user);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryPersistence {
    documents: Mutex<HashMap<UserId, BudgetConfiguration>>,
}

impl ConfigurationPersistence for MemoryPersistence {
    fn read(&self, user: &UserId) -> Result<BudgetConfiguration, CoreError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(user)
            .copied()
            .unwrap_or_default())
    }

    fn write(&self, user: &UserId, patch: &ConfigurationPatch) -> Result<(), CoreError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents.entry(user.clone()).or_default();
        *document = patch.apply_to(*document);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPresenter {
    rendered: Mutex<Vec<DashboardSummary>>,
    clears: AtomicUsize,
}

impl RecordingPresenter {
    fn last(&self) -> DashboardSummary {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one render")
    }

    fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

impl PresentationAdapter for RecordingPresenter {
    fn render(&self, summary: &DashboardSummary) {
        self.rendered.lock().unwrap().push(summary.clone());
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    session: DashboardSession,
    repository: MemoryRepository,
    persistence: Arc<MemoryPersistence>,
    presenter: Arc<RecordingPresenter>,
}

fn harness() -> Harness {
    let repository = MemoryRepository::default();
    let persistence = Arc::new(MemoryPersistence::default());
    let presenter = Arc::new(RecordingPresenter::default());
    let session = DashboardSession::new(
        Arc::new(repository.clone()),
        persistence.clone(),
        presenter.clone(),
        Arc::new(FixedClock::on(date(2024, 5, 15))),
        Arc::new(formatter()),
    );
    Harness {
        session,
        repository,
        persistence,
        presenter,
    }
}

fn draft(amount: f64, on: NaiveDate, category: ExpenseCategory) -> ExpenseDraft {
    ExpenseDraft::new(amount, on, "item", category)
}

#[test]
fn login_loads_configuration_and_current_month() {
    let h = harness();
    let alice = UserId::new("alice");
    h.persistence
        .write(
            &alice,
            &ConfigurationPatch::from(BudgetConfiguration::new(1000.0, 50.0, 800.0)),
        )
        .unwrap();

    h.session
        .handle_auth_event(AuthEvent::LoggedIn(alice.clone()))
        .expect("login");

    assert_eq!(h.session.current_user(), Some(alice));
    assert_eq!(h.session.range(), may_2024());
    let summary = h.presenter.last();
    assert_eq!(summary.configuration.monthly_budget, 1000.0);
    assert_eq!(summary.totals.period_total, 50.0);
    assert!(!summary.has_data());
    assert_eq!(h.repository.listener_count(), 1);
}

#[test]
fn expense_changes_republish_the_summary() {
    let h = harness();
    h.session.login(UserId::new("alice")).unwrap();

    let id = h
        .session
        .add_expense(draft(300.0, date(2024, 5, 15), ExpenseCategory::Food))
        .unwrap();
    assert_eq!(h.presenter.last().totals.today_total, 300.0);

    h.session
        .update_expense(id, draft(450.0, date(2024, 5, 14), ExpenseCategory::Health))
        .unwrap();
    let summary = h.presenter.last();
    assert_eq!(summary.totals.today_total, 0.0);
    assert_eq!(summary.spent_in_range, 450.0);
    assert_eq!(summary.breakdown[0].category, ExpenseCategory::Health);
    assert_eq!(h.session.expense(id).map(|record| record.amount), Some(450.0));

    h.session.delete_expense(id).unwrap();
    assert!(!h.presenter.last().has_data());
    assert!(matches!(
        h.session.delete_expense(id),
        Err(CoreError::ExpenseNotFound(_))
    ));
}

#[test]
fn invalid_drafts_never_reach_the_repository() {
    let h = harness();
    h.session.login(UserId::new("alice")).unwrap();
    let renders = h.presenter.render_count();

    let result = h
        .session
        .add_expense(draft(-10.0, date(2024, 5, 15), ExpenseCategory::Food));
    assert!(matches!(result, Err(CoreError::Validation(_))));
    assert_eq!(h.presenter.render_count(), renders);
    assert!(h.session.expenses(&ExpenseQuery::all()).records.is_empty());
}

#[test]
fn logout_clears_state_and_blocks_mutations() {
    let h = harness();
    h.session.login(UserId::new("alice")).unwrap();
    h.session
        .update_configuration(&ConfigurationPatch::single(
            ConfigField::MonthlyBudget,
            900.0,
        ))
        .unwrap();
    h.session
        .add_expense(draft(10.0, date(2024, 5, 2), ExpenseCategory::Food))
        .unwrap();

    h.session.handle_auth_event(AuthEvent::LoggedOut).unwrap();

    assert_eq!(h.session.current_user(), None);
    assert_eq!(h.session.configuration(), BudgetConfiguration::default());
    assert!(h.session.expenses(&ExpenseQuery::all()).records.is_empty());
    assert_eq!(h.presenter.clears.load(Ordering::SeqCst), 1);
    assert_eq!(h.repository.listener_count(), 0);
    assert!(matches!(
        h.session
            .add_expense(draft(10.0, date(2024, 5, 2), ExpenseCategory::Food)),
        Err(CoreError::NotAuthenticated)
    ));
    assert!(matches!(h.session.summary(), Err(CoreError::NotAuthenticated)));
}

#[test]
fn relogin_switches_streams_without_leaking_records() {
    let h = harness();
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");

    h.session.login(alice.clone()).unwrap();
    h.session
        .add_expense(draft(70.0, date(2024, 5, 3), ExpenseCategory::Leisure))
        .unwrap();

    h.session.login(bob.clone()).unwrap();
    assert_eq!(h.repository.listener_count(), 1);
    assert!(h.session.expenses(&ExpenseQuery::all()).records.is_empty());

    // a write to alice's stream must not reach bob's session
    h.repository
        .create(&alice, draft(5.0, date(2024, 5, 4), ExpenseCategory::Food))
        .unwrap();
    assert!(h.session.expenses(&ExpenseQuery::all()).records.is_empty());
    assert_eq!(h.session.summary().unwrap().spent_in_range, 0.0);
}

#[test]
fn configuration_updates_persist_and_notify() {
    let h = harness();
    let alice = UserId::new("alice");
    h.session.login(alice.clone()).unwrap();

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    let id = h
        .session
        .subscribe_configuration(Box::new(move |change: &ConfigurationChange| {
            sink.lock().unwrap().push(change.changed.clone());
        }));

    h.session
        .update_configuration(&ConfigurationPatch {
            monthly_budget: Some(1000.0),
            fixed_expenses: None,
            spending_limit: Some(500.0),
        })
        .unwrap();
    h.session
        .reset_configuration_field(ConfigField::SpendingLimit)
        .unwrap();

    assert_eq!(
        h.persistence.read(&alice).unwrap(),
        BudgetConfiguration::new(1000.0, 0.0, 0.0)
    );
    assert_eq!(
        *changes.lock().unwrap(),
        vec![
            vec![ConfigField::MonthlyBudget, ConfigField::SpendingLimit],
            vec![ConfigField::SpendingLimit],
        ]
    );
    assert!(h.session.unsubscribe_configuration(id));
    assert!(matches!(
        h.presenter.last().budget,
        BudgetStatus::Tracked { .. }
    ));
}

#[test]
fn range_changes_keep_bounds_ordered() {
    let h = harness();
    h.session.login(UserId::new("alice")).unwrap();
    h.session
        .add_expense(draft(25.0, date(2024, 4, 28), ExpenseCategory::Food))
        .unwrap();
    assert_eq!(h.presenter.last().filtered_count, 0);

    let range = h.session.set_range_start(date(2024, 4, 1));
    assert_eq!(range, DateRange::new(date(2024, 4, 1), date(2024, 5, 31)));
    assert_eq!(h.presenter.last().filtered_count, 1);

    let range = h.session.set_range_end(date(2024, 3, 15));
    assert_eq!(range, DateRange::day(date(2024, 3, 15)));

    let range = h.session.set_range_start(date(2024, 4, 10));
    assert_eq!(range, DateRange::day(date(2024, 4, 10)));

    assert_eq!(h.session.reset_range(), may_2024());
    h.session.set_range(DateRange::new(date(2024, 4, 28), date(2024, 4, 28)));
    assert_eq!(h.presenter.last().spent_in_range, 25.0);
}

#[test]
fn listing_filters_and_adds_fixed_expenses() {
    let h = harness();
    h.session.login(UserId::new("alice")).unwrap();
    h.session
        .update_configuration(&ConfigurationPatch::single(
            ConfigField::FixedExpenses,
            100.0,
        ))
        .unwrap();
    h.session
        .add_expense(ExpenseDraft::new(
            40.0,
            date(2024, 5, 1),
            "Pharmacy",
            ExpenseCategory::Health,
        ))
        .unwrap();
    h.session
        .add_expense(ExpenseDraft::new(
            60.0,
            date(2024, 5, 2),
            "Dinner",
            ExpenseCategory::Food,
        ))
        .unwrap();

    let all = h.session.expenses(&ExpenseQuery::all());
    assert_eq!(all.records.len(), 2);
    assert_eq!(all.records[0].description, "Dinner");
    assert_eq!(all.total, 200.0);

    let health = h
        .session
        .expenses(&ExpenseQuery::all().with_category(ExpenseCategory::Health));
    assert_eq!(health.records.len(), 1);
    assert_eq!(health.total, 140.0);
}
