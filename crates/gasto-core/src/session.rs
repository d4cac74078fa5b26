//! Session host: owns the signed-in user's records, configuration, and selected range, and
//! republishes a fresh [`DashboardSummary`] whenever any of them changes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::NaiveDate;
use gasto_domain::{
    BudgetConfiguration, ConfigField, ConfigurationPatch, DateRange, ExpenseDraft, ExpenseRecord,
    UserId,
};
use uuid::Uuid;

use crate::{
    aggregation_service::{AggregationService, DashboardSummary},
    config_store::{ConfigListener, ConfigurationStore, ListenerId},
    expense_service::{ExpenseQuery, ExpenseService},
    format::CurrencyFormatter,
    repository::{ConfigurationPersistence, ExpenseRepository, SnapshotListener, Subscription},
    time::Clock,
    CoreError,
};

/// Receives computed summaries. Called while the session state is locked, so implementations
/// must not call back into the session.
pub trait PresentationAdapter: Send + Sync {
    fn render(&self, summary: &DashboardSummary);
    /// Signed out: drop anything on screen.
    fn clear(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn(UserId),
    LoggedOut,
}

/// Result of [`DashboardSession::expenses`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseListing {
    pub records: Vec<ExpenseRecord>,
    /// Listed amounts plus fixed expenses.
    pub total: f64,
}

struct SessionState {
    user: Option<UserId>,
    records: Vec<ExpenseRecord>,
    store: ConfigurationStore,
    range: DateRange,
    subscription: Option<Subscription>,
    /// Bumped on every login and logout; snapshots from older subscriptions are ignored.
    generation: u64,
}

#[derive(Clone)]
struct Publisher {
    presenter: Arc<dyn PresentationAdapter>,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn CurrencyFormatter>,
}

impl Publisher {
    fn summarize(&self, state: &SessionState) -> DashboardSummary {
        AggregationService::summarize(
            &state.records,
            state.range,
            &state.store.get(),
            self.clock.as_ref(),
            self.formatter.as_ref(),
        )
    }

    fn publish(&self, state: &SessionState) {
        if state.user.is_none() {
            return;
        }
        let summary = self.summarize(state);
        self.presenter.render(&summary);
    }
}

pub struct DashboardSession {
    repository: Arc<dyn ExpenseRepository>,
    persistence: Arc<dyn ConfigurationPersistence>,
    publisher: Publisher,
    state: Arc<Mutex<SessionState>>,
}

impl DashboardSession {
    pub fn new(
        repository: Arc<dyn ExpenseRepository>,
        persistence: Arc<dyn ConfigurationPersistence>,
        presenter: Arc<dyn PresentationAdapter>,
        clock: Arc<dyn Clock>,
        formatter: Arc<dyn CurrencyFormatter>,
    ) -> Self {
        let range = DateRange::current_month(clock.today());
        Self {
            repository,
            persistence,
            publisher: Publisher {
                presenter,
                clock,
                formatter,
            },
            state: Arc::new(Mutex::new(SessionState {
                user: None,
                records: Vec::new(),
                store: ConfigurationStore::default(),
                range,
                subscription: None,
                generation: 0,
            })),
        }
    }

    pub fn handle_auth_event(&self, event: AuthEvent) -> Result<(), CoreError> {
        match event {
            AuthEvent::LoggedIn(user) => self.login(user),
            AuthEvent::LoggedOut => {
                self.logout();
                Ok(())
            }
        }
    }

    /// Loads the user's configuration, resets the range to the current month, and starts
    /// listening for expense snapshots. Any previous subscription is cancelled first.
    pub fn login(&self, user: UserId) -> Result<(), CoreError> {
        let previous = self.lock().subscription.take();
        if let Some(subscription) = previous {
            subscription.cancel();
        }

        let configuration = match self.persistence.read(&user) {
            Ok(configuration) => configuration,
            Err(err) => {
                tracing::warn!(user = %user, error = %err, "failed to read configuration");
                BudgetConfiguration::default()
            }
        };

        let generation = {
            let mut state = self.lock();
            state.user = Some(user.clone());
            state.generation += 1;
            state.records.clear();
            state.store.replace(configuration);
            state.range = DateRange::current_month(self.publisher.clock.today());
            self.publisher.publish(&state);
            state.generation
        };
        tracing::info!(user = %user, "session started");

        let subscription = self
            .repository
            .subscribe(&user, self.snapshot_listener(generation))?;
        let mut state = self.lock();
        if state.generation == generation {
            state.subscription = Some(subscription);
        } else {
            drop(state);
            subscription.cancel();
        }
        Ok(())
    }

    /// Stops listening and forgets the user's data.
    pub fn logout(&self) {
        let subscription = {
            let mut state = self.lock();
            if let Some(user) = state.user.take() {
                tracing::info!(user = %user, "session ended");
            }
            state.generation += 1;
            state.records.clear();
            state.store.clear();
            state.range = DateRange::current_month(self.publisher.clock.today());
            self.publisher.presenter.clear();
            state.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    pub fn add_expense(&self, draft: ExpenseDraft) -> Result<Uuid, CoreError> {
        ExpenseService::validate(&draft)?;
        let user = self.require_user()?;
        let id = self.repository.create(&user, draft)?;
        tracing::debug!(user = %user, %id, "expense created");
        Ok(id)
    }

    pub fn update_expense(&self, id: Uuid, draft: ExpenseDraft) -> Result<(), CoreError> {
        ExpenseService::validate(&draft)?;
        let user = self.require_user()?;
        self.repository.update(&user, id, draft)?;
        tracing::debug!(user = %user, %id, "expense updated");
        Ok(())
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<(), CoreError> {
        let user = self.require_user()?;
        self.repository.delete(&user, id)?;
        tracing::debug!(user = %user, %id, "expense deleted");
        Ok(())
    }

    /// Persists the given fields, then applies them locally and republishes.
    pub fn update_configuration(
        &self,
        patch: &ConfigurationPatch,
    ) -> Result<BudgetConfiguration, CoreError> {
        let user = self.require_user()?;
        self.persistence.write(&user, patch)?;

        let mut state = self.lock();
        if state.user.as_ref() != Some(&user) {
            return Err(CoreError::NotAuthenticated);
        }
        let current = state.store.set(patch);
        self.publisher.publish(&state);
        Ok(current)
    }

    pub fn reset_configuration_field(
        &self,
        field: ConfigField,
    ) -> Result<BudgetConfiguration, CoreError> {
        self.update_configuration(&ConfigurationPatch::single(field, 0.0))
    }

    pub fn set_range(&self, range: DateRange) -> DateRange {
        self.modify_range(|_| range)
    }

    pub fn set_range_start(&self, from: NaiveDate) -> DateRange {
        self.modify_range(|range| range.with_from(from))
    }

    pub fn set_range_end(&self, to: NaiveDate) -> DateRange {
        self.modify_range(|range| range.with_to(to))
    }

    /// Back to the current calendar month.
    pub fn reset_range(&self) -> DateRange {
        let today = self.publisher.clock.today();
        self.modify_range(|_| DateRange::current_month(today))
    }

    pub fn expenses(&self, query: &ExpenseQuery) -> ExpenseListing {
        let state = self.lock();
        let records = ExpenseService::search(&state.records, query);
        let total = ExpenseService::listing_total(&records, state.store.get().fixed_expenses);
        ExpenseListing { records, total }
    }

    pub fn expense(&self, id: Uuid) -> Option<ExpenseRecord> {
        self.lock()
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn summary(&self) -> Result<DashboardSummary, CoreError> {
        let state = self.lock();
        if state.user.is_none() {
            return Err(CoreError::NotAuthenticated);
        }
        Ok(self.publisher.summarize(&state))
    }

    pub fn configuration(&self) -> BudgetConfiguration {
        self.lock().store.get()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.lock().user.clone()
    }

    pub fn range(&self) -> DateRange {
        self.lock().range
    }

    /// Listeners run with the session locked and must not call back into it.
    pub fn subscribe_configuration(&self, listener: ConfigListener) -> ListenerId {
        self.lock().store.subscribe(listener)
    }

    pub fn unsubscribe_configuration(&self, id: ListenerId) -> bool {
        self.lock().store.unsubscribe(id)
    }

    fn modify_range(&self, change: impl FnOnce(DateRange) -> DateRange) -> DateRange {
        let mut state = self.lock();
        state.range = change(state.range);
        tracing::debug!(range = %state.range, "range changed");
        self.publisher.publish(&state);
        state.range
    }

    fn require_user(&self) -> Result<UserId, CoreError> {
        self.lock().user.clone().ok_or(CoreError::NotAuthenticated)
    }

    fn snapshot_listener(&self, generation: u64) -> SnapshotListener {
        let state: Weak<Mutex<SessionState>> = Arc::downgrade(&self.state);
        let publisher = self.publisher.clone();
        Arc::new(move |snapshot: &[ExpenseRecord]| {
            let Some(shared) = state.upgrade() else {
                return;
            };
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation || state.user.is_none() {
                tracing::debug!(generation, "ignoring stale snapshot");
                return;
            }
            state.records = snapshot.to_vec();
            tracing::debug!(records = state.records.len(), "snapshot received");
            publisher.publish(&state);
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
