//! In-memory holder of the current user's budget configuration with change notification.

use std::fmt;

use gasto_domain::{
    parse_leading_number, sanitize_setting, BudgetConfiguration, ConfigField, ConfigurationPatch,
};

pub type ConfigListener = Box<dyn Fn(&ConfigurationChange) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Delivered once per effective update.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationChange {
    pub changed: Vec<ConfigField>,
    pub previous: BudgetConfiguration,
    pub current: BudgetConfiguration,
}

impl ConfigurationChange {
    pub fn touches(&self, field: ConfigField) -> bool {
        self.changed.contains(&field)
    }
}

#[derive(Default)]
pub struct ConfigurationStore {
    current: BudgetConfiguration,
    listeners: Vec<(ListenerId, ConfigListener)>,
    next_listener: u64,
}

impl ConfigurationStore {
    pub fn new(initial: BudgetConfiguration) -> Self {
        Self {
            current: BudgetConfiguration::new(
                initial.monthly_budget,
                initial.fixed_expenses,
                initial.spending_limit,
            ),
            ..Self::default()
        }
    }

    pub fn get(&self) -> BudgetConfiguration {
        self.current
    }

    /// Merges `patch` into the current configuration and notifies listeners once with the
    /// fields whose value changed. Unspecified fields are never cleared.
    pub fn set(&mut self, patch: &ConfigurationPatch) -> BudgetConfiguration {
        let previous = self.current;
        let next = patch.apply_to(previous);
        self.commit(previous, next);
        self.current
    }

    /// Replaces the whole configuration, e.g. after loading it for a newly signed-in user.
    pub fn replace(&mut self, configuration: BudgetConfiguration) -> BudgetConfiguration {
        self.set(&ConfigurationPatch::from(configuration))
    }

    /// Puts one field back to `0` (unset).
    pub fn reset(&mut self, field: ConfigField) -> BudgetConfiguration {
        self.set(&ConfigurationPatch::single(field, 0.0))
    }

    /// Drops all values without notifying; used when the user signs out.
    pub fn clear(&mut self) {
        self.current = BudgetConfiguration::default();
    }

    pub fn subscribe(&mut self, listener: ConfigListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, previous: BudgetConfiguration, next: BudgetConfiguration) {
        let changed: Vec<ConfigField> = ConfigField::ALL
            .into_iter()
            .filter(|field| previous.get(*field) != next.get(*field))
            .collect();
        self.current = next;
        if changed.is_empty() {
            return;
        }

        tracing::debug!(?changed, "configuration updated");
        let change = ConfigurationChange {
            changed,
            previous,
            current: next,
        };
        for (_, listener) in &self.listeners {
            listener(&change);
        }
    }
}

impl fmt::Debug for ConfigurationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationStore")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Reads a stored or typed setting: the leading number of `raw`, or `0` when absent,
/// unparsable, or negative.
pub fn parse_setting(raw: Option<&str>) -> f64 {
    raw.and_then(parse_leading_number)
        .map(sanitize_setting)
        .unwrap_or(0.0)
}
