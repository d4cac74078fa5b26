use std::{fmt, sync::Arc};

use gasto_domain::{BudgetConfiguration, ConfigurationPatch, ExpenseDraft, ExpenseRecord, UserId};
use uuid::Uuid;

use crate::CoreError;

/// Receives the complete set of a user's expenses every time it changes.
pub type SnapshotListener = Arc<dyn Fn(&[ExpenseRecord]) + Send + Sync>;

/// Handle for a live snapshot subscription. Cancelling or dropping it stops delivery.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Per-user expense collection with live snapshots.
///
/// `subscribe` must deliver an initial snapshot and then one full snapshot after every change.
/// Implementations may invoke the listener synchronously from any method.
pub trait ExpenseRepository: Send + Sync {
    fn subscribe(&self, user: &UserId, listener: SnapshotListener)
        -> Result<Subscription, CoreError>;
    fn create(&self, user: &UserId, draft: ExpenseDraft) -> Result<Uuid, CoreError>;
    /// Overwrites every editable field of an existing record.
    fn update(&self, user: &UserId, id: Uuid, draft: ExpenseDraft) -> Result<(), CoreError>;
    fn delete(&self, user: &UserId, id: Uuid) -> Result<(), CoreError>;
}

/// Per-user budget configuration document.
pub trait ConfigurationPersistence: Send + Sync {
    /// Missing documents read as the all-zero configuration.
    fn read(&self, user: &UserId) -> Result<BudgetConfiguration, CoreError>;
    /// Merges the given fields into the stored document.
    fn write(&self, user: &UserId, patch: &ConfigurationPatch) -> Result<(), CoreError>;
}
