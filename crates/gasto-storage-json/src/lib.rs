//! gasto-storage-json
//!
//! Filesystem JSON store for per-user expenses and budget configuration, with live
//! snapshot delivery to subscribers.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

use chrono::Utc;
use gasto_config::write_atomic;
use gasto_core::{
    ConfigurationPersistence, CoreError, ExpenseRepository, ExpenseService, SnapshotListener,
    Subscription,
};
use gasto_domain::{BudgetConfiguration, ConfigurationPatch, ExpenseDraft, ExpenseRecord, UserId};
use serde_json::Value;
use uuid::Uuid;

const USERS_DIR: &str = "users";
const EXPENSES_FILE: &str = "expenses.json";
const CONFIGURATION_FILE: &str = "configuration.json";

struct Subscriber {
    id: u64,
    user: UserId,
    listener: SnapshotListener,
}

struct StoreInner {
    root: PathBuf,
    /// Serializes read-modify-write cycles on the JSON files.
    io: Mutex<()>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscriber: AtomicU64,
}

/// Keeps each user's data under `<root>/users/<user>/`.
#[derive(Clone)]
pub struct JsonExpenseStore {
    inner: Arc<StoreInner>,
}

impl JsonExpenseStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(root.join(USERS_DIR))?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                root,
                io: Mutex::new(()),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn user_dir(&self, user: &UserId) -> PathBuf {
        self.inner.user_dir(user)
    }

    pub fn expenses_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(EXPENSES_FILE)
    }

    pub fn configuration_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(CONFIGURATION_FILE)
    }

    /// Current records for `user`, newest first.
    pub fn load_expenses(&self, user: &UserId) -> Result<Vec<ExpenseRecord>, CoreError> {
        let _io = self.inner.io_guard();
        self.inner.read_expenses(user)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    /// Read-modify-write over the stored entries as raw JSON. Entries that `change` does not
    /// touch are written back untouched, including ones that fail to decode.
    fn modify_expenses(
        &self,
        user: &UserId,
        change: impl FnOnce(&mut Vec<Value>) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        {
            let _io = self.inner.io_guard();
            let mut entries = self.inner.read_entries(user)?;
            change(&mut entries)?;
            let json = serde_json::to_string_pretty(&entries).map_err(serde_error)?;
            write_atomic(&self.expenses_path(user), &json)?;
        }
        self.inner.notify(user);
        Ok(())
    }
}

impl StoreInner {
    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join(USERS_DIR).join(directory_name(user.as_str()))
    }

    fn io_guard(&self) -> MutexGuard<'_, ()> {
        lock(&self.io)
    }

    fn read_entries(&self, user: &UserId) -> Result<Vec<Value>, CoreError> {
        let path = self.user_dir(user).join(EXPENSES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(serde_error)
    }

    /// Decodes every entry it can; entries without a usable identifier are skipped.
    fn read_expenses(&self, user: &UserId) -> Result<Vec<ExpenseRecord>, CoreError> {
        let mut records: Vec<ExpenseRecord> = self
            .read_entries(user)?
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(user = %user, error = %err, "skipping malformed expense");
                    None
                }
            })
            .collect();
        ExpenseService::sort_newest_first(&mut records);
        Ok(records)
    }

    /// Delivers the latest snapshot to every subscriber of `user`, outside all locks.
    fn notify(&self, user: &UserId) {
        let snapshot = {
            let _io = self.io_guard();
            match self.read_expenses(user) {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!(user = %user, error = %err, "failed to load snapshot");
                    return;
                }
            }
        };
        let listeners: Vec<SnapshotListener> = lock(&self.subscribers)
            .iter()
            .filter(|subscriber| &subscriber.user == user)
            .map(|subscriber| Arc::clone(&subscriber.listener))
            .collect();
        tracing::debug!(
            user = %user,
            listeners = listeners.len(),
            records = snapshot.len(),
            "snapshot published"
        );
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn unsubscribe(&self, id: u64) {
        lock(&self.subscribers).retain(|subscriber| subscriber.id != id);
    }
}

impl ExpenseRepository for JsonExpenseStore {
    fn subscribe(
        &self,
        user: &UserId,
        listener: SnapshotListener,
    ) -> Result<Subscription, CoreError> {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let initial = {
            let _io = self.inner.io_guard();
            let initial = self.inner.read_expenses(user)?;
            lock(&self.inner.subscribers).push(Subscriber {
                id,
                user: user.clone(),
                listener: Arc::clone(&listener),
            });
            initial
        };
        tracing::debug!(user = %user, subscriber = id, "subscribed to expenses");
        listener(&initial);

        let inner: Weak<StoreInner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.unsubscribe(id);
            }
        }))
    }

    fn create(&self, user: &UserId, draft: ExpenseDraft) -> Result<Uuid, CoreError> {
        let id = Uuid::new_v4();
        let record = ExpenseRecord::from_draft(id, draft, Utc::now());
        let entry = serde_json::to_value(&record).map_err(serde_error)?;
        self.modify_expenses(user, |entries| {
            entries.push(entry);
            Ok(())
        })?;
        tracing::info!(user = %user, %id, "expense stored");
        Ok(id)
    }

    fn update(&self, user: &UserId, id: Uuid, draft: ExpenseDraft) -> Result<(), CoreError> {
        let fields = serde_json::to_value(&draft).map_err(serde_error)?;
        self.modify_expenses(user, |entries| {
            let entry = entries
                .iter_mut()
                .find(|entry| entry_id(entry) == Some(id))
                .and_then(Value::as_object_mut)
                .ok_or(CoreError::ExpenseNotFound(id))?;
            if let Value::Object(fields) = fields {
                entry.extend(fields);
            }
            Ok(())
        })?;
        tracing::info!(user = %user, %id, "expense overwritten");
        Ok(())
    }

    fn delete(&self, user: &UserId, id: Uuid) -> Result<(), CoreError> {
        self.modify_expenses(user, |entries| {
            let before = entries.len();
            entries.retain(|entry| entry_id(entry) != Some(id));
            if entries.len() == before {
                return Err(CoreError::ExpenseNotFound(id));
            }
            Ok(())
        })?;
        tracing::info!(user = %user, %id, "expense removed");
        Ok(())
    }
}

impl ConfigurationPersistence for JsonExpenseStore {
    fn read(&self, user: &UserId) -> Result<BudgetConfiguration, CoreError> {
        let _io = self.inner.io_guard();
        read_configuration(&self.configuration_path(user))
    }

    fn write(&self, user: &UserId, patch: &ConfigurationPatch) -> Result<(), CoreError> {
        let _io = self.inner.io_guard();
        let path = self.configuration_path(user);
        let merged = patch.apply_to(read_configuration(&path)?);
        let json = serde_json::to_string_pretty(&merged).map_err(serde_error)?;
        write_atomic(&path, &json)?;
        tracing::info!(user = %user, "configuration saved");
        Ok(())
    }
}

fn read_configuration(path: &Path) -> Result<BudgetConfiguration, CoreError> {
    if !path.exists() {
        return Ok(BudgetConfiguration::default());
    }
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(serde_error)
}

fn entry_id(entry: &Value) -> Option<Uuid> {
    entry
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn serde_error(err: serde_json::Error) -> CoreError {
    CoreError::Serde(err.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Maps a user id to a directory name, one-to-one. `[a-z0-9-]` is kept as is and every
/// other byte becomes `_xx`, so ids differing only in case or punctuation never share a
/// directory.
fn directory_name(user: &str) -> String {
    if user.is_empty() {
        return "_".into();
    }
    let mut name = String::with_capacity(user.len());
    for byte in user.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => name.push(char::from(byte)),
            _ => {
                let _ = write!(name, "_{byte:02x}");
            }
        }
    }
    name
}
