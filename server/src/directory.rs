use std::sync::Arc;

use anyhow::{Context, Result};
use platform_api::ApiResult;
use platform_db::JsonSnapshot;
use products_hr::{Employee, EmployeeId, EmployeeStore};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

/// Wire and snapshot form of a stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    pub id: EmployeeId,
    #[serde(flatten)]
    pub employee: Employee,
}

impl From<(EmployeeId, Employee)> for EmployeeEntry {
    fn from((id, employee): (EmployeeId, Employee)) -> Self {
        Self { id, employee }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub employees: Vec<EmployeeEntry>,
}

/// The employee store plus its optional on-disk snapshot.
///
/// Snapshots are written only after a mutation succeeded. Saves are
/// serialized and each one captures the store state at save time, so the
/// file never regresses to an older state. The save after a mutation runs on
/// its own task and completes even when the caller is dropped mid-request.
#[derive(Clone, Debug)]
pub struct Directory {
    store: Arc<EmployeeStore>,
    snapshot: Option<JsonSnapshot>,
    save_lock: Arc<Mutex<()>>,
}

impl Directory {
    pub fn new(store: Arc<EmployeeStore>, snapshot: Option<JsonSnapshot>) -> Self {
        Self {
            store,
            snapshot,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(EmployeeStore::new()), None)
    }

    /// Build the directory, restoring the snapshot when one exists.
    pub async fn open(snapshot: Option<JsonSnapshot>) -> Result<Self> {
        let Some(snapshot) = snapshot else {
            info!("no snapshot configured; employee directory is in-memory only");
            return Ok(Self::in_memory());
        };
        let loaded: Option<DirectorySnapshot> = snapshot
            .load()
            .await
            .with_context(|| format!("failed to read {}", snapshot.path().display()))?;
        let store = match loaded {
            Some(doc) => {
                let entries = doc.employees.into_iter().map(|e| (e.id, e.employee));
                EmployeeStore::restore(entries).with_context(|| {
                    format!("snapshot {} is inconsistent", snapshot.path().display())
                })?
            }
            None => EmployeeStore::new(),
        };
        info!(
            path = %snapshot.path().display(),
            employees = store.len(),
            "employee directory restored"
        );
        Ok(Self::new(Arc::new(store), Some(snapshot)))
    }

    pub fn store(&self) -> &EmployeeStore {
        &self.store
    }

    pub fn persistence(&self) -> &'static str {
        if self.snapshot.is_some() { "json" } else { "memory" }
    }

    pub fn list(&self) -> Vec<EmployeeEntry> {
        self.store.list().into_iter().map(EmployeeEntry::from).collect()
    }

    pub async fn add(&self, candidate: Employee) -> ApiResult<EmployeeId> {
        let id = self.store.add(candidate)?;
        self.persist_detached().await;
        Ok(id)
    }

    pub async fn remove(&self, id: EmployeeId) -> ApiResult<Employee> {
        let removed = self.store.remove(id)?;
        self.persist_detached().await;
        Ok(removed)
    }

    /// Write the current state to disk. Failures are logged; the in-memory
    /// mutation stands either way.
    pub async fn persist(&self) {
        if let Err(err) = self.try_persist().await {
            error!(error = %err, "failed to persist employee snapshot");
        }
    }

    async fn persist_detached(&self) {
        if self.snapshot.is_none() {
            return;
        }
        let directory = self.clone();
        if let Err(err) = tokio::spawn(async move { directory.persist().await }).await {
            error!(error = %err, "snapshot task aborted");
        }
    }

    pub async fn try_persist(&self) -> Result<()> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;
        let doc = DirectorySnapshot {
            employees: self.list(),
        };
        snapshot
            .save(&doc)
            .await
            .with_context(|| format!("failed to write {}", snapshot.path().display()))
    }
}
