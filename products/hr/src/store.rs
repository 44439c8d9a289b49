use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::debug;

use crate::{Employee, EmployeeId, StoreError, StoreResult, ValidationError};

/// In-memory employee directory shared by every request handler.
///
/// A single lock guards the records: reads share it, and each mutation
/// (including the duplicate scan inside [`EmployeeStore::add`]) holds it
/// exclusively from start to finish.
#[derive(Debug, Default)]
pub struct EmployeeStore {
    inner: RwLock<Directory>,
}

#[derive(Debug, Default)]
struct Directory {
    records: Vec<(EmployeeId, Employee)>,
    // every identifier ever handed out, live or removed
    issued: HashSet<EmployeeId>,
}

impl Directory {
    fn position(&self, id: EmployeeId) -> Option<usize> {
        self.records.iter().position(|(key, _)| *key == id)
    }

    fn holder_of(&self, candidate: &Employee) -> Option<EmployeeId> {
        self.records
            .iter()
            .find(|(_, record)| record.same_person(candidate))
            .map(|(id, _)| *id)
    }

    fn issue_id(&mut self) -> EmployeeId {
        loop {
            let id = EmployeeId::random();
            if self.issued.insert(id) {
                return id;
            }
        }
    }
}

impl EmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously listed entries, keeping their order.
    ///
    /// Each record is validated again and the business-key invariant is
    /// enforced, so a tampered snapshot is rejected instead of loaded.
    pub fn restore<I>(entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (EmployeeId, Employee)>,
    {
        let mut directory = Directory::default();
        for (id, record) in entries {
            record.validate()?;
            if let Some(existing) = directory.holder_of(&record) {
                return Err(StoreError::Duplicate { existing });
            }
            if !directory.issued.insert(id) {
                let err = ValidationError::new("id", format!("{id} appears more than once"));
                return Err(err.into());
            }
            directory.records.push((id, record));
        }
        debug!(count = directory.records.len(), "employee store restored");
        Ok(Self {
            inner: RwLock::new(directory),
        })
    }

    /// Every stored record with its identifier, in insertion order.
    pub fn list(&self) -> Vec<(EmployeeId, Employee)> {
        self.read().records.clone()
    }

    pub fn get(&self, id: EmployeeId) -> Option<Employee> {
        let directory = self.read();
        directory
            .position(id)
            .map(|index| directory.records[index].1.clone())
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Validate `candidate`, reject it if its business key is taken, and
    /// otherwise store it under a never-before-issued identifier.
    pub fn add(&self, candidate: Employee) -> StoreResult<EmployeeId> {
        candidate.validate()?;
        let mut directory = self.write();
        if let Some(existing) = directory.holder_of(&candidate) {
            debug!(%existing, "rejected duplicate employee");
            return Err(StoreError::Duplicate { existing });
        }
        let id = directory.issue_id();
        directory.records.push((id, candidate));
        debug!(%id, size = directory.records.len(), "employee added");
        Ok(id)
    }

    /// Remove the record stored under `id` and hand it back.
    pub fn remove(&self, id: EmployeeId) -> StoreResult<Employee> {
        let mut directory = self.write();
        let index = directory.position(id).ok_or(StoreError::NotFound(id))?;
        let (_, record) = directory.records.remove(index);
        debug!(%id, size = directory.records.len(), "employee removed");
        Ok(record)
    }

    // No operation panics while holding the guard, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
