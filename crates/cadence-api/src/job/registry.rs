//! In-memory registry of live jobs.
//!
//! Sole owner of job state. Reads hand out snapshot copies; writes go
//! through a single lock so an id check and the insert it guards happen
//! atomically.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::definition::{JobListing, JobRecord};

struct Slot {
    seq: u64,
    record: JobRecord,
}

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<String, Slot>,
    next_seq: u64,
}

impl RegistryInner {
    fn insert(&mut self, job_id: String, mut record: JobRecord) {
        record.job_id = job_id.clone();
        match self.jobs.get_mut(&job_id) {
            Some(slot) => slot.record = record,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.jobs.insert(job_id, Slot { seq, record });
            }
        }
    }

    fn unique_id(&self, base: &str) -> String {
        if !self.jobs.contains_key(base) {
            return base.to_string();
        }

        let stamped = format!("{}_{}", base, Utc::now().timestamp_millis());
        if !self.jobs.contains_key(&stamped) {
            return stamped;
        }

        let mut n = 2u64;
        loop {
            let candidate = format!("{}_{}", stamped, n);
            if !self.jobs.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Registry of jobs that are active or inside their observation window.
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<RegistryInner>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `job_id`. A replaced entry keeps its
    /// listing position.
    pub fn put(&self, job_id: impl Into<String>, record: JobRecord) {
        self.inner.write().insert(job_id.into(), record);
    }

    /// Insert a new record under its resolved id, suffixing the id with the
    /// current timestamp when a live job already holds it.
    ///
    /// Returns the id the record was stored under.
    pub fn insert_unique(&self, record: JobRecord) -> String {
        let mut inner = self.inner.write();
        let job_id = inner.unique_id(&record.resolved_id);
        inner.insert(job_id.clone(), record);
        job_id
    }

    /// Snapshot of a single entry.
    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.inner.read().jobs.get(job_id).map(|s| s.record.clone())
    }

    /// Remove an entry. Absent keys are ignored.
    pub fn delete(&self, job_id: &str) {
        self.inner.write().jobs.remove(job_id);
    }

    /// Remove the entry only if it still belongs to `instance_id`.
    pub fn remove_instance(&self, job_id: &str, instance_id: Uuid) -> bool {
        let mut inner = self.inner.write();
        let owned = inner
            .jobs
            .get(job_id)
            .is_some_and(|s| s.record.instance_id == instance_id);
        if owned {
            inner.jobs.remove(job_id);
        }
        owned
    }

    /// Mutate an entry in place if it exists and belongs to `instance_id`.
    ///
    /// Never recreates a deleted entry. Returns the updated snapshot.
    pub fn update<F>(&self, job_id: &str, instance_id: Uuid, f: F) -> Option<JobRecord>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut inner = self.inner.write();
        let slot = inner.jobs.get_mut(job_id)?;
        if slot.record.instance_id != instance_id {
            return None;
        }
        f(&mut slot.record);
        Some(slot.record.clone())
    }

    /// All entries in insertion order.
    pub fn list_all(&self) -> Vec<JobRecord> {
        let inner = self.inner.read();
        let mut slots: Vec<&Slot> = inner.jobs.values().collect();
        slots.sort_by_key(|s| s.seq);
        slots.into_iter().map(|s| s.record.clone()).collect()
    }

    /// Public listing rows, numbered from 1.
    pub fn listing(&self) -> Vec<JobListing> {
        self.list_all()
            .iter()
            .enumerate()
            .map(|(i, record)| JobListing::from_record(i + 1, record))
            .collect()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.inner.read().jobs.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().jobs.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
