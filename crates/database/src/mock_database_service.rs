use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use payloadscan_types::{DeliveredPayloadRecord, PayloadVerdict, SelectionPolicy, Slot};

use crate::{error::DatabaseError, DatabaseService};

/// Keeps delivered payloads and their verdicts in memory, keyed by relay and slot.
#[derive(Default, Clone)]
pub struct MockDatabaseService {
    records: Arc<Mutex<Vec<DeliveredPayloadRecord>>>,
    verdicts: Arc<Mutex<HashMap<(String, Slot), PayloadVerdict>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MockDatabaseService {
    pub fn new(records: Vec<DeliveredPayloadRecord>) -> Self {
        Self { records: Arc::new(Mutex::new(records)), ..Default::default() }
    }

    pub fn with_verdict(self, relay: &str, slot: Slot, verdict: PayloadVerdict) -> Self {
        self.verdicts.lock().insert((relay.to_string(), slot), verdict);
        self
    }

    /// Every save fails with a database error.
    pub fn with_failing_saves(self) -> Self {
        self.fail_saves.store(true, Ordering::Relaxed);
        self
    }

    pub fn verdict(&self, relay: &str, slot: Slot) -> Option<PayloadVerdict> {
        self.verdicts.lock().get(&(relay.to_string(), slot)).cloned()
    }

    pub fn num_verdicts(&self) -> usize {
        self.verdicts.lock().len()
    }
}

#[async_trait]
impl DatabaseService for MockDatabaseService {
    async fn get_unverified_payloads(
        &self,
        selection: &SelectionPolicy,
    ) -> Result<Vec<DeliveredPayloadRecord>, DatabaseError> {
        let mut records = self.records.lock().clone();
        records.sort_by(|a, b| b.slot.cmp(&a.slot));

        let verdicts = self.verdicts.lock();
        let check_ok = |record: &DeliveredPayloadRecord| {
            verdicts
                .get(&(record.relay.clone(), record.slot))
                .and_then(|verdict| verdict.value_check_ok)
        };

        let selected = match selection {
            SelectionPolicy::BySlot(slot) => {
                records.into_iter().filter(|record| record.slot == *slot).collect()
            }
            SelectionPolicy::FailedOnly => {
                records.into_iter().filter(|record| check_ok(record) == Some(false)).collect()
            }
            SelectionPolicy::RecentUnchecked(limit) => records
                .into_iter()
                .filter(|record| check_ok(record).is_none())
                .take(*limit as usize)
                .collect(),
        };

        Ok(selected)
    }

    async fn save_payload_verdict(
        &self,
        record: &DeliveredPayloadRecord,
        verdict: &PayloadVerdict,
    ) -> Result<(), DatabaseError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(DatabaseError::GeneralError)
        }

        let mut records = self.records.lock();
        let Some(stored) =
            records.iter_mut().find(|r| r.relay == record.relay && r.slot == record.slot)
        else {
            return Err(DatabaseError::PayloadNotFound {
                relay: record.relay.clone(),
                slot: record.slot,
            })
        };

        stored.block_number = verdict.block_number.or(record.block_number);
        self.verdicts.lock().insert((record.relay.clone(), record.slot), verdict.clone());
        Ok(())
    }
}
