use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::future::join_all;
use payloadscan_beacon::BeaconClientTrait;
use payloadscan_common::VerifierConfig;
use payloadscan_database::DatabaseService;
use payloadscan_execution::{ExecutionClientTrait, MultiExecutionClient};
use payloadscan_types::{DeliveredPayloadRecord, PayloadVerdict, Slot, VerdictOutcome};
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    balance::BalanceOracle,
    canonicality::{CanonResult, CanonicalityChecker},
    error::VerificationError,
    reconciler::{claimed_wei, ValueReconciler},
};

/// Computes the verdict of a single record: canonicality first, then the value check on
/// canonical blocks.
pub struct RecordVerifier<B: BeaconClientTrait, C: ExecutionClientTrait> {
    checker: CanonicalityChecker<B, MultiExecutionClient<C>>,
    reconciler: ValueReconciler<C>,
}

impl<B: BeaconClientTrait, C: ExecutionClientTrait> RecordVerifier<B, C> {
    pub fn new(beacon: Arc<B>, execution: Arc<MultiExecutionClient<C>>) -> Self {
        Self {
            checker: CanonicalityChecker::new(beacon, execution.clone()),
            reconciler: ValueReconciler::new(BalanceOracle::new(execution)),
        }
    }

    pub async fn verify(
        &self,
        record: &DeliveredPayloadRecord,
    ) -> Result<PayloadVerdict, VerificationError> {
        let claimed = claimed_wei(record)?;

        let (block, canonical_hash, was_uncled) = match self.checker.check(record).await? {
            CanonResult::SlotMissed => {
                return Ok(PayloadVerdict { slot_was_missed: Some(true), ..Default::default() })
            }
            CanonResult::NotFound => {
                return Ok(PayloadVerdict {
                    slot_was_missed: Some(false),
                    found_on_chain: Some(false),
                    ..Default::default()
                })
            }
            CanonResult::Reorged { block, canonical_hash, was_uncled } => {
                (block, canonical_hash, Some(was_uncled))
            }
            CanonResult::Canonical { block } => {
                let hash = block.hash;
                (block, hash, None)
            }
        };

        let coinbase_is_proposer = block.miner == record.proposer_fee_recipient;
        let mut verdict = PayloadVerdict {
            block_number: record.block_number.or(Some(block.number)),
            slot_was_missed: Some(false),
            found_on_chain: Some(true),
            block_coinbase_address: Some(block.miner),
            block_coinbase_is_proposer: Some(coinbase_is_proposer),
            block_hash_on_chain: Some(canonical_hash),
            block_hash_on_chain_diffs: Some(was_uncled.is_some()),
            was_uncled,
            ..Default::default()
        };

        if was_uncled.is_some() {
            verdict.value_check_ok = Some(false);
            return Ok(verdict)
        }

        let value = self.reconciler.reconcile(record, claimed, &block, coinbase_is_proposer).await?;
        verdict.value_check_ok = Some(value.ok);
        verdict.value_check_method = Some(value.method);
        verdict.value_delivered_wei = Some(value.delivered_wei);
        verdict.value_delivered_diff_wei = Some(value.diff_wei);
        verdict.coinbase_diff_wei = value.builder_diff_wei;

        Ok(verdict)
    }
}

/// Counts of what happened to the records of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub ok: usize,
    pub mismatch: usize,
    pub missed: usize,
    pub not_found: usize,
    pub hash_mismatch: usize,
    /// Hash mismatches whose block was found in a later block's uncles.
    pub uncled: usize,
    /// Records left unverified because of an error.
    pub failed: usize,
    pub failed_records: Vec<(String, Slot)>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: VerdictOutcome) {
        match outcome {
            VerdictOutcome::SlotMissed => self.missed += 1,
            VerdictOutcome::NotFoundOnChain => self.not_found += 1,
            VerdictOutcome::HashMismatch { was_uncled } => {
                self.hash_mismatch += 1;
                if was_uncled {
                    self.uncled += 1;
                }
            }
            VerdictOutcome::ValueOk => self.ok += 1,
            VerdictOutcome::ValueMismatch => self.mismatch += 1,
        }
    }

    pub fn record_failure(&mut self, record: &DeliveredPayloadRecord) {
        self.failed += 1;
        self.failed_records.push((record.relay.clone(), record.slot));
    }

    pub fn merge(&mut self, other: BatchSummary) {
        self.ok += other.ok;
        self.mismatch += other.mismatch;
        self.missed += other.missed;
        self.not_found += other.not_found;
        self.hash_mismatch += other.hash_mismatch;
        self.uncled += other.uncled;
        self.failed += other.failed;
        self.failed_records.extend(other.failed_records);
    }

    /// Records that reached a verdict.
    pub fn verified(&self) -> usize {
        self.ok + self.mismatch + self.missed + self.not_found + self.hash_mismatch
    }
}

/// Verifies a batch of records with a fixed pool of workers and stores each verdict.
pub struct PayloadValueChecker<D: DatabaseService, B: BeaconClientTrait, C: ExecutionClientTrait> {
    db: Arc<D>,
    verifier: Arc<RecordVerifier<B, C>>,
    config: VerifierConfig,
}

impl<D, B, C> PayloadValueChecker<D, B, C>
where
    D: DatabaseService + 'static,
    B: BeaconClientTrait + 'static,
    C: ExecutionClientTrait + 'static,
{
    pub fn new(
        db: Arc<D>,
        beacon: Arc<B>,
        execution: Arc<MultiExecutionClient<C>>,
        config: VerifierConfig,
    ) -> Self {
        Self { db, verifier: Arc::new(RecordVerifier::new(beacon, execution)), config }
    }

    /// Processes `records` and returns once every worker is done.
    ///
    /// Returns the first error that stopped the batch: a persistence failure always does, any
    /// other failure only with `fail_fast`.
    pub async fn run(
        &self,
        records: Vec<DeliveredPayloadRecord>,
    ) -> Result<BatchSummary, VerificationError> {
        let total = records.len();
        let (tx, rx) = crossbeam_channel::unbounded();
        for record in records {
            // receiver is alive until the workers exit
            if tx.send(record).is_err() {
                break
            }
        }
        drop(tx);

        let num_workers = self.config.effective_concurrency().min(total.max(1));
        info!(
            total,
            num_workers,
            fail_fast = self.config.fail_fast,
            "starting payload value checks"
        );

        let stop = Arc::new(AtomicBool::new(false));
        let handles = (0..num_workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    rx: rx.clone(),
                    db: self.db.clone(),
                    verifier: self.verifier.clone(),
                    fail_fast: self.config.fail_fast,
                    stop: stop.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect::<Vec<_>>();

        let mut summary = BatchSummary { total, ..Default::default() };
        let mut first_error = None;
        for result in join_all(handles).await {
            match result {
                Ok((worker_summary, err)) => {
                    summary.merge(worker_summary);
                    if first_error.is_none() {
                        first_error = err;
                    }
                }
                Err(join_err) => {
                    error!(?join_err, "payload worker failed");
                    stop.store(true, Ordering::Relaxed);
                    if first_error.is_none() {
                        first_error = Some(VerificationError::WorkerPanicked(join_err.to_string()));
                    }
                }
            }
        }

        info!(
            total = summary.total,
            verified = summary.verified(),
            ok = summary.ok,
            mismatch = summary.mismatch,
            missed = summary.missed,
            not_found = summary.not_found,
            hash_mismatch = summary.hash_mismatch,
            uncled = summary.uncled,
            failed = summary.failed,
            "payload value checks done"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

struct Worker<D: DatabaseService, B: BeaconClientTrait, C: ExecutionClientTrait> {
    id: usize,
    rx: crossbeam_channel::Receiver<DeliveredPayloadRecord>,
    db: Arc<D>,
    verifier: Arc<RecordVerifier<B, C>>,
    fail_fast: bool,
    stop: Arc<AtomicBool>,
}

impl<D: DatabaseService, B: BeaconClientTrait, C: ExecutionClientTrait> Worker<D, B, C> {
    /// Pulls records until the queue is drained or another worker stopped the batch.
    async fn run(self) -> (BatchSummary, Option<VerificationError>) {
        let mut summary = BatchSummary::default();

        while !self.stop.load(Ordering::Relaxed) {
            let Ok(record) = self.rx.try_recv() else {
                break;
            };

            let span = info_span!(
                "verify_payload",
                worker = self.id,
                slot = record.slot,
                relay = %record.relay,
                block_hash = %record.block_hash,
            );

            match self.process(&record).instrument(span).await {
                Ok(outcome) => summary.record(outcome),
                Err(err) if err.is_fatal() || self.fail_fast => {
                    error!(slot = record.slot, relay = %record.relay, %err, "stopping batch");
                    summary.record_failure(&record);
                    self.stop.store(true, Ordering::Relaxed);
                    return (summary, Some(err))
                }
                Err(err) => {
                    warn!(
                        slot = record.slot,
                        relay = %record.relay,
                        %err,
                        "failed to verify payload, skipping"
                    );
                    summary.record_failure(&record);
                }
            }
        }

        (summary, None)
    }

    async fn process(
        &self,
        record: &DeliveredPayloadRecord,
    ) -> Result<VerdictOutcome, VerificationError> {
        let verdict = self.verifier.verify(record).await?;
        self.db.save_payload_verdict(record, &verdict).await?;

        let outcome = verdict.outcome();
        info!(
            ?outcome,
            block_number = ?verdict.block_number,
            method = ?verdict.value_check_method,
            delivered_eth = ?verdict.value_delivered_eth(),
            diff_eth = ?verdict.value_delivered_diff_eth(),
            "payload verified"
        );
        Ok(outcome)
    }
}
