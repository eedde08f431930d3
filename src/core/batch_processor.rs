//! Operation replay with per-user partitioning
//!
//! This module provides `BatchProcessor`, which applies replayed wallet
//! operations and runs batches concurrently while keeping each user's
//! operations in file order.
//!
//! # Design
//!
//! A batch is cut into segments at every global operation (registrations,
//! price or payment method changes). Inside a segment operations are partitioned by email and
//! each partition runs as its own tokio task. A global operation runs alone,
//! after the segment before it has finished and before the next one starts.
//!
//! ```text
//! [buy a, buy b, sell a] | price | [approve a, approve b]
//!   a: buy, sell             alone     a: approve
//!   b: buy                             b: approve
//! ```
//!
//! Reviews are keyed by the transaction owner's email, so a review always
//! lands in the same partition as the request it refers to.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error};

use super::traits::LedgerStore;
use super::wallet::Wallet;
use crate::types::{
    normalize_email, LedgerError, NewTransaction, Operation, ProfileUpdate, TransactionId,
};

/// Outcome of a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: Operation,

    /// Result of applying it
    pub result: Result<(), LedgerError>,
}

/// Applies operations against a shared wallet
#[derive(Debug)]
pub struct BatchProcessor<S: LedgerStore + 'static> {
    wallet: Arc<Wallet<S>>,

    /// (owner email, label) -> transaction id
    labels: Arc<DashMap<(String, String), TransactionId>>,
}

impl<S: LedgerStore + 'static> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            wallet: Arc::clone(&self.wallet),
            labels: Arc::clone(&self.labels),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    pub fn new(wallet: Arc<Wallet<S>>) -> Self {
        Self {
            wallet,
            labels: Arc::new(DashMap::new()),
        }
    }

    /// Apply one operation
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The operation took effect
    /// * `Err(LedgerError)` - The wallet rejected it, or a label was unknown
    ///   or reused; nothing was changed
    pub fn apply(&self, operation: &Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::Register { email, name, phone } => {
                self.wallet.register(name, email, phone)?;
            }
            Operation::Profile { email, name, phone } => {
                let user = self.wallet.login(email)?;
                self.wallet.update_profile(
                    user.id,
                    ProfileUpdate {
                        name: name.clone(),
                        phone: phone.clone(),
                    },
                )?;
            }
            Operation::SetPrice { admin_email, price } => {
                let admin = self.wallet.login(admin_email)?;
                self.wallet.set_price(admin.id, *price)?;
            }
            Operation::SetMethod {
                admin_email,
                method,
                details,
            } => {
                let admin = self.wallet.login(admin_email)?;
                self.wallet.update_payment_method(admin.id, *method, details)?;
            }
            Operation::Buy {
                email,
                label,
                amount_bdt,
                method,
                proof,
            } => {
                let request = |user_id| NewTransaction::buy(user_id, *amount_bdt, *method, proof.clone());
                self.create_labelled(email, label, request)?;
            }
            Operation::Sell {
                email,
                label,
                amount_bdt,
                method,
                payout_details,
            } => {
                let request =
                    |user_id| NewTransaction::sell(user_id, *amount_bdt, *method, payout_details.as_str());
                self.create_labelled(email, label, request)?;
            }
            Operation::Review {
                owner_email,
                label,
                action,
            } => {
                let key = (normalize_email(owner_email), label.clone());
                let txn_id = self
                    .labels
                    .get(&key)
                    .map(|entry| *entry.value())
                    .ok_or_else(|| LedgerError::not_found("transaction label", label))?;

                let reviewer = self.wallet.system_admin()?;
                self.wallet.process_transaction(reviewer.id, txn_id, *action)?;
            }
        }
        Ok(())
    }

    fn create_labelled<F>(&self, email: &str, label: &str, request: F) -> Result<(), LedgerError>
    where
        F: FnOnce(u64) -> NewTransaction,
    {
        let key = (normalize_email(email), label.to_string());
        if self.labels.contains_key(&key) {
            return Err(LedgerError::conflict(
                "transaction label",
                label,
                "already used by this user",
            ));
        }

        let user = self.wallet.login(email)?;
        let txn = self.wallet.create_transaction(request(user.id))?;
        self.labels.insert(key, txn.id);
        Ok(())
    }

    /// Apply operations in order, collecting every outcome
    pub fn apply_all(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        operations
            .into_iter()
            .map(|operation| {
                let result = self.apply(&operation);
                if let Err(e) = &result {
                    debug!(op = operation.kind(), email = operation.email(), error = %e, "Operation failed");
                }
                ProcessingResult { operation, result }
            })
            .collect()
    }

    /// Partition operations by normalized email, preserving order within
    /// each partition
    pub fn partition_by_user(&self, batch: Vec<Operation>) -> HashMap<String, Vec<Operation>> {
        let mut user_batches: HashMap<String, Vec<Operation>> = HashMap::new();

        for operation in batch {
            user_batches
                .entry(normalize_email(operation.email()))
                .or_default()
                .push(operation);
        }

        user_batches
    }

    /// Apply one user's operations sequentially
    pub async fn process_user_operations(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        self.apply_all(operations)
    }

    /// Run a segment without global operations, one task per user
    async fn process_segment(&self, segment: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut tasks = Vec::new();
        for (_email, operations) in self.partition_by_user(segment) {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!("Replay task panicked: {:?}", e),
            }
        }
        results
    }

    /// Process a batch, running independent users in parallel
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut segment = Vec::new();

        for operation in batch {
            if operation.is_global() {
                results.extend(self.process_segment(std::mem::take(&mut segment)).await);
                results.extend(self.apply_all(vec![operation]));
            } else {
                segment.push(operation);
            }
        }
        results.extend(self.process_segment(segment).await);

        results
    }
}
