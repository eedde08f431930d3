//! Wallet facade
//!
//! `Wallet` wires the services together over one shared store and is the
//! only entry point presentation code (the CLI, the replay strategies) needs.
//!
//! ```text
//! Wallet
//!     ├── AccountManager   (register, login, profile)
//!     ├── SessionManager   (token -> user id)
//!     ├── PricingService   (current price, history)
//!     ├── SettlementEngine (create/settle transactions)
//!     └── AdminReview      (role-checked admin actions)
//! ```

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use super::account_manager::AccountManager;
use super::admin::AdminReview;
use super::engine::{SettlementEngine, SettlementPolicy};
use super::ledger_store::{InMemoryLedgerStore, LedgerSnapshot};
use super::pricing::PricingService;
use super::session::{SessionManager, SessionToken};
use super::traits::LedgerStore;
use crate::config::SeedConfig;
use crate::types::{
    GoldPrice, LedgerError, NewTransaction, PaymentMethod, PaymentMethodInfo,
    ProfileUpdate, ReviewAction, Transaction, TransactionId, TransactionScope, User, UserId,
    UserRole,
};

/// Gold wallet backend
#[derive(Debug)]
pub struct Wallet<S: LedgerStore = InMemoryLedgerStore> {
    store: Arc<S>,
    accounts: AccountManager<S>,
    sessions: SessionManager<S>,
    pricing: PricingService<S>,
    engine: SettlementEngine<S>,
    admin: AdminReview<S>,
    system_admin_email: Option<String>,
}

impl<S: LedgerStore> Wallet<S> {
    /// Build a wallet over an existing store without seeding anything
    pub fn new(store: Arc<S>, policy: SettlementPolicy) -> Self {
        let pricing = PricingService::new(Arc::clone(&store));
        let engine = SettlementEngine::new(Arc::clone(&store), pricing.clone(), policy);
        let admin = AdminReview::new(Arc::clone(&store), engine.clone(), pricing.clone());

        Self {
            accounts: AccountManager::new(Arc::clone(&store)),
            sessions: SessionManager::new(Arc::clone(&store)),
            pricing,
            engine,
            admin,
            store,
            system_admin_email: None,
        }
    }

    /// Build a wallet and make sure the seed records exist
    ///
    /// Seeding is idempotent: records that are already present (for example
    /// after loading a snapshot) are left untouched.
    pub fn bootstrap(
        store: Arc<S>,
        policy: SettlementPolicy,
        seed: &SeedConfig,
    ) -> Result<Self, LedgerError> {
        let mut wallet = Self::new(store, policy);
        wallet.seed(seed)?;
        Ok(wallet)
    }

    fn seed(&mut self, seed: &SeedConfig) -> Result<(), LedgerError> {
        let admin = match self.store.find_user_by_email(&seed.admin_email) {
            Some(existing) => {
                if !existing.is_admin() {
                    warn!(user = existing.id, email = %existing.email, "Seed admin email belongs to a non-admin user");
                }
                existing
            }
            None => self.accounts.create_user(
                &seed.admin_name,
                &seed.admin_email,
                &seed.admin_phone,
                UserRole::Admin,
            )?,
        };
        self.system_admin_email = Some(admin.email.clone());

        if self.store.latest_price().is_none() {
            self.pricing.set_price(seed.initial_price, admin.id)?;
        }

        for info in &seed.payment_methods {
            if self.store.get_payment_method(info.method).is_none() {
                self.store.upsert_payment_method(info.clone());
            }
        }

        info!(admin = admin.id, "Wallet bootstrapped");
        Ok(())
    }

    /// The admin account created (or found) at bootstrap
    pub fn system_admin(&self) -> Result<User, LedgerError> {
        self.system_admin_email
            .as_deref()
            .and_then(|email| self.store.find_user_by_email(email))
            .ok_or_else(|| LedgerError::not_configured("system admin"))
    }

    /// Settlement policy in effect
    pub fn policy(&self) -> SettlementPolicy {
        self.engine.policy()
    }

    // Identity

    /// Register a new user with role USER and a zero balance
    pub fn register(&self, name: &str, email: &str, phone: &str) -> Result<User, LedgerError> {
        self.accounts.register(name, email, phone)
    }

    /// Identify a user by email (case-insensitive)
    pub fn login(&self, email: &str) -> Result<User, LedgerError> {
        self.accounts.login(email)
    }

    /// Start a session for `user`
    pub fn open_session(&self, user: &User) -> SessionToken {
        self.sessions.create_session(user)
    }

    /// Fresh copy of the session's user, `None` if the session is unknown
    pub fn current_user(&self, token: &SessionToken) -> Option<User> {
        self.sessions.resolve_current_user(token)
    }

    /// End a session; `false` if it was not open
    pub fn logout(&self, token: &SessionToken) -> bool {
        self.sessions.end_session(token)
    }

    /// Change a user's name and/or phone
    pub fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User, LedgerError> {
        self.accounts.update_profile(user_id, update)
    }

    /// Get a user by id
    pub fn get_user(&self, user_id: UserId) -> Result<User, LedgerError> {
        self.accounts.get_user(user_id)
    }

    /// All users, ordered by id
    pub fn list_users(&self) -> Vec<User> {
        self.accounts.list_users()
    }

    // Pricing

    /// Most recently set gold price
    pub fn current_price(&self) -> Result<GoldPrice, LedgerError> {
        self.pricing.current_price()
    }

    /// Set today's price; `admin_id` must belong to an admin
    pub fn set_price(&self, admin_id: UserId, price_per_gram: Decimal) -> Result<GoldPrice, LedgerError> {
        self.admin.set_price(admin_id, price_per_gram)
    }

    /// Every price ever set, newest first
    pub fn price_history(&self) -> Vec<GoldPrice> {
        self.pricing.price_history()
    }

    // Payment methods

    /// Payment instructions in display order
    pub fn list_payment_methods(&self) -> Vec<PaymentMethodInfo> {
        self.store.list_payment_methods()
    }

    pub fn update_payment_method(
        &self,
        admin_id: UserId,
        method: PaymentMethod,
        details: &str,
    ) -> Result<PaymentMethodInfo, LedgerError> {
        self.admin.update_payment_method(admin_id, method, details)
    }

    // Transactions

    /// Submit a PENDING BUY or SELL request
    pub fn create_transaction(&self, request: NewTransaction) -> Result<Transaction, LedgerError> {
        self.engine.create_transaction(request)
    }

    /// Approve or reject a pending transaction on behalf of an admin
    pub fn process_transaction(
        &self,
        admin_id: UserId,
        txn_id: TransactionId,
        action: ReviewAction,
    ) -> Result<Transaction, LedgerError> {
        self.admin.review(admin_id, txn_id, action)
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, txn_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.engine.get_transaction(txn_id)
    }

    /// Transactions in scope, most recent first
    pub fn list_transactions(&self, scope: TransactionScope) -> Vec<Transaction> {
        self.engine.list_transactions(scope)
    }

    /// Transactions awaiting review, most recent first
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.admin.pending_transactions()
    }

    /// Look a user up by email without treating absence as an error
    pub fn find_user(&self, email: &str) -> Option<User> {
        self.store.find_user_by_email(email)
    }

    // Portfolio

    /// BDT value of a user's gold at the current price, rounded to poisha
    pub fn portfolio_value(&self, user_id: UserId) -> Result<Decimal, LedgerError> {
        let user = self.accounts.get_user(user_id)?;
        let price = self.pricing.current_price()?;

        user.gold_balance
            .checked_mul(price.price_per_gram)
            .map(|value| value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
            .ok_or_else(|| LedgerError::arithmetic_overflow("portfolio value", user_id))
    }

    /// Largest whole BDT amount a SELL request can currently ask for
    pub fn max_sellable_bdt(&self, user_id: UserId) -> Result<Decimal, LedgerError> {
        let user = self.accounts.get_user(user_id)?;
        let price = self.pricing.current_price()?;

        user.gold_balance
            .checked_mul(price.price_per_gram)
            .map(|value| value.floor())
            .ok_or_else(|| LedgerError::arithmetic_overflow("max sellable amount", user_id))
    }
}

impl Wallet<InMemoryLedgerStore> {
    /// Fresh in-memory wallet with seed records
    pub fn in_memory(policy: SettlementPolicy, seed: &SeedConfig) -> Result<Self, LedgerError> {
        Self::bootstrap(Arc::new(InMemoryLedgerStore::new()), policy, seed)
    }

    /// Restore an in-memory wallet from a snapshot, then seed what is missing
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        policy: SettlementPolicy,
        seed: &SeedConfig,
    ) -> Result<Self, LedgerError> {
        let store = InMemoryLedgerStore::from_snapshot(snapshot)?;
        Self::bootstrap(Arc::new(store), policy, seed)
    }

    /// Copy of every collection, for persistence
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.store.snapshot()
    }
}
