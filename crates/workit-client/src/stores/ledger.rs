//! Payment methods and purchase history.
//!
//! Method bookkeeping is synchronous. Payments go through the injected
//! [`PaymentGateway`] and are serialized on a fair async mutex, so two
//! checkouts started back to back are charged and recorded in call order.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info, warn};
use workit_shared::constants::{KEY_PAYMENT_METHODS, KEY_TRANSACTIONS};
use workit_shared::types::{generate_order_id, PaymentMethodId, TransactionId, UserId};
use workit_shared::validation::{require_field, validate_amount, validate_expiry, validate_last4};
use workit_store::{PaymentKind, PaymentMethod, Transaction, TransactionStatus};

use crate::error::{ClientError, Result};
use crate::gateway::{Charge, PaymentGateway};
use crate::persist::{self, SharedDatabase};
use crate::seed;
use crate::stores::session::SessionAccessor;

/// A payment method as entered by the user, before it gets an id.
#[derive(Debug, Clone)]
pub struct PaymentMethodDraft {
    pub kind: PaymentKind,
    pub last4: Option<String>,
    pub expiry_date: Option<String>,
    pub name: Option<String>,
    pub is_default: bool,
}

impl PaymentMethodDraft {
    /// Card fields are checked for credit cards and dropped for other kinds.
    fn into_method(self, id: PaymentMethodId) -> Result<PaymentMethod> {
        let (last4, expiry_date) = match self.kind {
            PaymentKind::CreditCard => (
                self.last4.as_deref().map(validate_last4).transpose()?,
                self.expiry_date.as_deref().map(validate_expiry).transpose()?,
            ),
            PaymentKind::Paypal | PaymentKind::BankTransfer => (None, None),
        };

        let name = match self.name.as_deref() {
            Some(name) => require_field("name", Some(name))?,
            None => default_label(self.kind).to_string(),
        };

        Ok(PaymentMethod {
            id,
            kind: self.kind,
            last4,
            expiry_date,
            name,
            is_default: self.is_default,
        })
    }
}

fn default_label(kind: PaymentKind) -> &'static str {
    match kind {
        PaymentKind::CreditCard => "Carte bancaire",
        PaymentKind::Paypal => "PayPal",
        PaymentKind::BankTransfer => "Virement bancaire",
    }
}

#[derive(Default)]
struct LedgerState {
    methods: Vec<PaymentMethod>,
    transactions: Vec<Transaction>,
}

impl LedgerState {
    fn method(&self, id: &PaymentMethodId) -> Option<&PaymentMethod> {
        self.methods.iter().find(|m| &m.id == id)
    }

    fn make_default(&mut self, id: &PaymentMethodId) {
        for method in &mut self.methods {
            method.is_default = &method.id == id;
        }
    }
}

pub struct LedgerStore {
    db: SharedDatabase,
    session: Arc<dyn SessionAccessor>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
    state: Mutex<LedgerState>,
    payments: tokio::sync::Mutex<()>,
}

impl LedgerStore {
    /// Hydrate methods and transactions from local storage.
    pub fn open(
        db: SharedDatabase,
        session: Arc<dyn SessionAccessor>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        let methods: Vec<PaymentMethod> =
            persist::load_json(&db, KEY_PAYMENT_METHODS).unwrap_or_default();
        let transactions: Vec<Transaction> =
            persist::load_json(&db, KEY_TRANSACTIONS).unwrap_or_default();

        debug!(
            methods = methods.len(),
            transactions = transactions.len(),
            "hydrated ledger store"
        );

        let mut state = LedgerState {
            methods,
            transactions,
        };

        // Repair a stored collection with no default or several.
        let defaults = state.methods.iter().filter(|m| m.is_default).count();
        if defaults != 1 {
            if let Some(first) = state.methods.first().map(|m| m.id.clone()) {
                warn!(defaults, "stored payment methods had no single default, repairing");
                state.make_default(&first);
                persist::save_json(&db, KEY_PAYMENT_METHODS, &state.methods);
            }
        }

        Self {
            db,
            session,
            gateway,
            currency,
            state: Mutex::new(state),
            payments: tokio::sync::Mutex::new(()),
        }
    }

    pub fn payment_methods(&self) -> Vec<PaymentMethod> {
        self.lock().methods.clone()
    }

    pub fn default_method(&self) -> Option<PaymentMethod> {
        self.lock().methods.iter().find(|m| m.is_default).cloned()
    }

    /// Every recorded transaction, oldest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    pub fn transactions_for_user(&self, user_id: &UserId) -> Vec<Transaction> {
        self.lock()
            .transactions
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn get_transaction(&self, id: &TransactionId) -> Option<Transaction> {
        self.lock().transactions.iter().find(|t| &t.id == id).cloned()
    }

    /// Store a new method. The first method, or one drafted as default,
    /// becomes the only default.
    pub fn add_payment_method(&self, draft: PaymentMethodDraft) -> Result<PaymentMethod> {
        let mut method = draft.into_method(PaymentMethodId::generate())?;

        let mut state = self.lock();
        let becomes_default = state.methods.is_empty() || method.is_default;
        method.is_default = becomes_default;
        state.methods.push(method.clone());
        if becomes_default {
            state.make_default(&method.id);
        }

        persist::save_json(&self.db, KEY_PAYMENT_METHODS, &state.methods);
        info!(
            method_id = %method.id,
            kind = ?method.kind,
            is_default = method.is_default,
            "payment method added"
        );
        Ok(method)
    }

    /// Remove a method. Removing the default promotes the first remaining
    /// one; the last method can never be removed.
    pub fn remove_payment_method(&self, id: &PaymentMethodId) -> Result<()> {
        let mut state = self.lock();
        let index = state
            .methods
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| ClientError::not_found("payment method", id))?;
        if state.methods.len() == 1 {
            return Err(ClientError::LastMethod);
        }

        let removed = state.methods.remove(index);
        if removed.is_default {
            let successor = state.methods[0].id.clone();
            state.make_default(&successor);
            debug!(method_id = %successor, "default payment method promoted");
        }

        persist::save_json(&self.db, KEY_PAYMENT_METHODS, &state.methods);
        info!(method_id = %id, "payment method removed");
        Ok(())
    }

    pub fn set_default_payment_method(&self, id: &PaymentMethodId) -> Result<()> {
        let mut state = self.lock();
        if state.method(id).is_none() {
            return Err(ClientError::not_found("payment method", id));
        }

        state.make_default(id);
        persist::save_json(&self.db, KEY_PAYMENT_METHODS, &state.methods);
        info!(method_id = %id, "default payment method changed");
        Ok(())
    }

    /// Charge the current user for a service and record the outcome.
    ///
    /// Uses `method` when given, the default method otherwise. A declined
    /// charge is still recorded, as a `failed` transaction, and reported as
    /// [`ClientError::PaymentDeclined`]. If the method is removed while the
    /// gateway is answering, nothing is recorded and `NotFound` is returned.
    pub async fn process_payment(
        &self,
        service_id: &str,
        service_name: &str,
        amount: f64,
        method: Option<&PaymentMethodId>,
    ) -> Result<Transaction> {
        let user_id = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;
        let amount = validate_amount(amount)?;

        let _turn = self.payments.lock().await;

        let payment_method_id = {
            let state = self.lock();
            match method {
                Some(id) => state
                    .method(id)
                    .map(|m| m.id.clone())
                    .ok_or_else(|| ClientError::not_found("payment method", id))?,
                None => state
                    .methods
                    .iter()
                    .find(|m| m.is_default)
                    .map(|m| m.id.clone())
                    .ok_or(ClientError::NoDefaultMethod)?,
            }
        };

        let charge = Charge {
            user_id,
            payment_method_id,
            amount,
            currency: self.currency.clone(),
        };

        tokio::time::sleep(self.gateway.latency()).await;
        let outcome = self.gateway.authorize(&charge);

        let transaction = Transaction {
            id: TransactionId::generate(),
            user_id: charge.user_id,
            service_id: service_id.to_string(),
            service_name: service_name.to_string(),
            amount,
            currency: charge.currency,
            status: if outcome.is_ok() {
                TransactionStatus::Completed
            } else {
                TransactionStatus::Failed
            },
            payment_method_id: charge.payment_method_id,
            timestamp: Utc::now(),
            order_id: generate_order_id(),
        };

        {
            let mut state = self.lock();
            if state.method(&transaction.payment_method_id).is_none() {
                warn!(
                    method_id = %transaction.payment_method_id,
                    "payment method removed during checkout, discarding charge"
                );
                return Err(ClientError::not_found(
                    "payment method",
                    &transaction.payment_method_id,
                ));
            }
            state.transactions.push(transaction.clone());
            persist::save_json(&self.db, KEY_TRANSACTIONS, &state.transactions);
        }

        match outcome {
            Ok(()) => {
                info!(
                    transaction_id = %transaction.id,
                    order_id = %transaction.order_id,
                    amount,
                    "payment completed"
                );
                Ok(transaction)
            }
            Err(reason) => {
                warn!(transaction_id = %transaction.id, %reason, "payment declined");
                Err(ClientError::PaymentDeclined {
                    transaction_id: transaction.id,
                    reason,
                })
            }
        }
    }

    /// Load the demo methods and purchases. Does nothing if any ledger data
    /// exists in memory or in storage. Returns whether data was seeded.
    pub fn seed_demo_data(&self) -> Result<bool> {
        let me = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;

        let mut state = self.lock();
        if !state.methods.is_empty()
            || !state.transactions.is_empty()
            || persist::has_key(&self.db, KEY_PAYMENT_METHODS)
            || persist::has_key(&self.db, KEY_TRANSACTIONS)
        {
            debug!("ledger data present, skipping demo seed");
            return Ok(false);
        }

        let (methods, transactions) = seed::ledger(&me);
        state.methods = methods;
        state.transactions = transactions;
        persist::save_json(&self.db, KEY_PAYMENT_METHODS, &state.methods);
        persist::save_json(&self.db, KEY_TRANSACTIONS, &state.transactions);

        info!(
            methods = state.methods.len(),
            transactions = state.transactions.len(),
            "seeded demo ledger"
        );
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
