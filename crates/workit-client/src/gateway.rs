//! Payment gateway seam.
//!
//! The ledger never talks to a processor directly: it hands a [`Charge`] to
//! a [`PaymentGateway`] and records the outcome.

use std::time::Duration;

use workit_shared::types::{PaymentMethodId, UserId};

/// What is being charged, as seen by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub user_id: UserId,
    pub payment_method_id: PaymentMethodId,
    pub amount: f64,
    pub currency: String,
}

pub trait PaymentGateway: Send + Sync {
    /// Time the processor takes to answer.
    fn latency(&self) -> Duration;

    /// Approve the charge, or return the decline reason.
    fn authorize(&self, charge: &Charge) -> Result<(), String>;
}

/// Stand-in processor that approves every charge after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            workit_shared::constants::DEFAULT_PAYMENT_DELAY_MS,
        ))
    }
}

impl PaymentGateway for SimulatedGateway {
    fn latency(&self) -> Duration {
        self.delay
    }

    fn authorize(&self, charge: &Charge) -> Result<(), String> {
        tracing::debug!(
            user_id = %charge.user_id,
            method = %charge.payment_method_id,
            amount = charge.amount,
            "simulated gateway approved charge"
        );
        Ok(())
    }
}
