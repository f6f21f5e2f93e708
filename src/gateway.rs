use async_trait::async_trait;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Card fields after masking and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn last_four(&self) -> &str {
        let digits = self.number.trim_end();
        &digits[digits.len().saturating_sub(4)..]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub payment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum DeclineReason {
    #[error("payment declined by issuer")]
    Declined,
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, card: &CardDetails) -> Result<Receipt, DeclineReason>;
}

/// Stand-in for a real processor: waits, then approves with a fixed
/// probability. Swap for a real gateway without touching the checkout flow.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    success_rate: f64,
}

impl SimulatedGateway {
    /// `success_rate` is clamped to `0..=1`; NaN counts as never.
    pub fn new(delay: Duration, success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { delay, success_rate }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, card: &CardDetails) -> Result<Receipt, DeclineReason> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let draw: f64 = rand::rng().random();
        debug!(card = card.last_four(), draw, "simulated charge");
        if draw < self.success_rate {
            Ok(Receipt {
                payment_id: payment_id(),
            })
        } else {
            Err(DeclineReason::Declined)
        }
    }
}

fn payment_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(|byte| char::from(byte).to_ascii_uppercase())
        .collect()
}
