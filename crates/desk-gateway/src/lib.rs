//! Payment gateway collaborator.
//!
//! The engine asks the gateway for an order id when a gateway payment is
//! tendered, and later asks it whether the signature the client came back
//! with is authentic. Nothing here talks to the network; the processor's
//! wire protocol is somebody else's problem.

use anyhow::{bail, Result};
use desk_schemas::Money;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// `false` for a gateway that refuses every order.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Registers an order for `amount` and returns the gateway order id.
    async fn create_order(&self, booking_id: i64, amount: Money, currency: &str)
        -> Result<String>;

    /// `true` when `signature` authenticates `(order_id, payment_id)`.
    fn verify_signature(&self, payment_id: &str, order_id: &str, signature: &str) -> bool;
}

/// HMAC-SHA256 signatures over `"{order_id}|{payment_id}"`, hex encoded.
///
/// This is the scheme hosted-checkout processors use for their client-side
/// callback; the key secret never leaves the server.
#[derive(Clone)]
pub struct HmacGateway {
    key_id: String,
    key_secret: Vec<u8>,
}

impl std::fmt::Debug for HmacGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacGateway")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<REDACTED>")
            .finish()
    }
}

impl HmacGateway {
    pub fn new(key_id: impl Into<String>, key_secret: impl AsRef<[u8]>) -> Result<Self> {
        let key_secret = key_secret.as_ref().to_vec();
        if key_secret.is_empty() {
            bail!("gateway key secret is empty");
        }
        Ok(Self {
            key_id: key_id.into(),
            key_secret,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn mac(&self, payment_id: &str, order_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key_secret).ok()?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Some(mac)
    }

    /// The signature the processor would hand back for this pair.
    /// Tooling and tests use it to simulate a checkout callback.
    pub fn sign(&self, payment_id: &str, order_id: &str) -> Option<String> {
        self.mac(payment_id, order_id)
            .map(|m| hex::encode(m.finalize().into_bytes()))
    }
}

#[async_trait::async_trait]
impl PaymentGateway for HmacGateway {
    fn name(&self) -> &'static str {
        "hmac"
    }

    async fn create_order(
        &self,
        booking_id: i64,
        amount: Money,
        currency: &str,
    ) -> Result<String> {
        if !amount.is_positive() {
            bail!("gateway order amount must be positive, got {amount}");
        }
        let order_id = format!("order_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(booking_id, %amount, currency, order_id = %order_id, "gateway order created");
        Ok(order_id)
    }

    fn verify_signature(&self, payment_id: &str, order_id: &str, signature: &str) -> bool {
        let Ok(sig) = hex::decode(signature.trim()) else {
            return false;
        };
        match self.mac(payment_id, order_id) {
            // verify_slice compares in constant time
            Some(mac) => mac.verify_slice(&sig).is_ok(),
            None => false,
        }
    }
}

/// Stand-in when `gateway.mode` is `disabled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait::async_trait]
impl PaymentGateway for DisabledGateway {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn create_order(&self, _booking_id: i64, _amount: Money, _currency: &str) -> Result<String> {
        bail!("payment gateway is disabled")
    }

    fn verify_signature(&self, _payment_id: &str, _order_id: &str, _signature: &str) -> bool {
        false
    }
}
