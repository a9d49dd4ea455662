use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Order creation payload. `amount` is in the smallest currency unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// A payment order as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub created_at: i64,
}

/// Client-facing order request. `amount` is in major currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Confirmation payload relayed by the client after checkout. Accepts the
/// gateway's own callback field names as well.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "orderId", alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(rename = "paymentId", alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway timed out")]
    Timeout,
    #[error("Payment gateway rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Payment gateway request failed: {0}")]
    Transport(String),
    #[error("Payment gateway response could not be parsed: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment order with the provider
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;
}

/// Convert a major-unit amount to the gateway's smallest unit.
pub fn to_minor_units(amount: i64) -> Option<i64> {
    amount.checked_mul(100)
}

/// Lowercase hex HMAC-SHA256 of `message`.
pub fn sign(secret: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The signature the gateway attaches to a payment confirmation.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    sign(secret, &format!("{}|{}", order_id, payment_id))
}

/// Constant-time check of a confirmation signature.
pub fn verify_payment_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let expected = payment_signature(secret, order_id, payment_id);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Gateway stand-in that accepts every order.
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let id = format!("order_{}", &Uuid::new_v4().simple().to_string()[..14]);
        tracing::info!(order_id = %id, receipt = %request.receipt, "Mock gateway created order");

        Ok(GatewayOrder {
            id,
            entity: "order".to_string(),
            amount: request.amount,
            amount_paid: 0,
            amount_due: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_string(),
            attempts: 0,
            created_at: chrono::Utc::now().timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_reference_vector() {
        // RFC 4231, test case 2
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_round_trip() {
        let sig = payment_signature("key_secret", "order_A1", "pay_B2");
        assert_eq!(sig, sign("key_secret", "order_A1|pay_B2"));
        assert!(verify_payment_signature("key_secret", "order_A1", "pay_B2", &sig));
        assert!(!verify_payment_signature("other_secret", "order_A1", "pay_B2", &sig));
        assert!(!verify_payment_signature("key_secret", "order_A1", "pay_B3", &sig));
    }

    #[test]
    fn test_any_flipped_character_is_rejected() {
        let sig = payment_signature("key_secret", "order_A1", "pay_B2");
        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let forged = String::from_utf8(bytes).unwrap();
            assert!(!verify_payment_signature("key_secret", "order_A1", "pay_B2", &forged), "position {}", i);
        }
        assert!(!verify_payment_signature("key_secret", "order_A1", "pay_B2", &sig[..sig.len() - 1]));
        assert!(!verify_payment_signature("key_secret", "order_A1", "pay_B2", ""));
    }

    #[test]
    fn test_confirmation_accepts_gateway_field_names() {
        let ours: PaymentConfirmation =
            serde_json::from_str(r#"{"orderId":"order_1","paymentId":"pay_1","signature":"abc"}"#).unwrap();
        let theirs: PaymentConfirmation = serde_json::from_str(
            r#"{"razorpay_order_id":"order_1","razorpay_payment_id":"pay_1","razorpay_signature":"abc"}"#,
        )
        .unwrap();
        assert_eq!(ours.order_id, theirs.order_id);
        assert_eq!(ours.payment_id, theirs.payment_id);
        assert_eq!(ours.signature, theirs.signature);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(5000), Some(500_000));
        assert_eq!(to_minor_units(i64::MAX), None);
    }

    #[tokio::test]
    async fn test_mock_gateway_echoes_request() {
        let request = OrderRequest { amount: 500_000, currency: "INR".to_string(), receipt: "receipt_1".to_string() };
        let order = MockPaymentGateway.create_order(&request).await.unwrap();
        assert!(order.id.starts_with("order_"));
        assert_eq!(order.amount_due, 500_000);
        assert_eq!(order.receipt.as_deref(), Some("receipt_1"));
    }
}
