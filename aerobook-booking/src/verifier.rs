use std::sync::Arc;
use tracing::{info, warn};
use aerobook_core::booking::{Booking, BookingStatus};
use aerobook_core::payment::{
    to_minor_units, verify_payment_signature, CreateOrderRequest, GatewayOrder, OrderRequest, PaymentConfirmation,
    PaymentGateway,
};
use aerobook_core::Store;
use crate::{BookingError, BookingResult};

pub struct PaymentVerifier {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    key_secret: String,
}

impl PaymentVerifier {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>, key_secret: &str) -> Self {
        Self { store, gateway, key_secret: key_secret.to_string() }
    }

    /// Create a standalone gateway order
    pub async fn create_order(&self, req: CreateOrderRequest) -> BookingResult<GatewayOrder> {
        if req.amount <= 0 {
            return Err(BookingError::ValidationFailed("amount must be a positive number".to_string()));
        }
        let currency = req.currency.trim();
        let receipt = req.receipt.trim();
        if currency.is_empty() || receipt.is_empty() {
            return Err(BookingError::ValidationFailed("currency and receipt are required".to_string()));
        }
        let amount = to_minor_units(req.amount)
            .ok_or_else(|| BookingError::ValidationFailed("amount is too large".to_string()))?;

        let order = self.gateway
            .create_order(&OrderRequest { amount, currency: currency.to_string(), receipt: receipt.to_string() })
            .await?;

        info!(order_id = %order.id, receipt = %receipt, "Gateway order created");
        Ok(order)
    }

    /// Check a payment confirmation and mark its booking `Paid`.
    ///
    /// This is the only path that moves a booking to `Paid`. A signature that
    /// does not match leaves the store untouched.
    pub async fn verify_payment(&self, confirmation: &PaymentConfirmation) -> BookingResult<Booking> {
        if !verify_payment_signature(
            &self.key_secret,
            &confirmation.order_id,
            &confirmation.payment_id,
            &confirmation.signature,
        ) {
            warn!(order_id = %confirmation.order_id, payment_id = %confirmation.payment_id, "Payment signature mismatch");
            return Err(BookingError::SignatureMismatch);
        }

        let booking = self.store.find_booking_by_order(&confirmation.order_id).await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
        if booking.status != BookingStatus::Pending {
            return settled(booking);
        }

        let paid = match self.store
            .transition_booking_status(booking.id, BookingStatus::Pending, BookingStatus::Paid)
            .await?
        {
            Some(paid) => paid,
            // Deleted or settled by another request since the lookup
            None => {
                let current = self.store.find_booking(booking.id).await?
                    .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
                return settled(current);
            }
        };

        info!(
            booking_id = %paid.id,
            order_id = %confirmation.order_id,
            payment_id = %confirmation.payment_id,
            "Payment verified"
        );
        Ok(paid)
    }
}

/// A booking that is no longer `Pending`. Repeating a verification of a paid
/// booking returns it unchanged; any other status cannot become `Paid`.
fn settled(booking: Booking) -> BookingResult<Booking> {
    match booking.status {
        BookingStatus::Paid => {
            info!(booking_id = %booking.id, order_id = %booking.order_id, "Payment already verified");
            Ok(booking)
        }
        status => {
            warn!(booking_id = %booking.id, status = %status, "Payment confirmation for a settled booking");
            Err(BookingError::Conflict(format!("Booking is {} and cannot be paid", status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobook_core::booking::CreateBookingRequest;
    use aerobook_core::payment::{payment_signature, MockPaymentGateway};
    use crate::coordinator::BookingCoordinator;
    use crate::testing::{fixture, RefusingGateway, KEY_SECRET};

    async fn pending_booking() -> (crate::testing::Fixture, Booking, PaymentVerifier) {
        let fx = fixture().await;
        let store: Arc<dyn Store> = Arc::new(fx.store.clone());
        let coordinator = BookingCoordinator::new(store.clone(), Arc::new(MockPaymentGateway), "INR");
        let booking = coordinator
            .create_booking(CreateBookingRequest {
                flight_id: fx.flight.id,
                user_id: fx.user.id,
                seat_number: "12A".to_string(),
                amount: 5000,
            })
            .await
            .unwrap();
        let verifier = PaymentVerifier::new(store, Arc::new(MockPaymentGateway), KEY_SECRET);
        (fx, booking, verifier)
    }

    fn confirmation(order_id: &str, payment_id: &str, signature: String) -> PaymentConfirmation {
        PaymentConfirmation { order_id: order_id.to_string(), payment_id: payment_id.to_string(), signature }
    }

    #[tokio::test]
    async fn test_matching_signature_marks_booking_paid() {
        let (fx, booking, verifier) = pending_booking().await;
        assert_eq!(booking.status, BookingStatus::Pending);

        let sig = payment_signature(KEY_SECRET, &booking.order_id, "pay_29QQoUBi66xm2f");
        let paid = verifier
            .verify_payment(&confirmation(&booking.order_id, "pay_29QQoUBi66xm2f", sig))
            .await
            .unwrap();

        assert_eq!(paid.id, booking.id);
        assert_eq!(paid.status, BookingStatus::Paid);
        assert_eq!(fx.store.find_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Paid);
    }

    #[tokio::test]
    async fn test_tampered_signature_leaves_status_unchanged() {
        let (fx, booking, verifier) = pending_booking().await;
        let sig = payment_signature(KEY_SECRET, &booking.order_id, "pay_1");

        let mut chars: Vec<char> = sig.chars().collect();
        chars[7] = if chars[7] == 'f' { 'e' } else { 'f' };
        let forged: String = chars.into_iter().collect();

        let result = verifier.verify_payment(&confirmation(&booking.order_id, "pay_1", forged)).await;
        assert!(matches!(result, Err(BookingError::SignatureMismatch)));
        assert_eq!(fx.store.find_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_only_pending_bookings_become_paid() {
        let (fx, booking, verifier) = pending_booking().await;
        let sig = payment_signature(KEY_SECRET, &booking.order_id, "pay_1");
        let confirm = || confirmation(&booking.order_id, "pay_1", sig.clone());

        fx.store
            .transition_booking_status(booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
            .await
            .unwrap()
            .unwrap();

        let result = verifier.verify_payment(&confirm()).await;
        assert!(matches!(result, Err(BookingError::Conflict(msg)) if msg.contains("Cancelled")));
        assert_eq!(fx.store.find_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_repeated_verification_keeps_booking_paid() {
        let (fx, booking, verifier) = pending_booking().await;
        let sig = payment_signature(KEY_SECRET, &booking.order_id, "pay_1");
        let confirm = confirmation(&booking.order_id, "pay_1", sig);

        let first = verifier.verify_payment(&confirm).await.unwrap();
        let second = verifier.verify_payment(&confirm).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fx.store.find_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Paid);
    }

    #[tokio::test]
    async fn test_valid_signature_for_unknown_order_is_not_found() {
        let (_fx, _booking, verifier) = pending_booking().await;
        let sig = payment_signature(KEY_SECRET, "order_unknown", "pay_1");

        let result = verifier.verify_payment(&confirmation("order_unknown", "pay_1", sig)).await;
        assert!(matches!(result, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_order_converts_to_minor_units() {
        let (_fx, _booking, verifier) = pending_booking().await;
        let order = verifier
            .create_order(CreateOrderRequest { amount: 499, currency: "INR".into(), receipt: "rcpt_42".into() })
            .await
            .unwrap();
        assert_eq!(order.amount, 49_900);
        assert_eq!(order.receipt.as_deref(), Some("rcpt_42"));

        let blank = verifier
            .create_order(CreateOrderRequest { amount: 499, currency: " ".into(), receipt: "rcpt_42".into() })
            .await;
        assert!(matches!(blank, Err(BookingError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_create_order_surfaces_gateway_failure() {
        let fx = fixture().await;
        let verifier = PaymentVerifier::new(Arc::new(fx.store.clone()), Arc::new(RefusingGateway), KEY_SECRET);
        let result = verifier
            .create_order(CreateOrderRequest { amount: 100, currency: "INR".into(), receipt: "rcpt_1".into() })
            .await;
        assert!(matches!(result, Err(BookingError::Gateway(_))));
    }
}
