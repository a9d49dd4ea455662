use std::sync::Arc;
use aerobook_booking::{BookingCoordinator, FlightDirectory, PaymentVerifier};
use aerobook_core::payment::PaymentGateway;
use aerobook_core::Store;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingCoordinator>,
    pub payments: Arc<PaymentVerifier>,
    pub flights: Arc<FlightDirectory>,
    pub auth: AuthConfig,
}

/// Payment settings shared by the booking and verification paths.
pub struct PaymentSettings<'a> {
    pub currency: &'a str,
    pub key_secret: &'a str,
}

impl AppState {
    /// Wire the services over one store and one gateway client.
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        payment: PaymentSettings<'_>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            bookings: Arc::new(BookingCoordinator::new(store.clone(), gateway.clone(), payment.currency)),
            payments: Arc::new(PaymentVerifier::new(store.clone(), gateway, payment.key_secret)),
            flights: Arc::new(FlightDirectory::new(store)),
            auth,
        }
    }
}
