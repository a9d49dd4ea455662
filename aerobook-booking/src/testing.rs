use async_trait::async_trait;
use uuid::Uuid;
use aerobook_core::account::{Admin, Permission, User};
use aerobook_core::flight::{Flight, NewFlightRequest};
use aerobook_core::payment::{GatewayError, GatewayOrder, MockPaymentGateway, OrderRequest, PaymentGateway};
use aerobook_core::Store;
use aerobook_store::MemoryStore;

pub const KEY_SECRET: &str = "test_key_secret";

pub struct Fixture {
    pub store: MemoryStore,
    pub flight: Flight,
    pub user: User,
    pub admin: Admin,
}

/// One admin with full rights, one user, one DEL→BOM flight.
pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let admin = Admin::new("ops@aerobook.test", vec![Permission::Write, Permission::Delete]);
    store.insert_admin(admin.clone()).await;
    let user = User::new("Asha Rao", "asha@example.com");
    store.insert_user(user.clone()).await;
    let flight = seed_flight(&store, admin.id, "6E-204", "DEL", "BOM", "2024-01-01T06:30:00Z", "Economy").await;

    Fixture { store, flight, user, admin }
}

pub async fn seed_flight(
    store: &MemoryStore,
    admin_id: Uuid,
    flight_number: &str,
    from: &str,
    to: &str,
    departs: &str,
    class_type: &str,
) -> Flight {
    let flight = NewFlightRequest {
        airline: Some("IndiGo".into()),
        flight_number: Some(flight_number.into()),
        departure_airport: Some(from.into()),
        arrival_airport: Some(to.into()),
        departure_time: Some(departs.into()),
        arrival_time: Some(departs.into()),
        duration: Some("2h 10m".into()),
        price: Some(5000),
        available_seats: Some(180),
        class_type: Some(class_type.into()),
        admin_id: Some(admin_id),
    }
    .validate()
    .unwrap()
    .into_flight();

    let mut uow = store.begin().await.unwrap();
    uow.insert_flight(&flight).await.unwrap();
    uow.push_admin_flight(admin_id, flight.id).await.unwrap();
    uow.commit().await.unwrap();
    flight
}

pub struct RefusingGateway;

#[async_trait]
impl PaymentGateway for RefusingGateway {
    async fn create_order(&self, _request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::Rejected { status: 400, message: "BAD_REQUEST_ERROR".to_string() })
    }
}

/// Removes a user while the order is being created, so the booking's unit of
/// work fails after the gateway has already accepted the order.
pub struct UserVanishingGateway {
    pub store: MemoryStore,
    pub user_id: Uuid,
}

#[async_trait]
impl PaymentGateway for UserVanishingGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        self.store.remove_user(self.user_id).await;
        MockPaymentGateway.create_order(request).await
    }
}
