use async_trait::async_trait;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::account::{Admin, User};
use crate::booking::{Booking, BookingStatus};
use crate::flight::{Flight, FlightPatch};
use crate::search::RouteQuery;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed access to flights, users, admins and bookings.
///
/// Single-record reads and writes go through the store directly. Anything
/// touching more than one record goes through a [`UnitOfWork`] from
/// [`Store::begin`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    async fn find_flight(&self, id: Uuid) -> StoreResult<Option<Flight>>;

    async fn find_flight_by_schedule(
        &self,
        airline: &str,
        flight_number: &str,
        departure_time: DateTime<Utc>,
    ) -> StoreResult<Option<Flight>>;

    async fn list_flights(&self) -> StoreResult<Vec<Flight>>;

    /// Flights on a route, ordered by departure time.
    async fn search_flights(&self, query: &RouteQuery) -> StoreResult<Vec<Flight>>;

    /// Apply a patch and return the updated flight, `None` when absent.
    async fn update_flight(
        &self,
        id: Uuid,
        patch: &FlightPatch,
        admin_id: Uuid,
    ) -> StoreResult<Option<Flight>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>>;

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn find_booking_by_order(&self, order_id: &str) -> StoreResult<Option<Booking>>;

    /// Move a booking from `from` to `to`, returning the updated booking.
    /// `None` when the booking is absent or not currently in `from`.
    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>>;
}

/// A store transaction. Writes become visible only on [`UnitOfWork::commit`];
/// dropping an uncommitted unit discards them.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()>;

    /// Remove a booking, returning it if it existed.
    async fn delete_booking(&mut self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Fails with `NotFound` if the flight does not exist.
    async fn push_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()>;

    async fn pull_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()>;

    /// Fails with `NotFound` if the user does not exist.
    async fn push_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()>;

    async fn pull_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()>;

    /// Fails with `Conflict` on a duplicate (airline, flight number, departure).
    async fn insert_flight(&mut self, flight: &Flight) -> StoreResult<()>;

    async fn delete_flight(&mut self, id: Uuid) -> StoreResult<Option<Flight>>;

    async fn push_admin_flight(&mut self, admin_id: Uuid, flight_id: Uuid) -> StoreResult<()>;

    /// Drop a flight from every admin's managed list.
    async fn pull_admin_flight(&mut self, flight_id: Uuid) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
