use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use aerobook_core::account::{Admin, User};
use aerobook_core::booking::{Booking, BookingStatus};
use aerobook_core::flight::{Flight, FlightPatch};
use aerobook_core::search::RouteQuery;
use aerobook_core::{Store, StoreError, StoreResult, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct Tables {
    flights: HashMap<Uuid, Flight>,
    users: HashMap<Uuid, User>,
    admins: HashMap<Uuid, Admin>,
    bookings: HashMap<Uuid, Booking>,
}

impl Tables {
    fn schedule_taken(&self, flight: &Flight) -> bool {
        self.flights.values().any(|f| {
            f.id != flight.id && f.same_schedule(&flight.airline, &flight.flight_number, flight.departure_time)
        })
    }
}

/// In-process store for local runs and tests.
///
/// A unit of work holds the table lock for its whole lifetime and writes to a
/// staged copy, so readers only ever see committed state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the given accounts.
    pub async fn with_accounts(users: Vec<User>, admins: Vec<Admin>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert_user(user).await;
        }
        for admin in admins {
            store.insert_admin(admin).await;
        }
        store
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_admin(&self, admin: Admin) {
        self.tables.lock().await.admins.insert(admin.id, admin);
    }

    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        self.tables.lock().await.users.remove(&id)
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }

    async fn find_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        Ok(self.tables.lock().await.flights.get(&id).cloned())
    }

    async fn find_flight_by_schedule(
        &self,
        airline: &str,
        flight_number: &str,
        departure_time: DateTime<Utc>,
    ) -> StoreResult<Option<Flight>> {
        let tables = self.tables.lock().await;
        Ok(tables.flights.values()
            .find(|f| f.same_schedule(airline, flight_number, departure_time))
            .cloned())
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let mut flights: Vec<Flight> = self.tables.lock().await.flights.values().cloned().collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn search_flights(&self, query: &RouteQuery) -> StoreResult<Vec<Flight>> {
        let mut flights: Vec<Flight> = self.tables.lock().await.flights.values()
            .filter(|f| query.matches(f))
            .cloned()
            .collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn update_flight(
        &self,
        id: Uuid,
        patch: &FlightPatch,
        admin_id: Uuid,
    ) -> StoreResult<Option<Flight>> {
        let mut tables = self.tables.lock().await;
        let mut flight = match tables.flights.get(&id) {
            Some(f) => f.clone(),
            None => return Ok(None),
        };
        patch.apply(&mut flight, admin_id);

        if tables.schedule_taken(&flight) {
            return Err(StoreError::Conflict("flight schedule already exists".to_string()));
        }
        tables.flights.insert(id, flight.clone());
        Ok(Some(flight))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        Ok(self.tables.lock().await.admins.get(&id).cloned())
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn find_booking_by_order(&self, order_id: &str) -> StoreResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables.bookings.values().find(|b| b.order_id == order_id).cloned())
    }

    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.bookings.get_mut(&id)
            .filter(|booking| booking.status == from)
            .map(|booking| {
                booking.status = to;
                booking.clone()
            }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        if self.staged.bookings.values().any(|b| b.order_id == booking.order_id) {
            return Err(StoreError::Conflict(format!("order {} already has a booking", booking.order_id)));
        }
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn delete_booking(&mut self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.staged.bookings.remove(&id))
    }

    async fn push_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        let flight = self.staged.flights.get_mut(&flight_id)
            .ok_or_else(|| StoreError::NotFound("Flight".to_string()))?;
        flight.bookings.push(booking_id);
        Ok(())
    }

    async fn pull_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        if let Some(flight) = self.staged.flights.get_mut(&flight_id) {
            flight.bookings.retain(|b| *b != booking_id);
        }
        Ok(())
    }

    async fn push_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        let user = self.staged.users.get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        user.bookings.push(booking_id);
        Ok(())
    }

    async fn pull_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        if let Some(user) = self.staged.users.get_mut(&user_id) {
            user.bookings.retain(|b| *b != booking_id);
        }
        Ok(())
    }

    async fn insert_flight(&mut self, flight: &Flight) -> StoreResult<()> {
        if self.staged.schedule_taken(flight) {
            return Err(StoreError::Conflict("flight schedule already exists".to_string()));
        }
        self.staged.flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn delete_flight(&mut self, id: Uuid) -> StoreResult<Option<Flight>> {
        Ok(self.staged.flights.remove(&id))
    }

    async fn push_admin_flight(&mut self, admin_id: Uuid, flight_id: Uuid) -> StoreResult<()> {
        let admin = self.staged.admins.get_mut(&admin_id)
            .ok_or_else(|| StoreError::NotFound("Admin".to_string()))?;
        admin.managed_flights.push(flight_id);
        Ok(())
    }

    async fn pull_admin_flight(&mut self, flight_id: Uuid) -> StoreResult<()> {
        for admin in self.staged.admins.values_mut() {
            admin.managed_flights.retain(|f| *f != flight_id);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
