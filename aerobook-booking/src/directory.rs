use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use aerobook_core::account::{Admin, Permission};
use aerobook_core::flight::{Flight, FlightUpdateRequest, NewFlightRequest};
use aerobook_core::search::{FlightSearchRequest, FlightSearchResult};
use aerobook_core::{Store, StoreError, UnitOfWork};
use crate::{finish, BookingError, BookingResult};

const DUPLICATE_FLIGHT: &str = "Flight already exists";

/// Flight catalogue: admin-managed CRUD plus route search.
pub struct FlightDirectory {
    store: Arc<dyn Store>,
}

impl FlightDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_flight(&self, req: NewFlightRequest) -> BookingResult<Flight> {
        let input = req.validate()?;

        self.store.find_admin(input.admin_id).await?
            .ok_or_else(|| BookingError::NotFound("Admin not found".to_string()))?;

        if self.store
            .find_flight_by_schedule(&input.airline, &input.flight_number, input.departure_time)
            .await?
            .is_some()
        {
            return Err(BookingError::Conflict(DUPLICATE_FLIGHT.to_string()));
        }

        let flight = input.into_flight();
        let mut uow = self.store.begin().await?;
        let outcome = register_flight(uow.as_mut(), &flight).await;
        finish(uow, outcome).await.map_err(duplicate_as_conflict)?;

        info!(flight_id = %flight.id, admin_id = %flight.edited_by_admin, "Flight created");
        Ok(flight)
    }

    pub async fn list_flights(&self) -> BookingResult<Vec<Flight>> {
        Ok(self.store.list_flights().await?)
    }

    pub async fn get_flight(&self, id: Uuid) -> BookingResult<Flight> {
        self.store.find_flight(id).await?
            .ok_or_else(|| BookingError::NotFound("Flight not found".to_string()))
    }

    pub async fn flight_exists(&self, id: Uuid) -> BookingResult<bool> {
        Ok(self.store.find_flight(id).await?.is_some())
    }

    /// Outbound flights, plus the reverse route when a return date is given.
    pub async fn search(&self, req: FlightSearchRequest) -> BookingResult<FlightSearchResult> {
        let plan = req.into_plan()?;

        let flights = self.store.search_flights(&plan.outbound).await?;
        let return_flights = match &plan.inbound {
            Some(inbound) => Some(self.store.search_flights(inbound).await?),
            None => None,
        };

        debug!(
            origin = %plan.outbound.origin,
            destination = %plan.outbound.destination,
            outbound = flights.len(),
            inbound = return_flights.as_ref().map_or(0, Vec::len),
            "Flight search"
        );
        Ok(FlightSearchResult { flights, return_flights })
    }

    /// Resolve an admin and check it holds `permission`.
    pub async fn authorize(&self, admin_id: Uuid, permission: Permission) -> BookingResult<Admin> {
        let admin = self.store.find_admin(admin_id).await?
            .ok_or_else(|| BookingError::NotFound("Admin not found".to_string()))?;

        if !admin.has_permission(permission) {
            warn!(admin_id = %admin_id, permission = %permission, "Admin lacks permission");
            let action = match permission {
                Permission::Write => "update",
                Permission::Delete => "delete",
            };
            return Err(BookingError::Forbidden(format!("Unauthorized to {} flight", action)));
        }
        Ok(admin)
    }

    pub async fn update_flight(&self, id: Uuid, req: FlightUpdateRequest, admin_id: Uuid) -> BookingResult<Flight> {
        let admin = self.authorize(admin_id, Permission::Write).await?;
        let patch = req.validate()?;

        let flight = self.store.update_flight(id, &patch, admin.id).await
            .map_err(|e| duplicate_as_conflict(e.into()))?
            .ok_or_else(|| BookingError::NotFound("Flight not found".to_string()))?;

        info!(flight_id = %flight.id, admin_id = %admin.id, "Flight updated");
        Ok(flight)
    }

    /// Remove a flight and pull it from every admin's managed list.
    ///
    /// Refused while any booking still references the flight.
    pub async fn delete_flight(&self, id: Uuid, admin_id: Uuid) -> BookingResult<Flight> {
        let admin = self.authorize(admin_id, Permission::Delete).await?;

        let mut uow = self.store.begin().await?;
        let outcome = retire_flight(uow.as_mut(), id).await;
        let flight = finish(uow, outcome).await?;

        info!(flight_id = %flight.id, admin_id = %admin.id, "Flight deleted");
        Ok(flight)
    }
}

async fn register_flight(uow: &mut dyn UnitOfWork, flight: &Flight) -> BookingResult<()> {
    uow.insert_flight(flight).await?;
    uow.push_admin_flight(flight.edited_by_admin, flight.id).await
        .map_err(|e| match e {
            StoreError::NotFound(_) => BookingError::NotFound("Admin not found".to_string()),
            other => other.into(),
        })?;
    Ok(())
}

async fn retire_flight(uow: &mut dyn UnitOfWork, id: Uuid) -> BookingResult<Flight> {
    let still_booked = || BookingError::Conflict("Flight has active bookings".to_string());

    // Postgres refuses the delete itself while bookings reference the row
    let flight = uow.delete_flight(id).await
        .map_err(|e| match e {
            StoreError::Conflict(_) => still_booked(),
            other => other.into(),
        })?
        .ok_or_else(|| BookingError::NotFound("Flight not found".to_string()))?;
    if !flight.bookings.is_empty() {
        return Err(still_booked());
    }
    uow.pull_admin_flight(flight.id).await?;
    Ok(flight)
}

fn duplicate_as_conflict(err: BookingError) -> BookingError {
    match err {
        BookingError::Conflict(_) => BookingError::Conflict(DUPLICATE_FLIGHT.to_string()),
        other => other,
    }
}
