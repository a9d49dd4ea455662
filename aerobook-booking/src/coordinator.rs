use std::sync::Arc;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;
use aerobook_core::booking::{receipt_for, Booking, CreateBookingRequest};
use aerobook_core::payment::{to_minor_units, OrderRequest, PaymentGateway};
use aerobook_core::{Store, UnitOfWork};
use crate::{finish, BookingError, BookingResult};

/// Creates and removes bookings together with the flight and user
/// back-references that point at them.
pub struct BookingCoordinator {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        Self { store, gateway, currency: currency.to_string() }
    }

    /// Reserve a seat: gateway order first, then the booking and both
    /// back-references in a single unit of work.
    ///
    /// The gateway order cannot be undone. If persistence fails after it was
    /// created, the order is left orphaned at the gateway and logged.
    pub async fn create_booking(&self, req: CreateBookingRequest) -> BookingResult<Booking> {
        let seat_number = req.seat_number.trim();
        if seat_number.is_empty() {
            return Err(BookingError::ValidationFailed("seatNumber is required".to_string()));
        }
        if req.amount <= 0 {
            return Err(BookingError::ValidationFailed("amount must be a positive number".to_string()));
        }
        let minor_amount = to_minor_units(req.amount)
            .ok_or_else(|| BookingError::ValidationFailed("amount is too large".to_string()))?;

        let flight = self.store.find_flight(req.flight_id).await?
            .ok_or_else(|| BookingError::NotFound("Flight not found with the given ID".to_string()))?;
        let user = self.store.find_user(req.user_id).await?
            .ok_or_else(|| BookingError::NotFound("User not found with the given ID".to_string()))?;

        let order_request = OrderRequest {
            amount: minor_amount,
            currency: self.currency.clone(),
            receipt: receipt_for(Utc::now()),
        };
        let order = self.gateway.create_order(&order_request).await.map_err(|e| {
            error!(flight_id = %flight.id, receipt = %order_request.receipt, error = %e, "Gateway order creation failed");
            e
        })?;

        let receipt = order.receipt.clone().unwrap_or(order_request.receipt);
        let booking = Booking::pending(flight.id, user.id, seat_number, &receipt, &order.id, req.amount, &order.currency);

        if let Err(e) = self.persist_booking(&booking).await {
            warn!(
                order_id = %order.id,
                receipt = %receipt,
                error = %e,
                "Booking not persisted, gateway order left orphaned"
            );
            return Err(e);
        }

        info!(booking_id = %booking.id, flight_id = %flight.id, order_id = %order.id, "Booking created");
        Ok(booking)
    }

    async fn persist_booking(&self, booking: &Booking) -> BookingResult<()> {
        let mut uow = self.store.begin().await?;
        let outcome = link_booking(uow.as_mut(), booking).await;
        finish(uow, outcome).await
    }

    pub async fn get_booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.store.find_booking(id).await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))
    }

    /// Remove a booking and pull it from its flight and user, all or nothing.
    pub async fn delete_booking(&self, id: Uuid) -> BookingResult<Booking> {
        let mut uow = self.store.begin().await?;
        let outcome = unlink_booking(uow.as_mut(), id).await;
        let booking = finish(uow, outcome).await?;

        info!(booking_id = %booking.id, flight_id = %booking.flight, "Booking deleted");
        Ok(booking)
    }
}

async fn link_booking(uow: &mut dyn UnitOfWork, booking: &Booking) -> BookingResult<()> {
    uow.insert_booking(booking).await?;
    uow.push_flight_booking(booking.flight, booking.id).await?;
    uow.push_user_booking(booking.user, booking.id).await?;
    Ok(())
}

async fn unlink_booking(uow: &mut dyn UnitOfWork, id: Uuid) -> BookingResult<Booking> {
    let booking = uow.delete_booking(id).await?
        .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
    uow.pull_flight_booking(booking.flight, booking.id).await?;
    uow.pull_user_booking(booking.user, booking.id).await?;
    Ok(booking)
}
