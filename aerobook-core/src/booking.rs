use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub flight: Uuid,
    pub user: Uuid,
    pub seat_number: String,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub receipt: String,
    /// Gateway order this booking is paid through.
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

impl Booking {
    /// A fresh `Pending` booking tied to a gateway order.
    pub fn pending(
        flight: Uuid,
        user: Uuid,
        seat_number: &str,
        receipt: &str,
        order_id: &str,
        amount: i64,
        currency: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight,
            user,
            seat_number: seat_number.to_string(),
            booking_date: Utc::now(),
            status: BookingStatus::Pending,
            receipt: receipt.to_string(),
            order_id: order_id.to_string(),
            amount,
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Paid => "Paid",
            BookingStatus::Failed => "Failed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Paid" => Ok(BookingStatus::Paid),
            "Failed" => Ok(BookingStatus::Failed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub seat_number: String,
    pub amount: i64,
}

/// Gateway receipt for an order created at `now`.
pub fn receipt_for(now: DateTime<Utc>) -> String {
    format!("receipt_{}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pending_booking_shape() {
        let flight = Uuid::new_v4();
        let user = Uuid::new_v4();
        let booking = Booking::pending(flight, user, "12A", "receipt_1", "order_1", 5000, "INR");

        assert_eq!(booking.status, BookingStatus::Pending);
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["seatNumber"], "12A");
        assert_eq!(json["orderId"], "order_1");
        assert_eq!(json["flight"], flight.to_string());
    }

    #[test]
    fn test_receipt_uses_millis() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(receipt_for(at), "receipt_1704067200000");
    }

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{"flightId":"6f1c2a3e-8d7b-4c1a-9e2f-0a1b2c3d4e5f","userId":"0d4b5c6e-1f2a-4b3c-8d9e-7f6a5b4c3d2e","seatNumber":"12A","amount":5000}"#;
        let req: CreateBookingRequest = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(req.seat_number, "12A");
        assert_eq!(req.amount, 5000);
        assert_eq!("Paid".parse::<BookingStatus>().unwrap(), BookingStatus::Paid);
    }
}
