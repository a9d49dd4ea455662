use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDateTime, Utc};
use crate::{required_text, CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub price: i64,
    pub available_seats: i32,
    pub class_type: String,
    pub bookings: Vec<Uuid>,
    pub edited_by_admin: Uuid,
}

impl Flight {
    /// Same airline, number and departure.
    pub fn same_schedule(&self, airline: &str, flight_number: &str, departure_time: DateTime<Utc>) -> bool {
        self.airline == airline && self.flight_number == flight_number && self.departure_time == departure_time
    }
}

/// Raw create-flight body. Every field is optional so missing input surfaces
/// as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlightRequest {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration: Option<String>,
    pub price: Option<i64>,
    pub available_seats: Option<i32>,
    pub class_type: Option<String>,
    pub admin_id: Option<Uuid>,
}

impl NewFlightRequest {
    pub fn validate(self) -> CoreResult<NewFlight> {
        let departure_time = required_text("departureTime", self.departure_time)?;
        let arrival_time = required_text("arrivalTime", self.arrival_time)?;

        Ok(NewFlight {
            airline: required_text("airline", self.airline)?,
            flight_number: required_text("flightNumber", self.flight_number)?,
            departure_airport: required_text("departureAirport", self.departure_airport)?,
            arrival_airport: required_text("arrivalAirport", self.arrival_airport)?,
            departure_time: parse_timestamp("departureTime", &departure_time)?,
            arrival_time: parse_timestamp("arrivalTime", &arrival_time)?,
            duration: required_text("duration", self.duration)?,
            price: positive("price", self.price)?,
            available_seats: positive("availableSeats", self.available_seats.map(i64::from))? as i32,
            class_type: required_text("classType", self.class_type)?,
            admin_id: self.admin_id.ok_or_else(|| CoreError::ValidationError("adminId is required".to_string()))?,
        })
    }
}

/// Validated flight input, ready to persist.
#[derive(Debug, Clone)]
pub struct NewFlight {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub price: i64,
    pub available_seats: i32,
    pub class_type: String,
    pub admin_id: Uuid,
}

impl NewFlight {
    pub fn into_flight(self) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            airline: self.airline,
            flight_number: self.flight_number,
            departure_airport: self.departure_airport,
            arrival_airport: self.arrival_airport,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            duration: self.duration,
            price: self.price,
            available_seats: self.available_seats,
            class_type: self.class_type,
            bookings: Vec::new(),
            edited_by_admin: self.admin_id,
        }
    }
}

/// Partial update body for an existing flight.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightUpdateRequest {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration: Option<String>,
    pub price: Option<i64>,
    pub available_seats: Option<i32>,
    pub class_type: Option<String>,
}

impl FlightUpdateRequest {
    pub fn validate(self) -> CoreResult<FlightPatch> {
        fn text(field: &str, value: Option<String>) -> CoreResult<Option<String>> {
            match value {
                Some(v) => required_text(field, Some(v)).map(Some),
                None => Ok(None),
            }
        }

        let departure_time = match text("departureTime", self.departure_time)? {
            Some(raw) => Some(parse_timestamp("departureTime", &raw)?),
            None => None,
        };
        let arrival_time = match text("arrivalTime", self.arrival_time)? {
            Some(raw) => Some(parse_timestamp("arrivalTime", &raw)?),
            None => None,
        };
        let price = match self.price {
            Some(p) => Some(positive("price", Some(p))?),
            None => None,
        };
        let available_seats = match self.available_seats {
            Some(s) => Some(positive("availableSeats", Some(i64::from(s)))? as i32),
            None => None,
        };

        Ok(FlightPatch {
            airline: text("airline", self.airline)?,
            flight_number: text("flightNumber", self.flight_number)?,
            departure_airport: text("departureAirport", self.departure_airport)?,
            arrival_airport: text("arrivalAirport", self.arrival_airport)?,
            departure_time,
            arrival_time,
            duration: text("duration", self.duration)?,
            price,
            available_seats,
            class_type: text("classType", self.class_type)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightPatch {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub price: Option<i64>,
    pub available_seats: Option<i32>,
    pub class_type: Option<String>,
}

impl FlightPatch {
    /// Apply the supplied fields and stamp the editing admin.
    pub fn apply(&self, flight: &mut Flight, admin_id: Uuid) {
        if let Some(v) = &self.airline { flight.airline = v.clone(); }
        if let Some(v) = &self.flight_number { flight.flight_number = v.clone(); }
        if let Some(v) = &self.departure_airport { flight.departure_airport = v.clone(); }
        if let Some(v) = &self.arrival_airport { flight.arrival_airport = v.clone(); }
        if let Some(v) = self.departure_time { flight.departure_time = v; }
        if let Some(v) = self.arrival_time { flight.arrival_time = v; }
        if let Some(v) = &self.duration { flight.duration = v.clone(); }
        if let Some(v) = self.price { flight.price = v; }
        if let Some(v) = self.available_seats { flight.available_seats = v; }
        if let Some(v) = &self.class_type { flight.class_type = v.clone(); }
        flight.edited_by_admin = admin_id;
    }
}

fn positive(field: &str, value: Option<i64>) -> CoreResult<i64> {
    match value {
        Some(v) if v > 0 => Ok(v),
        _ => Err(CoreError::ValidationError(format!("{} must be a positive number", field))),
    }
}

/// RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> CoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::ValidationError(format!("{} is not a valid timestamp", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> NewFlightRequest {
        NewFlightRequest {
            airline: Some("IndiGo".to_string()),
            flight_number: Some("6E-204".to_string()),
            departure_airport: Some("DEL".to_string()),
            arrival_airport: Some("BOM".to_string()),
            departure_time: Some("2024-01-01T06:30:00Z".to_string()),
            arrival_time: Some("2024-01-01T08:40:00Z".to_string()),
            duration: Some("2h 10m".to_string()),
            price: Some(5000),
            available_seats: Some(180),
            class_type: Some("Economy".to_string()),
            admin_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_valid_flight_request() {
        let admin_id = Uuid::new_v4();
        let mut req = request();
        req.admin_id = Some(admin_id);
        req.airline = Some("  IndiGo ".to_string());

        let flight = req.validate().unwrap().into_flight();
        assert_eq!(flight.airline, "IndiGo");
        assert_eq!(flight.departure_time, Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap());
        assert_eq!(flight.edited_by_admin, admin_id);
        assert!(flight.bookings.is_empty());
    }

    #[test]
    fn test_rejects_blank_and_non_positive_fields() {
        let mut blank = request();
        blank.duration = Some("   ".to_string());
        assert!(matches!(blank.validate(), Err(CoreError::ValidationError(msg)) if msg.contains("duration")));

        let mut free = request();
        free.price = Some(0);
        assert!(free.validate().is_err());

        let mut no_seats = request();
        no_seats.available_seats = Some(-3);
        assert!(no_seats.validate().is_err());

        let mut no_admin = request();
        no_admin.admin_id = None;
        assert!(no_admin.validate().is_err());

        let mut bad_time = request();
        bad_time.arrival_time = Some("tomorrow".to_string());
        assert!(bad_time.validate().is_err());
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut flight = request().validate().unwrap().into_flight();
        let editor = Uuid::new_v4();
        let patch = FlightUpdateRequest {
            price: Some(6200),
            class_type: Some("Business".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        patch.apply(&mut flight, editor);
        assert_eq!(flight.price, 6200);
        assert_eq!(flight.class_type, "Business");
        assert_eq!(flight.airline, "IndiGo");
        assert_eq!(flight.edited_by_admin, editor);

        let empty_airline = FlightUpdateRequest { airline: Some(String::new()), ..Default::default() };
        assert!(empty_airline.validate().is_err());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp("departureTime", "2024-03-10T14:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap());
    }
}
