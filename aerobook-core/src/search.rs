use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crate::flight::Flight;
use crate::{CoreError, CoreResult};

/// Query string of a flight search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub class_type: Option<String>,
}

/// One direction of a search: a route departing on or after a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    pub departs_after: DateTime<Utc>,
    pub class_type: Option<String>,
}

impl RouteQuery {
    pub fn matches(&self, flight: &Flight) -> bool {
        flight.departure_airport == self.origin
            && flight.arrival_airport == self.destination
            && flight.departure_time >= self.departs_after
            && self.class_type.as_ref().map_or(true, |c| &flight.class_type == c)
    }
}

#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub outbound: RouteQuery,
    pub inbound: Option<RouteQuery>,
}

impl FlightSearchRequest {
    pub fn into_plan(self) -> CoreResult<SearchPlan> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let (from, to, departure_date) = match (present(self.from), present(self.to), present(self.departure_date)) {
            (Some(f), Some(t), Some(d)) => (f, t, d),
            _ => {
                return Err(CoreError::ValidationError(
                    "Invalid input: from, to, and departureDate are required".to_string(),
                ))
            }
        };
        let class_type = present(self.class_type);

        let inbound = match present(self.return_date) {
            Some(raw) => Some(RouteQuery {
                origin: to.clone(),
                destination: from.clone(),
                departs_after: parse_search_date("returnDate", &raw)?,
                class_type: class_type.clone(),
            }),
            None => None,
        };

        Ok(SearchPlan {
            outbound: RouteQuery {
                departs_after: parse_search_date("departureDate", &departure_date)?,
                origin: from,
                destination: to,
                class_type,
            },
            inbound,
        })
    }
}

/// A calendar date means midnight UTC; a full timestamp is taken as given.
fn parse_search_date(field: &str, raw: &str) -> CoreResult<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    crate::flight::parse_timestamp(field, raw)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchResult {
    pub flights: Vec<Flight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_flights: Option<Vec<Flight>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_query_deserialization() {
        let json = r#"{ "from": "DEL", "to": "BOM", "departureDate": "2024-01-01", "classType": "" }"#;
        let req: FlightSearchRequest = serde_json::from_str(json).expect("Failed to deserialize");
        let plan = req.into_plan().unwrap();

        assert_eq!(plan.outbound.origin, "DEL");
        assert_eq!(plan.outbound.departs_after, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(plan.outbound.class_type, None);
        assert!(plan.inbound.is_none());
    }

    #[test]
    fn test_return_leg_reverses_route() {
        let req = FlightSearchRequest {
            from: Some("DEL".into()),
            to: Some("BOM".into()),
            departure_date: Some("2024-01-01".into()),
            return_date: Some("2024-01-05".into()),
            class_type: Some("Economy".into()),
        };
        let inbound = req.into_plan().unwrap().inbound.unwrap();
        assert_eq!(inbound.origin, "BOM");
        assert_eq!(inbound.destination, "DEL");
        assert_eq!(inbound.class_type.as_deref(), Some("Economy"));
    }

    #[test]
    fn test_missing_required_fields() {
        let req = FlightSearchRequest { from: Some("DEL".into()), ..Default::default() };
        assert!(req.into_plan().is_err());

        let bad_date = FlightSearchRequest {
            from: Some("DEL".into()),
            to: Some("BOM".into()),
            departure_date: Some("01/01/2024".into()),
            ..Default::default()
        };
        assert!(bad_date.into_plan().is_err());
    }
}
