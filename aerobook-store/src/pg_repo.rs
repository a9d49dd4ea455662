use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use aerobook_core::account::{Admin, Permission, User};
use aerobook_core::booking::{Booking, BookingStatus};
use aerobook_core::flight::{Flight, FlightPatch};
use aerobook_core::search::RouteQuery;
use aerobook_core::{Store, StoreError, StoreResult, UnitOfWork};

const FLIGHT_COLUMNS: &str = "id, airline, flight_number, departure_airport, arrival_airport, \
    departure_time, arrival_time, duration, price, available_seats, class_type, bookings, edited_by_admin";

const BOOKING_COLUMNS: &str = "id, flight_id, user_id, seat_number, booking_date, status, receipt, order_id, amount, currency";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    flight_number: String,
    departure_airport: String,
    arrival_airport: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    duration: String,
    price: i64,
    available_seats: i32,
    class_type: String,
    bookings: Vec<Uuid>,
    edited_by_admin: Uuid,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            airline: row.airline,
            flight_number: row.flight_number,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration: row.duration,
            price: row.price,
            available_seats: row.available_seats,
            class_type: row.class_type,
            bookings: row.bookings,
            edited_by_admin: row.edited_by_admin,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    flight_id: Uuid,
    user_id: Uuid,
    seat_number: String,
    booking_date: DateTime<Utc>,
    status: String,
    receipt: String,
    order_id: String,
    amount: i64,
    currency: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            flight: row.flight_id,
            user: row.user_id,
            seat_number: row.seat_number,
            booking_date: row.booking_date,
            status: row.status.parse().map_err(StoreError::Backend)?,
            receipt: row.receipt,
            order_id: row.order_id,
            amount: row.amount,
            currency: row.currency,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    bookings: Vec<Uuid>,
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    permissions: Vec<String>,
    managed_flights: Vec<Uuid>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        let permissions = row.permissions.iter()
            .filter_map(|p| match p.parse::<Permission>() {
                Ok(permission) => Some(permission),
                Err(e) => {
                    tracing::warn!(admin_id = %row.id, "Ignoring stored permission: {}", e);
                    None
                }
            })
            .collect();

        Admin {
            id: row.id,
            email: row.email,
            permissions,
            managed_flights: row.managed_flights,
        }
    }
}

/// Foreign keys a booking or flight insert depends on, by constraint name.
const BOOKING_REFERENCES: &[(&str, &str)] = &[
    ("bookings_flight_id_fkey", "Flight"),
    ("bookings_user_id_fkey", "User"),
];
const FLIGHT_REFERENCES: &[(&str, &str)] = &[("flights_edited_by_admin_fkey", "Admin")];

// Constraint messages stay in the log; callers only get a fixed description.
fn db_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::debug!(constraint = ?db.constraint(), "Unique violation: {}", db.message());
            StoreError::Conflict("record already exists".to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            tracing::debug!(constraint = ?db.constraint(), "Foreign key violation: {}", db.message());
            StoreError::Conflict("record is referenced by other records".to_string())
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

/// An insert whose referenced row is gone reports that row as not found.
fn insert_err(e: sqlx::Error, references: &[(&str, &str)]) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            if let Some(what) = missing_reference(db.constraint(), references) {
                return StoreError::NotFound(what.to_string());
            }
        }
    }
    db_err(e)
}

fn missing_reference<'a>(constraint: Option<&str>, references: &[(&str, &'a str)]) -> Option<&'a str> {
    let constraint = constraint?;
    references.iter().find(|(name, _)| *name == constraint).map(|(_, what)| *what)
}

fn expect_row(rows_affected: u64, what: &str) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound(what.to_string()));
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        let sql = format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Flight::from))
    }

    async fn find_flight_by_schedule(
        &self,
        airline: &str,
        flight_number: &str,
        departure_time: DateTime<Utc>,
    ) -> StoreResult<Option<Flight>> {
        let sql = format!(
            "SELECT {} FROM flights WHERE airline = $1 AND flight_number = $2 AND departure_time = $3",
            FLIGHT_COLUMNS
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(airline)
            .bind(flight_number)
            .bind(departure_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Flight::from))
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let sql = format!("SELECT {} FROM flights ORDER BY departure_time", FLIGHT_COLUMNS);
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn search_flights(&self, query: &RouteQuery) -> StoreResult<Vec<Flight>> {
        let sql = format!(
            r#"
            SELECT {} FROM flights
            WHERE departure_airport = $1
                AND arrival_airport = $2
                AND departure_time >= $3
                AND ($4::TEXT IS NULL OR class_type = $4)
            ORDER BY departure_time
            "#,
            FLIGHT_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(&query.origin)
            .bind(&query.destination)
            .bind(query.departs_after)
            .bind(query.class_type.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn update_flight(
        &self,
        id: Uuid,
        patch: &FlightPatch,
        admin_id: Uuid,
    ) -> StoreResult<Option<Flight>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let sql = format!("SELECT {} FROM flights WHERE id = $1 FOR UPDATE", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        let mut flight = match row {
            Some(row) => Flight::from(row),
            None => return Ok(None),
        };
        patch.apply(&mut flight, admin_id);

        sqlx::query(
            r#"
            UPDATE flights SET
                airline = $2, flight_number = $3, departure_airport = $4, arrival_airport = $5,
                departure_time = $6, arrival_time = $7, duration = $8, price = $9,
                available_seats = $10, class_type = $11, edited_by_admin = $12
            WHERE id = $1
            "#,
        )
        .bind(flight.id)
        .bind(&flight.airline)
        .bind(&flight.flight_number)
        .bind(&flight.departure_airport)
        .bind(&flight.arrival_airport)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(&flight.duration)
        .bind(flight.price)
        .bind(flight.available_seats)
        .bind(&flight.class_type)
        .bind(flight.edited_by_admin)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(flight))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email, bookings FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| User { id: r.id, name: r.name, email: r.email, bookings: r.bookings }))
    }

    async fn find_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, permissions, managed_flights FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Admin::from))
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn find_booking_by_order(&self, order_id: &str) -> StoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE order_id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn transition_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let sql = format!(
            "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }
}

/// A Postgres transaction. Rolled back by sqlx on drop unless committed.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, flight_id, user_id, seat_number, booking_date, status, receipt, order_id, amount, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(booking.flight)
        .bind(booking.user)
        .bind(&booking.seat_number)
        .bind(booking.booking_date)
        .bind(booking.status.as_str())
        .bind(&booking.receipt)
        .bind(&booking.order_id)
        .bind(booking.amount)
        .bind(&booking.currency)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| insert_err(e, BOOKING_REFERENCES))?;
        Ok(())
    }

    async fn delete_booking(&mut self, id: Uuid) -> StoreResult<Option<Booking>> {
        let sql = format!("DELETE FROM bookings WHERE id = $1 RETURNING {}", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn push_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE flights SET bookings = array_append(bookings, $2) WHERE id = $1")
            .bind(flight_id)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        expect_row(result.rows_affected(), "Flight")
    }

    async fn pull_flight_booking(&mut self, flight_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE flights SET bookings = array_remove(bookings, $2) WHERE id = $1")
            .bind(flight_id)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn push_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET bookings = array_append(bookings, $2) WHERE id = $1")
            .bind(user_id)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        expect_row(result.rows_affected(), "User")
    }

    async fn pull_user_booking(&mut self, user_id: Uuid, booking_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET bookings = array_remove(bookings, $2) WHERE id = $1")
            .bind(user_id)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn insert_flight(&mut self, flight: &Flight) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, airline, flight_number, departure_airport, arrival_airport,
                departure_time, arrival_time, duration, price, available_seats, class_type, bookings, edited_by_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(flight.id)
        .bind(&flight.airline)
        .bind(&flight.flight_number)
        .bind(&flight.departure_airport)
        .bind(&flight.arrival_airport)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(&flight.duration)
        .bind(flight.price)
        .bind(flight.available_seats)
        .bind(&flight.class_type)
        .bind(&flight.bookings)
        .bind(flight.edited_by_admin)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| insert_err(e, FLIGHT_REFERENCES))?;
        Ok(())
    }

    async fn delete_flight(&mut self, id: Uuid) -> StoreResult<Option<Flight>> {
        let sql = format!("DELETE FROM flights WHERE id = $1 RETURNING {}", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(row.map(Flight::from))
    }

    async fn push_admin_flight(&mut self, admin_id: Uuid, flight_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE admins SET managed_flights = array_append(managed_flights, $2) WHERE id = $1")
            .bind(admin_id)
            .bind(flight_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        expect_row(result.rows_affected(), "Admin")
    }

    async fn pull_admin_flight(&mut self, flight_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE admins SET managed_flights = array_remove(managed_flights, $1) WHERE $1 = ANY(managed_flights)",
        )
        .bind(flight_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(db_err)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(db_err)
    }
}
