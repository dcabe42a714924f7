use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use stagepass_core::{BookingError, BookingRepository, BookingResult};
use stagepass_shared::{BookingRecord, Event};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// SQLite-backed booking history.
///
/// Statements run directly against the pool, so each call checks out one
/// connection for its single statement and hands it back before returning.
/// Nothing spans calls and there are no cross-call transactions.
#[derive(Clone)]
pub struct BookingStore {
    pool: Pool<Sqlite>,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    event_name: Option<String>,
    event_date: Option<String>,
    event_time: Option<String>,
    venue: Option<String>,
    price: Option<f64>,
    booking_time: Option<String>,
}

impl From<BookingRow> for BookingRecord {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            event_name: row.event_name.unwrap_or_default(),
            date: row.event_date.unwrap_or_default(),
            time: row.event_time.unwrap_or_default(),
            venue: row.venue.unwrap_or_default(),
            price: row.price.unwrap_or_default(),
            booking_time: row.booking_time.unwrap_or_default(),
        }
    }
}

impl BookingStore {
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. Pinned to a single long-lived connection,
    /// since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl BookingRepository for BookingStore {
    async fn save(&self, event: &Event, booking_time: &str) -> BookingResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (event_name, event_date, event_time, venue, price, booking_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.name)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.venue)
        .bind(event.price)
        .bind(booking_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save booking for {}: {}", event.name, e);
            BookingError::LocalWriteFailure(e.to_string())
        })?;

        let id = result.last_insert_rowid();
        debug!("Booking {} saved locally at {}", id, booking_time);
        Ok(id)
    }

    async fn list_all(&self) -> BookingResult<Vec<BookingRecord>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, event_name, event_date, event_time, venue, price, booking_time
            FROM bookings
            ORDER BY booking_time DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingError::LocalReadFailure(e.to_string()))?;

        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }

    async fn clear_all(&self) -> BookingResult<()> {
        let result = sqlx::query("DELETE FROM bookings")
            .execute(&self.pool)
            .await
            .map_err(|e| BookingError::LocalWriteFailure(e.to_string()))?;

        info!("Cleared {} bookings", result.rows_affected());
        Ok(())
    }
}
