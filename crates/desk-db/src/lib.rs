use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use desk_schemas::{BookingStatus, Money, PaymentStatus, RoomStatus};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};

mod payments;

pub use payments::{
    completed_payment_amounts, insert_payment, list_payments, lock_payment_by_order_id,
    mark_payment_completed, mark_payment_failed, NewPayment, PaymentRow,
};

pub const ENV_DB_URL: &str = "DESK_DATABASE_URL";

/// Connect to Postgres using DESK_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url, 10).await
}

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='bookings'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_bookings_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_bookings_table: bool,
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Create the room or reset its status.
pub async fn upsert_room(pool: &PgPool, room_number: &str, status: RoomStatus) -> Result<()> {
    sqlx::query(
        r#"
        insert into rooms (room_number, status)
        values ($1, $2)
        on conflict (room_number)
        do update set status = excluded.status, updated_at_utc = now()
        "#,
    )
    .bind(room_number)
    .bind(status.as_str())
    .execute(pool)
    .await
    .context("upsert_room failed")?;
    Ok(())
}

pub async fn fetch_room_status(pool: &PgPool, room_number: &str) -> Result<Option<RoomStatus>> {
    let row: Option<(String,)> =
        sqlx::query_as("select status from rooms where room_number = $1")
            .bind(room_number)
            .fetch_optional(pool)
            .await
            .context("fetch_room_status failed")?;
    row.map(|(s,)| RoomStatus::parse(&s).map_err(anyhow::Error::new))
        .transpose()
}

pub async fn update_room_status(
    conn: &mut PgConnection,
    room_number: &str,
    status: RoomStatus,
) -> Result<()> {
    let res = sqlx::query(
        r#"
        update rooms
        set status = $2, updated_at_utc = now()
        where room_number = $1
        "#,
    )
    .bind(room_number)
    .bind(status.as_str())
    .execute(&mut *conn)
    .await
    .context("update_room_status failed")?;

    if res.rows_affected() != 1 {
        return Err(anyhow!("update_room_status: room {} not found", room_number));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

/// Reservation fixture. Creating bookings belongs to the reservation flow;
/// this exists for tests and operator tooling.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_number: String,
    pub guest_name: String,
    pub total: Money,
    pub paid: Money,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRow {
    pub booking_id: i64,
    pub room_number: String,
    pub guest_name: String,
    pub total: Money,
    pub paid: Money,
    pub remaining: Money,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub updated_at_utc: DateTime<Utc>,
}

const BOOKING_COLUMNS: &str = r#"
    booking_id, room_number, guest_name, total_minor, paid_minor,
    remaining_minor, payment_status, status, updated_at_utc
"#;

fn booking_from_row(row: &PgRow) -> Result<BookingRow> {
    Ok(BookingRow {
        booking_id: row.try_get("booking_id")?,
        room_number: row.try_get("room_number")?,
        guest_name: row.try_get("guest_name")?,
        total: Money::from_minor(row.try_get("total_minor")?),
        paid: Money::from_minor(row.try_get("paid_minor")?),
        remaining: Money::from_minor(row.try_get("remaining_minor")?),
        payment_status: PaymentStatus::parse(&row.try_get::<String, _>("payment_status")?)?,
        status: BookingStatus::parse(&row.try_get::<String, _>("status")?)?,
        updated_at_utc: row.try_get("updated_at_utc")?,
    })
}

/// Insert a booking; payment status is derived from the totals. Returns the id.
pub async fn insert_booking(pool: &PgPool, b: &NewBooking) -> Result<i64> {
    let remaining = b
        .total
        .checked_sub(b.paid)
        .filter(|r| !r.is_negative())
        .ok_or_else(|| anyhow!("insert_booking: paid {} exceeds total {}", b.paid, b.total))?;
    let payment_status = if !remaining.is_positive() {
        PaymentStatus::Completed
    } else if b.paid.is_positive() {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    };

    let (booking_id,): (i64,) = sqlx::query_as(
        r#"
        insert into bookings (
          room_number, guest_name, total_minor, paid_minor, remaining_minor,
          payment_status, status
        ) values ($1, $2, $3, $4, $5, $6, $7)
        returning booking_id
        "#,
    )
    .bind(&b.room_number)
    .bind(&b.guest_name)
    .bind(b.total.minor())
    .bind(b.paid.minor())
    .bind(remaining.minor())
    .bind(payment_status.as_str())
    .bind(b.status.as_str())
    .fetch_one(pool)
    .await
    .context("insert_booking failed")?;

    Ok(booking_id)
}

/// Unlocked read. `None` when the booking does not exist.
pub async fn fetch_booking(pool: &PgPool, booking_id: i64) -> Result<Option<BookingRow>> {
    let sql = format!("select {BOOKING_COLUMNS} from bookings where booking_id = $1");
    let row = sqlx::query(&sql)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .context("fetch_booking failed")?;
    row.as_ref().map(booking_from_row).transpose()
}

/// Read the booking under a row lock (`FOR UPDATE`) held until the
/// surrounding transaction ends. Concurrent writers on the same booking
/// queue here; different bookings do not contend.
pub async fn lock_booking(conn: &mut PgConnection, booking_id: i64) -> Result<Option<BookingRow>> {
    let sql = format!("select {BOOKING_COLUMNS} from bookings where booking_id = $1 for update");
    let row = sqlx::query(&sql)
        .bind(booking_id)
        .fetch_optional(&mut *conn)
        .await
        .context("lock_booking failed")?;
    row.as_ref().map(booking_from_row).transpose()
}

pub async fn update_booking_balance(
    conn: &mut PgConnection,
    booking_id: i64,
    paid: Money,
    remaining: Money,
    payment_status: PaymentStatus,
) -> Result<()> {
    let res = sqlx::query(
        r#"
        update bookings
        set paid_minor = $2,
            remaining_minor = $3,
            payment_status = $4,
            updated_at_utc = now()
        where booking_id = $1
        "#,
    )
    .bind(booking_id)
    .bind(paid.minor())
    .bind(remaining.minor())
    .bind(payment_status.as_str())
    .execute(&mut *conn)
    .await
    .context("update_booking_balance failed")?;

    if res.rows_affected() != 1 {
        return Err(anyhow!(
            "update_booking_balance: expected 1 row, updated {}",
            res.rows_affected()
        ));
    }
    Ok(())
}

pub async fn update_booking_status(
    conn: &mut PgConnection,
    booking_id: i64,
    status: BookingStatus,
) -> Result<()> {
    let res = sqlx::query(
        r#"
        update bookings
        set status = $2, updated_at_utc = now()
        where booking_id = $1
        "#,
    )
    .bind(booking_id)
    .bind(status.as_str())
    .execute(&mut *conn)
    .await;

    match res {
        Ok(r) if r.rows_affected() == 1 => Ok(()),
        Ok(r) => Err(anyhow!(
            "update_booking_status: expected 1 row, updated {}",
            r.rows_affected()
        )),
        Err(e) => {
            if is_unique_constraint_violation(&e, "uq_bookings_active_room") {
                return Err(anyhow!("room already held by another active booking"));
            }
            Err(anyhow::Error::new(e).context("update_booking_status failed"))
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub role: String,
    pub action: String,
    pub details: Value,
}

pub async fn insert_activity(pool: &PgPool, a: &NewActivity) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        insert into activity_log (user_id, role, action, details)
        values ($1, $2, $3, $4)
        returning activity_id
        "#,
    )
    .bind(a.user_id)
    .bind(&a.role)
    .bind(&a.action)
    .bind(&a.details)
    .fetch_one(pool)
    .await
    .context("insert_activity failed")?;
    Ok(id)
}

/// Most recent activity first.
pub async fn recent_activity(pool: &PgPool, limit: i64) -> Result<Vec<(i64, String, Value)>> {
    let rows = sqlx::query(
        r#"
        select user_id, action, details
        from activity_log
        order by activity_id desc
        limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("recent_activity failed")?;

    rows.iter()
        .map(|r| -> Result<(i64, String, Value)> {
            Ok((r.try_get("user_id")?, r.try_get("action")?, r.try_get("details")?))
        })
        .collect()
}

/// Detect a Postgres unique constraint violation by name.
pub fn is_unique_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
