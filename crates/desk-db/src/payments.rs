use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use desk_schemas::{Money, PaymentMethod, PaymentRecordStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use crate::is_unique_constraint_violation;

/// Payment rows are append-only. The one permitted mutation is a gateway
/// payment leaving `pending`.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub gateway_order_id: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRow {
    pub payment_id: i64,
    pub booking_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: i64,
    pub created_at_utc: DateTime<Utc>,
    pub settled_at_utc: Option<DateTime<Utc>>,
}

const PAYMENT_COLUMNS: &str = r#"
    payment_id, booking_id, amount_minor, method, status, gateway_order_id,
    gateway_payment_id, notes, recorded_by, created_at_utc, settled_at_utc
"#;

fn payment_from_row(row: &PgRow) -> Result<PaymentRow> {
    Ok(PaymentRow {
        payment_id: row.try_get("payment_id")?,
        booking_id: row.try_get("booking_id")?,
        amount: Money::from_minor(row.try_get("amount_minor")?),
        method: PaymentMethod::parse(&row.try_get::<String, _>("method")?)?,
        status: PaymentRecordStatus::parse(&row.try_get::<String, _>("status")?)?,
        gateway_order_id: row.try_get("gateway_order_id")?,
        gateway_payment_id: row.try_get("gateway_payment_id")?,
        notes: row.try_get("notes")?,
        recorded_by: row.try_get("recorded_by")?,
        created_at_utc: row.try_get("created_at_utc")?,
        settled_at_utc: row.try_get("settled_at_utc")?,
    })
}

/// Insert a payment inside the caller's transaction. Returns the payment id.
/// Completed payments get `settled_at_utc = now()`.
pub async fn insert_payment(conn: &mut PgConnection, p: &NewPayment) -> Result<i64> {
    let res = sqlx::query_as::<_, (i64,)>(
        r#"
        insert into payments (
          booking_id, amount_minor, method, status, gateway_order_id, notes,
          recorded_by, settled_at_utc
        ) values (
          $1, $2, $3, $4, $5, $6, $7,
          case when $4::text = 'completed' then now() else null end
        )
        returning payment_id
        "#,
    )
    .bind(p.booking_id)
    .bind(p.amount.minor())
    .bind(p.method.as_str())
    .bind(p.status.as_str())
    .bind(&p.gateway_order_id)
    .bind(&p.notes)
    .bind(p.recorded_by)
    .fetch_one(&mut *conn)
    .await;

    match res {
        Ok((payment_id,)) => Ok(payment_id),
        Err(e) => {
            if is_unique_constraint_violation(&e, "uq_payments_gateway_order") {
                return Err(anyhow!("gateway order id already recorded"));
            }
            Err(anyhow::Error::new(e).context("insert_payment failed"))
        }
    }
}

/// Lock the payment for a gateway order (`FOR UPDATE`). `None` when unknown.
pub async fn lock_payment_by_order_id(
    conn: &mut PgConnection,
    gateway_order_id: &str,
) -> Result<Option<PaymentRow>> {
    let sql = format!(
        "select {PAYMENT_COLUMNS} from payments where gateway_order_id = $1 for update"
    );
    let row = sqlx::query(&sql)
        .bind(gateway_order_id)
        .fetch_optional(&mut *conn)
        .await
        .context("lock_payment_by_order_id failed")?;
    row.as_ref().map(payment_from_row).transpose()
}

/// `pending -> completed`. The `status = 'pending'` guard makes a second
/// transition a no-op that the caller sees as zero rows.
pub async fn mark_payment_completed(
    conn: &mut PgConnection,
    payment_id: i64,
    gateway_payment_id: &str,
    signature: &str,
) -> Result<()> {
    let res = sqlx::query(
        r#"
        update payments
        set status = 'completed',
            gateway_payment_id = $2,
            gateway_signature = $3,
            settled_at_utc = now()
        where payment_id = $1 and status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(gateway_payment_id)
    .bind(signature)
    .execute(&mut *conn)
    .await
    .context("mark_payment_completed failed")?;

    if res.rows_affected() != 1 {
        return Err(anyhow!(
            "mark_payment_completed: payment {} is not pending",
            payment_id
        ));
    }
    Ok(())
}

/// `pending -> failed`. The submitted gateway payment id is kept for
/// investigation; the signature is not.
pub async fn mark_payment_failed(
    conn: &mut PgConnection,
    payment_id: i64,
    gateway_payment_id: &str,
) -> Result<()> {
    let res = sqlx::query(
        r#"
        update payments
        set status = 'failed',
            gateway_payment_id = $2,
            settled_at_utc = now()
        where payment_id = $1 and status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(gateway_payment_id)
    .execute(&mut *conn)
    .await
    .context("mark_payment_failed failed")?;

    if res.rows_affected() != 1 {
        return Err(anyhow!(
            "mark_payment_failed: payment {} is not pending",
            payment_id
        ));
    }
    Ok(())
}

/// Amounts of completed payments, oldest first.
pub async fn completed_payment_amounts(pool: &PgPool, booking_id: i64) -> Result<Vec<Money>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        select amount_minor
        from payments
        where booking_id = $1 and status = 'completed'
        order by payment_id asc
        "#,
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await
    .context("completed_payment_amounts failed")?;

    Ok(rows.into_iter().map(|(m,)| Money::from_minor(m)).collect())
}

/// Every payment for the booking, oldest first.
pub async fn list_payments(pool: &PgPool, booking_id: i64) -> Result<Vec<PaymentRow>> {
    let sql = format!(
        "select {PAYMENT_COLUMNS} from payments where booking_id = $1 order by payment_id asc"
    );
    let rows = sqlx::query(&sql)
        .bind(booking_id)
        .fetch_all(pool)
        .await
        .context("list_payments failed")?;
    rows.iter().map(payment_from_row).collect()
}
