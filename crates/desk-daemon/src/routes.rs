//! Axum router and all HTTP handlers for desk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Payment and booking handlers authenticate first, then
//! decode the body, then call the engine; every outcome leaves as an
//! [`ApiResponse`] envelope.

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use desk_payments::{parse_amount, ErrorKind, PaymentError};
use desk_schemas::{Actor, PaymentRecordStatus};
use futures_util::{Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, warn};

use crate::{
    api_types::{
        ApiResponse, ApplyPaymentRequest, BookingStatusRequest, HealthResponse, StatusResponse,
        VerifyPaymentRequest,
    },
    state::{uptime_secs, AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/payments", post(apply_payment))
        .route("/v1/payments/verify", post(verify_payment))
        .route("/v1/bookings/:id/balance", get(booking_balance))
        .route("/v1/bookings/:id/ledger", get(booking_ledger))
        .route("/v1/bookings/:id/status", post(booking_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn ok_response<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(message, data))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error(
            "unauthorized",
            "missing or invalid bearer token",
        )),
    )
        .into_response()
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::VerificationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PolicyRefused => StatusCode::CONFLICT,
        ErrorKind::TransactionFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: PaymentError) -> Response {
    let status = status_for(err.kind());
    if err.kind() == ErrorKind::TransactionFailed {
        // The cause chain goes to the log only.
        error!(error = ?err, "request failed");
    } else {
        info!(kind = err.kind().as_str(), message = err.message(), "request refused");
    }
    (
        status,
        Json(ApiResponse::error(err.kind().as_str(), err.message())),
    )
        .into_response()
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, PaymentError> {
    serde_json::from_slice(body)
        .map_err(|e| PaymentError::invalid_argument(format!("invalid request body: {e}")))
}

fn booking_id_from_path(raw: &str) -> Result<i64, PaymentError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(PaymentError::invalid_argument(
            "booking id must be a positive integer",
        )),
    }
}

fn authenticate(st: &AppState, headers: &HeaderMap) -> Option<Actor> {
    let actor = st.auth.authenticate(headers);
    if actor.is_none() {
        warn!("rejected request without a valid bearer token");
    }
    actor
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (db_ok, db_schema_ready) = match desk_db::status(st.engine.pool()).await {
        Ok(s) => (s.ok, s.has_bookings_table),
        Err(err) => {
            warn!(error = ?err, "status: database unreachable");
            (false, false)
        }
    };

    (
        StatusCode::OK,
        Json(StatusResponse {
            service: st.build.service,
            version: st.build.version,
            uptime_secs: uptime_secs(),
            db_ok,
            db_schema_ready,
            gateway: st.engine.gateway_name(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/payments
// ---------------------------------------------------------------------------

pub(crate) async fn apply_payment(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(actor) = authenticate(&st, &headers) else {
        return unauthorized();
    };
    let req: ApplyPaymentRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };
    let amount = match parse_amount(&req.amount) {
        Ok(a) => a,
        Err(e) => return error_response(e),
    };

    let res = match st
        .engine
        .apply_payment(
            &actor,
            req.booking_id,
            amount,
            &req.payment_method,
            req.notes.as_deref(),
        )
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    st.publish(BusMsg::PaymentApplied {
        booking_id: res.booking_id,
        payment_id: res.payment_id,
        amount: res.amount,
        payment_method: res.payment_method.as_str().to_string(),
        record_status: res.record_status.as_str().to_string(),
        payment_status: res.payment_status.as_str().to_string(),
        remaining_amount: res.remaining_amount,
    });

    let message = if res.record_status == PaymentRecordStatus::Pending {
        format!(
            "Gateway order created for {}; awaiting verification",
            res.amount
        )
    } else {
        format!(
            "Payment of {} applied; remaining balance {}",
            res.amount, res.remaining_amount
        )
    };
    ok_response(message, res)
}

// ---------------------------------------------------------------------------
// POST /v1/payments/verify
// ---------------------------------------------------------------------------

pub(crate) async fn verify_payment(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(actor) = authenticate(&st, &headers) else {
        return unauthorized();
    };
    let req: VerifyPaymentRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    let res = match st
        .engine
        .verify_gateway_payment(
            &actor,
            &req.gateway_payment_id,
            &req.gateway_order_id,
            &req.signature,
        )
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    if res.already_verified {
        return ok_response("Payment already verified", res);
    }

    st.publish(BusMsg::PaymentVerified {
        booking_id: res.booking_id,
        payment_id: res.payment_id,
        amount: res.amount,
        payment_status: res.payment_status.as_str().to_string(),
        remaining_amount: res.remaining_amount,
    });
    if let Some(excess) = res.overpaid_by {
        st.publish(BusMsg::LogLine {
            level: "WARN".to_string(),
            msg: format!(
                "booking {} overpaid by {} through a late gateway verification",
                res.booking_id, excess
            ),
        });
    }

    let message = format!(
        "Payment verified; remaining balance {}",
        res.remaining_amount
    );
    ok_response(message, res)
}

// ---------------------------------------------------------------------------
// GET /v1/bookings/:id/balance
// ---------------------------------------------------------------------------

pub(crate) async fn booking_balance(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if authenticate(&st, &headers).is_none() {
        return unauthorized();
    }
    let booking_id = match booking_id_from_path(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match st.engine.balance(booking_id).await {
        Ok(view) => ok_response("Booking balance", view),
        Err(e) => error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/bookings/:id/ledger
// ---------------------------------------------------------------------------

pub(crate) async fn booking_ledger(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if authenticate(&st, &headers).is_none() {
        return unauthorized();
    }
    let booking_id = match booking_id_from_path(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match st.engine.ledger_report(booking_id).await {
        Ok(report) if report.is_clean() => ok_response("Ledger consistent", report),
        Ok(report) => ok_response("Ledger drift detected", report),
        Err(e) => error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/bookings/:id/status
// ---------------------------------------------------------------------------

pub(crate) async fn booking_status(
    State(st): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(actor) = authenticate(&st, &headers) else {
        return unauthorized();
    };
    let booking_id = match booking_id_from_path(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    let req: BookingStatusRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    let tr = match st
        .engine
        .transition_booking(&actor, booking_id, &req.status, st.balance_policy)
        .await
    {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    st.publish(BusMsg::BookingStatus {
        booking_id: tr.booking_id,
        from: tr.from.as_str().to_string(),
        to: tr.to.as_str().to_string(),
        room_number: tr.room_number.clone(),
    });

    let message = format!("Booking {} is now {}", tr.booking_id, tr.to.as_str());
    ok_response(message, tr)
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    // Events carry amounts; same token as the rest of the API.
    if authenticate(&st, &headers).is_none() {
        return unauthorized();
    }

    let rx = st.bus.subscribe();

    let mut out = HeaderMap::new();
    out.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    out.insert("Connection", HeaderValue::from_static("keep-alive"));

    let events = broadcast_to_sse(rx);

    (out, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(m.event_name()).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(status_for(ErrorKind::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::VerificationFailed), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::PolicyRefused), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::TransactionFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn path_ids_must_be_positive_integers() {
        assert_eq!(booking_id_from_path("42").unwrap(), 42);
        for bad in ["0", "-3", "abc", "4.5", ""] {
            let e = booking_id_from_path(bad).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
    }
}
