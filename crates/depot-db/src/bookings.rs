//! Booking header persistence.
//!
//! One row per booking, upserted on every header mutation. The status log
//! is stored as a JSONB array in append order.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use depot_core::{ActorId, DraftId, RefCode, SiteId, Timestamp};
use depot_state::{BookingHeader, BookingStatus, BookingType, MovementObjective};

/// Save a booking header to the database (upsert on `draft_id`).
pub async fn save(pool: &PgPool, header: &BookingHeader) -> Result<(), sqlx::Error> {
    let status_log = serde_json::to_value(&header.status_log)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize status_log: {e}")))?;

    sqlx::query(
        "INSERT INTO booking_headers (draft_id, booking_type, objective, status, ref_code, origin, destination, remark, created_by, created_at, updated_by, updated_at, status_log)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (draft_id) DO UPDATE SET
            booking_type = EXCLUDED.booking_type,
            objective = EXCLUDED.objective,
            status = EXCLUDED.status,
            ref_code = EXCLUDED.ref_code,
            origin = EXCLUDED.origin,
            destination = EXCLUDED.destination,
            remark = EXCLUDED.remark,
            updated_by = EXCLUDED.updated_by,
            updated_at = EXCLUDED.updated_at,
            status_log = EXCLUDED.status_log",
    )
    .bind(header.draft_id.as_str())
    .bind(header.booking_type.as_str())
    .bind(header.objective.as_str())
    .bind(header.status.as_str())
    .bind(header.ref_code.as_ref().map(RefCode::as_str))
    .bind(header.origin.as_ref().map(SiteId::as_str))
    .bind(header.destination.as_ref().map(SiteId::as_str))
    .bind(header.remark.as_deref())
    .bind(header.created_by.as_str())
    .bind(header.created_at.as_datetime())
    .bind(header.updated_by.as_str())
    .bind(header.updated_at.as_datetime())
    .bind(&status_log)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all booking headers from the database for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<BookingHeader>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BookingHeaderRow>(
        "SELECT draft_id, booking_type, objective, status, ref_code, origin, destination, remark, created_by, created_at, updated_by, updated_at, status_log
         FROM booking_headers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(BookingHeaderRow::into_header).collect()
}

// ─── Row types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct BookingHeaderRow {
    draft_id: String,
    booking_type: String,
    objective: String,
    status: String,
    ref_code: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    remark: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_by: String,
    updated_at: DateTime<Utc>,
    status_log: serde_json::Value,
}

impl BookingHeaderRow {
    fn into_header(self) -> Result<BookingHeader, sqlx::Error> {
        let draft_id = DraftId::new(self.draft_id.as_str())
            .map_err(|e| corrupt("draft_id", &self.draft_id, e))?;
        let key = draft_id.as_str().to_string();

        let status_log = serde_json::from_value(self.status_log)
            .map_err(|e| corrupt("status_log", &key, e))?;
        let ref_code = self
            .ref_code
            .map(|s| RefCode::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("ref_code", &key, e))?;
        let origin = self
            .origin
            .map(|s| SiteId::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("origin", &key, e))?;
        let destination = self
            .destination
            .map(|s| SiteId::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("destination", &key, e))?;
        let created_by = ActorId::new(self.created_by.as_str())
            .map_err(|e| corrupt("created_by", &key, e))?;
        let updated_by = ActorId::new(self.updated_by.as_str())
            .map_err(|e| corrupt("updated_by", &key, e))?;

        Ok(BookingHeader {
            draft_id,
            booking_type: parse_booking_type(&self.booking_type),
            objective: parse_objective(&self.objective),
            status: parse_status(&self.status),
            ref_code,
            origin,
            destination,
            remark: self.remark,
            created_by,
            created_at: Timestamp::from_utc(self.created_at),
            updated_by,
            updated_at: Timestamp::from_utc(self.updated_at),
            status_log,
        })
    }
}

fn corrupt(column: &str, key: &str, err: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Protocol(format!("corrupt {column} in booking header {key}: {err}"))
}

// ─── Parsing helpers ─────────────────────────────────────────────────

pub(crate) fn parse_booking_type(s: &str) -> BookingType {
    match s {
        "INBOUND" => BookingType::Inbound,
        "OUTBOUND" => BookingType::Outbound,
        "DEFECT_REQUEST" => BookingType::DefectRequest,
        "REPAIR_RETURN" => BookingType::RepairReturn,
        other => {
            tracing::warn!(
                value = other,
                "unrecognized booking type in database, defaulting to INBOUND"
            );
            BookingType::Inbound
        }
    }
}

fn parse_objective(s: &str) -> MovementObjective {
    match s {
        "STANDARD" => MovementObjective::Standard,
        "REPAIR_DISPATCH" => MovementObjective::RepairDispatch,
        other => {
            tracing::warn!(
                value = other,
                "unrecognized movement objective in database, defaulting to STANDARD"
            );
            MovementObjective::Standard
        }
    }
}

fn parse_status(s: &str) -> BookingStatus {
    match s {
        "INITIAL" => BookingStatus::Initial,
        "CONFIRMED" => BookingStatus::Confirmed,
        "FINALIZED" => BookingStatus::Finalized,
        "UNLOCKED_FOR_EDIT" => BookingStatus::UnlockedForEdit,
        "COMPLETED" => BookingStatus::Completed,
        "CANCELLED" => BookingStatus::Cancelled,
        other => {
            tracing::warn!(
                value = other,
                "unrecognized booking status in database, defaulting to INITIAL"
            );
            BookingStatus::Initial
        }
    }
}
