//! Movement ledger persistence.
//!
//! Ledger rows are append-only. The single exception is the routing refresh
//! a re-finalize may apply to an already-recorded `MOVED` row, so the upsert
//! updates only the routing columns and the re-stamped digest.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use depot_core::{ActorId, AssetCode, DraftId, RefCode, ScanId, SiteId, Timestamp};
use depot_state::{LedgerAction, LedgerEntry, LedgerEntryId};

use crate::assets::parse_asset_status;
use crate::bookings::parse_booking_type;

/// Save a ledger entry to the database (insert, or routing refresh on
/// conflict).
pub async fn save(pool: &PgPool, entry: &LedgerEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ledger_entries (entry_id, ref_code, draft_id, booking_type, action, asset_code, asset_status, origin, destination, scan_id, scan_by, scan_at, recorded_by, recorded_at, row_digest)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         ON CONFLICT (entry_id) DO UPDATE SET
            origin = EXCLUDED.origin,
            destination = EXCLUDED.destination,
            row_digest = EXCLUDED.row_digest",
    )
    .bind(entry.entry_id.as_uuid())
    .bind(entry.ref_code.as_str())
    .bind(entry.draft_id.as_str())
    .bind(entry.booking_type.as_str())
    .bind(entry.action.as_str())
    .bind(entry.asset_code.as_str())
    .bind(entry.asset_status.as_str())
    .bind(entry.origin.as_ref().map(SiteId::as_str))
    .bind(entry.destination.as_ref().map(SiteId::as_str))
    .bind(entry.scan_id.as_ref().map(ScanId::as_uuid))
    .bind(entry.scan_by.as_ref().map(ActorId::as_str))
    .bind(entry.scan_at.as_ref().map(Timestamp::as_datetime))
    .bind(entry.recorded_by.as_str())
    .bind(entry.recorded_at.as_datetime())
    .bind(&entry.row_digest)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the full ledger in append order for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LedgerRow>(
        "SELECT entry_id, ref_code, draft_id, booking_type, action, asset_code, asset_status, origin, destination, scan_id, scan_by, scan_at, recorded_by, recorded_at, row_digest
         FROM ledger_entries ORDER BY seq",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LedgerRow::into_entry).collect()
}

// ─── Row types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct LedgerRow {
    entry_id: Uuid,
    ref_code: String,
    draft_id: String,
    booking_type: String,
    action: String,
    asset_code: String,
    asset_status: String,
    origin: Option<String>,
    destination: Option<String>,
    scan_id: Option<Uuid>,
    scan_by: Option<String>,
    scan_at: Option<DateTime<Utc>>,
    recorded_by: String,
    recorded_at: DateTime<Utc>,
    row_digest: String,
}

impl LedgerRow {
    fn into_entry(self) -> Result<LedgerEntry, sqlx::Error> {
        let key = self.entry_id.to_string();

        let ref_code = RefCode::new(self.ref_code.as_str())
            .map_err(|e| corrupt("ref_code", &key, e))?;
        let draft_id = DraftId::new(self.draft_id.as_str())
            .map_err(|e| corrupt("draft_id", &key, e))?;
        let asset_code = AssetCode::new(self.asset_code.as_str())
            .map_err(|e| corrupt("asset_code", &key, e))?;
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
        let scan_by = self
            .scan_by
            .map(|s| ActorId::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("scan_by", &key, e))?;
        let recorded_by = ActorId::new(self.recorded_by.as_str())
            .map_err(|e| corrupt("recorded_by", &key, e))?;

        Ok(LedgerEntry {
            entry_id: LedgerEntryId::from_uuid(self.entry_id),
            ref_code,
            draft_id,
            booking_type: parse_booking_type(&self.booking_type),
            action: parse_action(&self.action),
            asset_code,
            asset_status: parse_asset_status(&self.asset_status),
            origin,
            destination,
            scan_id: self.scan_id.map(ScanId::from_uuid),
            scan_by,
            scan_at: self.scan_at.map(Timestamp::from_utc),
            recorded_by,
            recorded_at: Timestamp::from_utc(self.recorded_at),
            row_digest: self.row_digest,
        })
    }
}

fn corrupt(column: &str, key: &str, err: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Protocol(format!("corrupt {column} in ledger entry {key}: {err}"))
}

// ─── Parsing helpers ─────────────────────────────────────────────────

fn parse_action(s: &str) -> LedgerAction {
    match s {
        "MOVED" => LedgerAction::Moved,
        "CONFIRMED" => LedgerAction::Confirmed,
        "RETURNED" => LedgerAction::Returned,
        other => {
            tracing::warn!(
                value = other,
                "unrecognized ledger action in database, defaulting to MOVED"
            );
            LedgerAction::Moved
        }
    }
}
