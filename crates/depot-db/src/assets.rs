//! Asset registry persistence.
//!
//! One row per physical asset, upserted on every registry mutation.
//! Attachment columns and the prior-state snapshot are stored as written;
//! hydration does not reconstruct anything the row never carried.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use depot_core::{ActorId, AssetCode, DraftId, RefCode, ScanId, SiteId, Timestamp};
use depot_state::{AssetRecord, AssetStatus};

/// Save an asset record to the database (upsert on `asset_code`).
pub async fn save(pool: &PgPool, asset: &AssetRecord) -> Result<(), sqlx::Error> {
    let prior = asset
        .prior
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize prior state: {e}")))?;

    sqlx::query(
        "INSERT INTO assets (asset_code, status, prior, draft_id, ref_code, scan_id, scan_by, scan_at, origin, destination, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (asset_code) DO UPDATE SET
            status = EXCLUDED.status,
            prior = EXCLUDED.prior,
            draft_id = EXCLUDED.draft_id,
            ref_code = EXCLUDED.ref_code,
            scan_id = EXCLUDED.scan_id,
            scan_by = EXCLUDED.scan_by,
            scan_at = EXCLUDED.scan_at,
            origin = EXCLUDED.origin,
            destination = EXCLUDED.destination,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(asset.asset_code.as_str())
    .bind(asset.status.as_str())
    .bind(&prior)
    .bind(asset.draft_id.as_ref().map(DraftId::as_str))
    .bind(asset.ref_code.as_ref().map(RefCode::as_str))
    .bind(asset.scan_id.as_ref().map(ScanId::as_uuid))
    .bind(asset.scan_by.as_ref().map(ActorId::as_str))
    .bind(asset.scan_at.as_ref().map(Timestamp::as_datetime))
    .bind(asset.origin.as_ref().map(SiteId::as_str))
    .bind(asset.destination.as_ref().map(SiteId::as_str))
    .bind(asset.updated_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all asset records from the database for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AssetRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AssetRow>(
        "SELECT asset_code, status, prior, draft_id, ref_code, scan_id, scan_by, scan_at, origin, destination, updated_at
         FROM assets ORDER BY asset_code",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AssetRow::into_record).collect()
}

// ─── Row types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct AssetRow {
    asset_code: String,
    status: String,
    prior: Option<serde_json::Value>,
    draft_id: Option<String>,
    ref_code: Option<String>,
    scan_id: Option<Uuid>,
    scan_by: Option<String>,
    scan_at: Option<DateTime<Utc>>,
    origin: Option<String>,
    destination: Option<String>,
    updated_at: DateTime<Utc>,
}

impl AssetRow {
    fn into_record(self) -> Result<AssetRecord, sqlx::Error> {
        let asset_code = AssetCode::new(self.asset_code.as_str())
            .map_err(|e| corrupt("asset_code", &self.asset_code, e))?;
        let key = asset_code.as_str().to_string();

        let prior = self
            .prior
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt("prior", &key, e))?;
        let draft_id = self
            .draft_id
            .map(|s| DraftId::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("draft_id", &key, e))?;
        let ref_code = self
            .ref_code
            .map(|s| RefCode::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("ref_code", &key, e))?;
        let scan_by = self
            .scan_by
            .map(|s| ActorId::new(s.as_str()))
            .transpose()
            .map_err(|e| corrupt("scan_by", &key, e))?;
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

        Ok(AssetRecord {
            asset_code,
            status: parse_asset_status(&self.status),
            prior,
            draft_id,
            ref_code,
            scan_id: self.scan_id.map(ScanId::from_uuid),
            scan_by,
            scan_at: self.scan_at.map(Timestamp::from_utc),
            origin,
            destination,
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}

fn corrupt(column: &str, key: &str, err: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Protocol(format!("corrupt {column} in asset {key}: {err}"))
}

// ─── Parsing helpers ─────────────────────────────────────────────────

pub(crate) fn parse_asset_status(s: &str) -> AssetStatus {
    match s {
        "AVAILABLE" => AssetStatus::Available,
        "ISSUED" => AssetStatus::Issued,
        "AWAITING_PICKUP" => AssetStatus::AwaitingPickup,
        "AWAITING_REPAIR" => AssetStatus::AwaitingRepair,
        "RESERVED_FOR_ISSUE" => AssetStatus::ReservedForIssue,
        "RESERVED_FOR_RETURN" => AssetStatus::ReservedForReturn,
        "RESERVED_FOR_REPAIR" => AssetStatus::ReservedForRepair,
        "RESERVED_FROM_REPAIR" => AssetStatus::ReservedFromRepair,
        other => {
            tracing::warn!(
                value = other,
                "unrecognized asset status in database, defaulting to AVAILABLE"
            );
            AssetStatus::Available
        }
    }
}
