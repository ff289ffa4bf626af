//! # Movement Ledger
//!
//! Append-only audit rows recording what actually happened to each asset:
//! one `MOVED` row per asset at finalize, one `CONFIRMED` row per asset at
//! completion, one `RETURNED` row per asset taken back out of a draft.
//! Rows are never updated in place except for the routing refresh that
//! keeps `MOVED` rows consistent when a re-finalize patches the header
//! routing, and that refresh re-stamps the row digest.
//!
//! Each row carries a SHA-256 digest over its canonical JSON form, so a
//! hydrated ledger can be checked for out-of-band edits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use depot_core::{
    sha256_hex, ActorId, AssetCode, CanonicalBytes, DraftId, MovementResult, RefCode, ScanId,
    SiteId, Timestamp,
};

use crate::asset::{AssetRecord, AssetStatus};
use crate::booking::BookingType;

// ─── Entry Identity ──────────────────────────────────────────────────

/// Unique identifier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerEntryId(Uuid);

impl LedgerEntryId {
    /// Mint a new random entry id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (hydration path).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LedgerEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Ledger Action ───────────────────────────────────────────────────

/// What a ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAction {
    /// Asset snapshot written at finalize; status is the reserved status.
    Moved,
    /// Movement executed at completion; status is the steady status.
    Confirmed,
    /// Asset taken back out of the draft; status is the restored one.
    Returned,
}

impl LedgerAction {
    /// The canonical string name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moved => "MOVED",
            Self::Confirmed => "CONFIRMED",
            Self::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Ledger Entry ────────────────────────────────────────────────────

/// One audit row. All asset-side fields are snapshots taken at recording
/// time; later changes to the asset row do not flow back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique row identifier.
    pub entry_id: LedgerEntryId,
    /// Reference code of the booking.
    pub ref_code: RefCode,
    /// Draft the row belongs to.
    pub draft_id: DraftId,
    /// Workflow of the booking.
    pub booking_type: BookingType,
    /// What happened.
    pub action: LedgerAction,
    /// The asset involved.
    pub asset_code: AssetCode,
    /// Asset status the action recorded.
    pub asset_status: AssetStatus,
    /// Origin site at recording time.
    pub origin: Option<SiteId>,
    /// Destination site at recording time.
    pub destination: Option<SiteId>,
    /// Scan that attached the asset. Rows hydrated from older stores may
    /// lack it.
    pub scan_id: Option<ScanId>,
    /// Operator who performed the scan.
    pub scan_by: Option<ActorId>,
    /// When the scan happened.
    pub scan_at: Option<Timestamp>,
    /// Operator who triggered the recording operation.
    pub recorded_by: ActorId,
    /// When the row was recorded.
    pub recorded_at: Timestamp,
    /// SHA-256 over the canonical JSON form of all other fields.
    pub row_digest: String,
}

/// Digest input: every field except the digest itself. Canonical JSON
/// sorts the keys, so field order here is immaterial.
#[derive(Serialize)]
struct DigestInput<'a> {
    entry_id: &'a LedgerEntryId,
    ref_code: &'a RefCode,
    draft_id: &'a DraftId,
    booking_type: BookingType,
    action: LedgerAction,
    asset_code: &'a AssetCode,
    asset_status: AssetStatus,
    origin: &'a Option<SiteId>,
    destination: &'a Option<SiteId>,
    scan_id: &'a Option<ScanId>,
    scan_by: &'a Option<ActorId>,
    scan_at: &'a Option<Timestamp>,
    recorded_by: &'a ActorId,
    recorded_at: &'a Timestamp,
}

impl LedgerEntry {
    /// Snapshot `asset` into a new, digest-stamped row.
    ///
    /// `asset_status` is passed explicitly because the recorded status is
    /// not always the asset's current one: `CONFIRMED` rows carry the
    /// steady status the asset is about to settle into.
    #[allow(clippy::too_many_arguments)]
    pub fn capture(
        action: LedgerAction,
        ref_code: &RefCode,
        draft_id: &DraftId,
        booking_type: BookingType,
        asset: &AssetRecord,
        asset_status: AssetStatus,
        recorded_by: &ActorId,
        recorded_at: Timestamp,
    ) -> MovementResult<Self> {
        let mut entry = Self {
            entry_id: LedgerEntryId::new(),
            ref_code: ref_code.clone(),
            draft_id: draft_id.clone(),
            booking_type,
            action,
            asset_code: asset.asset_code.clone(),
            asset_status,
            origin: asset.origin.clone(),
            destination: asset.destination.clone(),
            scan_id: asset.scan_id,
            scan_by: asset.scan_by.clone(),
            scan_at: asset.scan_at,
            recorded_by: recorded_by.clone(),
            recorded_at,
            row_digest: String::new(),
        };
        entry.stamp_digest()?;
        Ok(entry)
    }

    /// Compute the digest over the current field values.
    pub fn compute_digest(&self) -> MovementResult<String> {
        let input = DigestInput {
            entry_id: &self.entry_id,
            ref_code: &self.ref_code,
            draft_id: &self.draft_id,
            booking_type: self.booking_type,
            action: self.action,
            asset_code: &self.asset_code,
            asset_status: self.asset_status,
            origin: &self.origin,
            destination: &self.destination,
            scan_id: &self.scan_id,
            scan_by: &self.scan_by,
            scan_at: &self.scan_at,
            recorded_by: &self.recorded_by,
            recorded_at: &self.recorded_at,
        };
        Ok(sha256_hex(&CanonicalBytes::new(&input)?))
    }

    /// Recompute and store the digest.
    pub fn stamp_digest(&mut self) -> MovementResult<()> {
        self.row_digest = self.compute_digest()?;
        Ok(())
    }

    /// Whether the stored digest matches the current field values.
    pub fn verify_digest(&self) -> MovementResult<bool> {
        Ok(self.row_digest == self.compute_digest()?)
    }

    /// Whether this row records the scan currently stamped on `asset`.
    ///
    /// Matches on scan id when both sides carry one. Rows or assets
    /// hydrated from stores that predate scan ids fall back to the
    /// operator-and-time pair. An asset with no scan stamp matches
    /// nothing.
    pub fn matches_scan(&self, asset: &AssetRecord) -> bool {
        match (self.scan_id, asset.scan_id) {
            (Some(entry_scan), Some(asset_scan)) => entry_scan == asset_scan,
            _ => match (&self.scan_by, self.scan_at, &asset.scan_by, asset.scan_at) {
                (Some(by), Some(at), Some(asset_by), Some(asset_at)) => {
                    by == asset_by && at == asset_at
                }
                _ => false,
            },
        }
    }

    /// Overwrite the routing snapshot and re-stamp the digest. Applied to
    /// `MOVED` rows when a re-finalize patches the header routing.
    pub fn refresh_routing(
        &mut self,
        origin: Option<SiteId>,
        destination: Option<SiteId>,
    ) -> MovementResult<()> {
        if let Some(origin) = origin {
            self.origin = Some(origin);
        }
        if let Some(destination) = destination {
            self.destination = Some(destination);
        }
        self.stamp_digest()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
