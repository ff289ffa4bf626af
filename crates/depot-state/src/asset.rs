//! # Asset Registry Rows
//!
//! Defines [`AssetStatus`] and [`AssetRecord`], the registry's view of one
//! physical asset. The registry is the single source of truth for whether an
//! asset is currently booked: attachment is a set of columns on the asset
//! row itself, so an asset can be attached to at most one open booking by
//! construction.
//!
//! ## Statuses
//!
//! ```text
//!          settled                          reserved (attached to a draft)
//!   ┌──────────────────────┐        ┌────────────────────────────────────┐
//!   │ AVAILABLE            │        │ RESERVED_FOR_ISSUE    (outbound)   │
//!   │ ISSUED               │ scan   │ RESERVED_FOR_RETURN   (inbound)    │
//!   │ AWAITING_PICKUP      │ ─────▶ │ RESERVED_FOR_REPAIR   (defect)     │
//!   │ AWAITING_REPAIR      │        │ RESERVED_FROM_REPAIR  (repair ret) │
//!   └──────────────────────┘ ◀───── └────────────────────────────────────┘
//!              ▲              return                    │
//!              └────────────────────────────────────────┘
//!                        confirm (to the steady status)
//! ```
//!
//! A scan moves the asset into the movement type's reserved status and
//! records where it came from; confirm settles it into the steady status;
//! return restores exactly what the scan found.

use serde::{Deserialize, Serialize};

use depot_core::{ActorId, AssetCode, DraftId, RefCode, ScanId, SiteId, Timestamp};

// ─── Asset Status ────────────────────────────────────────────────────

/// The lifecycle status of a physical asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    /// In the warehouse, free to book.
    Available,
    /// Out at a customer site.
    Issued,
    /// Flagged defective at a site, waiting for collection.
    AwaitingPickup,
    /// In the repair workshop.
    AwaitingRepair,
    /// Attached to an open outbound draft.
    ReservedForIssue,
    /// Attached to an open inbound draft.
    ReservedForReturn,
    /// Attached to an open defect-request draft.
    ReservedForRepair,
    /// Attached to an open repair-return draft.
    ReservedFromRepair,
}

impl AssetStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Issued => "ISSUED",
            Self::AwaitingPickup => "AWAITING_PICKUP",
            Self::AwaitingRepair => "AWAITING_REPAIR",
            Self::ReservedForIssue => "RESERVED_FOR_ISSUE",
            Self::ReservedForReturn => "RESERVED_FOR_RETURN",
            Self::ReservedForRepair => "RESERVED_FOR_REPAIR",
            Self::ReservedFromRepair => "RESERVED_FROM_REPAIR",
        }
    }

    /// Whether this status means "attached to an open draft".
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Self::ReservedForIssue
                | Self::ReservedForReturn
                | Self::ReservedForRepair
                | Self::ReservedFromRepair
        )
    }

    /// All statuses as a slice.
    pub fn all() -> &'static [AssetStatus] {
        &[
            Self::Available,
            Self::Issued,
            Self::AwaitingPickup,
            Self::AwaitingRepair,
            Self::ReservedForIssue,
            Self::ReservedForReturn,
            Self::ReservedForRepair,
            Self::ReservedFromRepair,
        ]
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Prior State ─────────────────────────────────────────────────────

/// What a reversal restores: the status and routing the asset had at the
/// moment it was scanned onto a draft.
///
/// Captured on the asset row at scan time so a return does not have to
/// guess. Cleared on both settle and detach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorState {
    /// Status before the scan.
    pub status: AssetStatus,
    /// Origin of the last recorded movement before the scan.
    pub origin: Option<SiteId>,
    /// Destination of the last recorded movement before the scan.
    pub destination: Option<SiteId>,
}

// ─── Asset Record ────────────────────────────────────────────────────

/// The registry row for one physical asset.
///
/// Attachment to a booking is represented directly on the row (`draft_id`,
/// `ref_code`, scan fields). The row-level lock in the store makes
/// check-then-attach atomic, which is what guarantees an asset is never on
/// two open bookings at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Business key; the label on the asset.
    pub asset_code: AssetCode,
    /// Current lifecycle status.
    pub status: AssetStatus,
    /// Snapshot restored by a reversal. `Some` only while attached via a
    /// scan this process performed; hydrated legacy rows may be attached
    /// with `prior` absent.
    pub prior: Option<PriorState>,
    /// The open booking this asset is attached to, if any.
    pub draft_id: Option<DraftId>,
    /// Reference code of the attaching booking.
    pub ref_code: Option<RefCode>,
    /// Identifier of the attaching scan event.
    pub scan_id: Option<ScanId>,
    /// Operator who scanned the asset.
    pub scan_by: Option<ActorId>,
    /// When the asset was scanned.
    pub scan_at: Option<Timestamp>,
    /// Origin of the most recent movement stamped on this asset.
    pub origin: Option<SiteId>,
    /// Destination of the most recent movement stamped on this asset.
    /// Routing-aware scans check the booking's declared origin against this.
    pub destination: Option<SiteId>,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl AssetRecord {
    /// Register a new asset in the given settled status.
    pub fn new(asset_code: AssetCode, status: AssetStatus) -> Self {
        Self {
            asset_code,
            status,
            prior: None,
            draft_id: None,
            ref_code: None,
            scan_id: None,
            scan_by: None,
            scan_at: None,
            origin: None,
            destination: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Whether the asset is attached to any open booking.
    pub fn is_attached(&self) -> bool {
        self.draft_id.is_some()
    }

    /// Whether the asset is attached to this specific booking.
    pub fn is_attached_to(&self, draft_id: &DraftId) -> bool {
        self.draft_id.as_ref() == Some(draft_id)
    }

    /// Attach the asset to a booking: move it into the movement type's
    /// reserved status, capture the prior state, and stamp the scan fields.
    /// Returns the minted scan id.
    ///
    /// The caller validates preconditions first; this method only applies
    /// the effect.
    pub fn attach(
        &mut self,
        reserved: AssetStatus,
        draft_id: DraftId,
        ref_code: RefCode,
        scan_by: ActorId,
        scan_at: Timestamp,
        origin: Option<SiteId>,
        destination: Option<SiteId>,
    ) -> ScanId {
        self.prior = Some(PriorState {
            status: self.status,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
        });
        let scan_id = ScanId::new();
        self.status = reserved;
        self.draft_id = Some(draft_id);
        self.ref_code = Some(ref_code);
        self.scan_id = Some(scan_id);
        self.scan_by = Some(scan_by);
        self.scan_at = Some(scan_at);
        self.apply_routing(origin.as_ref(), destination.as_ref());
        self.updated_at = scan_at;
        scan_id
    }

    /// Detach the asset from its booking, restoring `restore_to` and the
    /// prior routing. Clears every attachment field.
    ///
    /// The caller decides `restore_to` (prior status, ledger recovery, or
    /// the profile default, in that order).
    pub fn detach(&mut self, restore_to: AssetStatus, at: Timestamp) {
        if let Some(prior) = self.prior.take() {
            self.origin = prior.origin;
            self.destination = prior.destination;
        }
        self.status = restore_to;
        self.draft_id = None;
        self.ref_code = None;
        self.scan_id = None;
        self.scan_by = None;
        self.scan_at = None;
        self.updated_at = at;
    }

    /// Settle the asset after its movement is confirmed: move to the steady
    /// status and clear the attachment fields. Routing fields are kept —
    /// they now describe the movement that just completed.
    pub fn settle(&mut self, steady: AssetStatus, at: Timestamp) {
        self.status = steady;
        self.prior = None;
        self.draft_id = None;
        self.ref_code = None;
        self.scan_id = None;
        self.scan_by = None;
        self.scan_at = None;
        self.updated_at = at;
    }

    /// Stamp routing fields from a booking header. Only declared (`Some`)
    /// values overwrite; an undeclared header field leaves the asset's
    /// recorded routing alone.
    pub fn apply_routing(&mut self, origin: Option<&SiteId>, destination: Option<&SiteId>) {
        if let Some(o) = origin {
            self.origin = Some(o.clone());
        }
        if let Some(d) = destination {
            self.destination = Some(d.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> AssetCode {
        AssetCode::new(s).unwrap()
    }

    fn attach_args() -> (DraftId, RefCode, ActorId, Timestamp) {
        (
            DraftId::new("D1").unwrap(),
            RefCode::new("O2508250001").unwrap(),
            ActorId::new("scanner1").unwrap(),
            Timestamp::parse("2025-08-25T09:00:00Z").unwrap(),
        )
    }

    #[test]
    fn status_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&AssetStatus::ReservedForIssue).unwrap();
        assert_eq!(json, "\"RESERVED_FOR_ISSUE\"");
        let back: AssetStatus = serde_json::from_str("\"AWAITING_PICKUP\"").unwrap();
        assert_eq!(back, AssetStatus::AwaitingPickup);
    }

    #[test]
    fn status_as_str_matches_serde() {
        for status in AssetStatus::all() {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn reserved_statuses_identified() {
        assert!(AssetStatus::ReservedForIssue.is_reserved());
        assert!(AssetStatus::ReservedFromRepair.is_reserved());
        assert!(!AssetStatus::Available.is_reserved());
        assert!(!AssetStatus::AwaitingRepair.is_reserved());
    }

    #[test]
    fn attach_captures_prior_state() {
        let mut asset = AssetRecord::new(code("A100"), AssetStatus::AwaitingPickup);
        asset.origin = Some(SiteId::new("WH1").unwrap());
        let (draft, refc, actor, at) = attach_args();

        asset.attach(AssetStatus::ReservedForRepair, draft.clone(), refc, actor, at, None, None);

        assert_eq!(asset.status, AssetStatus::ReservedForRepair);
        assert!(asset.is_attached_to(&draft));
        assert!(asset.scan_id.is_some());
        let prior = asset.prior.as_ref().unwrap();
        assert_eq!(prior.status, AssetStatus::AwaitingPickup);
        assert_eq!(prior.origin.as_ref().unwrap().as_str(), "WH1");
    }

    #[test]
    fn detach_restores_prior_routing_and_clears_attachment() {
        let mut asset = AssetRecord::new(code("A100"), AssetStatus::Available);
        asset.destination = Some(SiteId::new("WH1").unwrap());
        let (draft, refc, actor, at) = attach_args();
        asset.attach(
            AssetStatus::ReservedForIssue,
            draft,
            refc,
            actor,
            at,
            Some(SiteId::new("WH1").unwrap()),
            Some(SiteId::new("SITE2").unwrap()),
        );
        assert_eq!(asset.destination.as_ref().unwrap().as_str(), "SITE2");

        asset.detach(AssetStatus::Available, Timestamp::now());

        assert_eq!(asset.status, AssetStatus::Available);
        assert!(!asset.is_attached());
        assert!(asset.scan_id.is_none());
        assert!(asset.scan_by.is_none());
        assert!(asset.prior.is_none());
        // Routing reverted to what the scan found.
        assert_eq!(asset.destination.as_ref().unwrap().as_str(), "WH1");
        assert!(asset.origin.is_none());
    }

    #[test]
    fn settle_keeps_routing_and_clears_attachment() {
        let mut asset = AssetRecord::new(code("A100"), AssetStatus::Available);
        let (draft, refc, actor, at) = attach_args();
        asset.attach(
            AssetStatus::ReservedForIssue,
            draft,
            refc,
            actor,
            at,
            Some(SiteId::new("WH1").unwrap()),
            Some(SiteId::new("SITE2").unwrap()),
        );

        asset.settle(AssetStatus::Issued, Timestamp::now());

        assert_eq!(asset.status, AssetStatus::Issued);
        assert!(!asset.is_attached());
        assert!(asset.prior.is_none());
        assert!(asset.scan_at.is_none());
        assert_eq!(asset.origin.as_ref().unwrap().as_str(), "WH1");
        assert_eq!(asset.destination.as_ref().unwrap().as_str(), "SITE2");
    }

    #[test]
    fn apply_routing_ignores_undeclared_fields() {
        let mut asset = AssetRecord::new(code("A100"), AssetStatus::Issued);
        asset.destination = Some(SiteId::new("SITE2").unwrap());

        asset.apply_routing(Some(&SiteId::new("SITE2").unwrap()), None);

        assert_eq!(asset.origin.as_ref().unwrap().as_str(), "SITE2");
        assert_eq!(asset.destination.as_ref().unwrap().as_str(), "SITE2");
    }
}
