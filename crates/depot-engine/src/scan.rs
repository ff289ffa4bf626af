//! # Asset Scan Gate
//!
//! Attaches one physical asset to an open draft. The check-then-set runs
//! under the asset's row guard, so two concurrent scans of the same asset
//! serialize: exactly one succeeds, the other observes the post-scan status
//! and fails with `AlreadyAttached` or `InvalidPrecondition`.
//!
//! Checks run in a fixed order so callers can rely on which error wins:
//! booking gate, asset existence, duplicate scan, status precondition,
//! routing continuity, then the effect.

use depot_core::{ActorId, AssetCode, DraftId, MovementError, MovementResult, Timestamp};
use depot_state::AssetRecord;

use crate::engine::BookingEngine;

impl BookingEngine {
    /// Scan an asset into an open draft.
    ///
    /// On success the asset sits in the booking type's reserved status,
    /// stamped with the draft, reference code, scan identity, and the
    /// header's routing; the prior state is captured for reversal. The
    /// updated row is returned.
    ///
    /// # Errors
    ///
    /// - [`MovementError::NotFound`] — unknown draft or asset.
    /// - [`MovementError::IllegalTransition`] — the booking does not accept
    ///   scans (`FINALIZED` or terminal).
    /// - [`MovementError::AlreadyAttached`] — duplicate scan into this same
    ///   booking, distinct from the next case so a terminal can say
    ///   "already in this booking" instead of "blocked".
    /// - [`MovementError::InvalidPrecondition`] — the asset's status is not
    ///   in the type's pre-scan set (including "reserved by another draft").
    /// - [`MovementError::RoutingMismatch`] — the declared origin is not
    ///   where the asset last ended up.
    pub fn scan(
        &self,
        asset_code: &AssetCode,
        draft_id: &DraftId,
        actor: &ActorId,
    ) -> MovementResult<AssetRecord> {
        let _gate = self.store().single_op_guard();
        let now = Timestamp::now();

        // Booking gate.
        let header = self
            .store()
            .header(draft_id)
            .ok_or_else(|| Self::booking_not_found(draft_id))?;
        if !header.accepts_scans() {
            return Err(MovementError::IllegalTransition {
                from: header.status.to_string(),
                attempted: "scan assets into".to_string(),
            });
        }
        // The asset row carries the code from scan time, so mint one now if
        // the header has none.
        let ref_code = self.ensure_ref_code(&header, actor, now)?;
        let profile = self.profile(header.booking_type);

        // Everything below runs under the asset's row guard.
        let mut row = self
            .store()
            .asset_mut(asset_code)
            .ok_or_else(|| Self::asset_not_found(asset_code))?;

        if row.is_attached_to(draft_id) {
            return Err(MovementError::AlreadyAttached {
                asset_code: asset_code.to_string(),
                draft_id: draft_id.to_string(),
            });
        }

        if !profile.pre_scan.contains(&row.status) {
            return Err(MovementError::InvalidPrecondition {
                asset_code: asset_code.to_string(),
                actual: row.status.to_string(),
                allowed: profile.pre_scan.iter().map(ToString::to_string).collect(),
            });
        }

        if profile.requires_routing {
            if let (Some(declared), Some(last)) = (&header.origin, &row.destination) {
                if declared != last {
                    return Err(MovementError::RoutingMismatch {
                        asset_code: asset_code.to_string(),
                        declared_origin: declared.to_string(),
                        last_destination: last.to_string(),
                    });
                }
            }
        }

        let scan_id = row.attach(
            profile.in_draft,
            draft_id.clone(),
            ref_code.clone(),
            actor.clone(),
            now,
            header.origin.clone(),
            header.destination.clone(),
        );
        let updated = row.clone();
        drop(row);

        tracing::info!(
            asset_code = %updated.asset_code,
            draft_id = %draft_id,
            ref_code = %ref_code,
            scan_id = %scan_id,
            status = %updated.status,
            "asset scanned into draft"
        );
        self.emit_asset(&updated);
        Ok(updated)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
