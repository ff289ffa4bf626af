//! # Draft Session Operations
//!
//! Header-level operations: opening a draft (idempotent upsert), confirming
//! header metadata with routing propagation, unlocking a finalized booking
//! for rework, and cancelling an empty draft.

use depot_core::{ActorId, DraftId, MovementError, MovementResult, Timestamp};
use depot_state::{BookingHeader, BookingType, HeaderPatch, MovementObjective};

use crate::engine::BookingEngine;

impl BookingEngine {
    /// Open a draft session, or refresh it when the caller retries.
    ///
    /// The first call creates the header in `INITIAL`. Repeat calls with the
    /// same identity only refresh the audit columns; status never regresses.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] when a retry carries a
    /// different booking type or objective: both are fixed at creation.
    pub fn create_draft(
        &self,
        draft_id: &DraftId,
        booking_type: BookingType,
        objective: MovementObjective,
        actor: &ActorId,
    ) -> MovementResult<BookingHeader> {
        let _gate = self.store().single_op_guard();

        let mut conflict: Option<&'static str> = None;
        let header = self.store().upsert_header(
            draft_id.clone(),
            || BookingHeader::new(draft_id.clone(), booking_type, objective, actor.clone()),
            |existing| {
                if existing.booking_type != booking_type {
                    conflict = Some("change the booking type of");
                } else if existing.objective != objective {
                    conflict = Some("change the movement objective of");
                } else {
                    existing.touch(actor);
                }
            },
        );
        if let Some(attempted) = conflict {
            return Err(MovementError::IllegalTransition {
                from: header.status.to_string(),
                attempted: attempted.to_string(),
            });
        }

        tracing::info!(
            draft_id = %header.draft_id,
            booking_type = %header.booking_type,
            status = %header.status,
            "draft created or refreshed"
        );
        self.emit_header(&header);
        Ok(header)
    }

    /// Apply a metadata patch and confirm the header.
    ///
    /// Legal from `INITIAL` or `CONFIRMED`; ends in `CONFIRMED`. For
    /// routing-aware booking types a routing patch is also stamped onto
    /// every asset currently attached to the draft, so in-flight items
    /// carry the corrected route instead of stale scan-time values.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft and
    /// [`MovementError::IllegalTransition`] from any other status.
    pub fn update_header_metadata(
        &self,
        draft_id: &DraftId,
        patch: &HeaderPatch,
        actor: &ActorId,
    ) -> MovementResult<BookingHeader> {
        // Exclusive: routing propagation touches many asset rows.
        let _gate = self.store().batch_op_guard();
        let now = Timestamp::now();

        let header = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            row.confirm_metadata(patch, actor)?;
            row.clone()
        };

        let mut rerouted = Vec::new();
        if self.profile(header.booking_type).requires_routing && patch.touches_routing() {
            for asset in self.store().attached_assets(draft_id) {
                if let Some(mut row) = self.store().asset_mut(&asset.asset_code) {
                    row.apply_routing(header.origin.as_ref(), header.destination.as_ref());
                    row.updated_at = now;
                    rerouted.push(row.clone());
                }
            }
        }

        tracing::info!(
            draft_id = %header.draft_id,
            status = %header.status,
            rerouted = rerouted.len(),
            "header metadata confirmed"
        );
        self.emit_header(&header);
        for asset in &rerouted {
            self.emit_asset(asset);
        }
        Ok(header)
    }

    /// Reopen a finalized booking for edits.
    ///
    /// Keeps the reference code and all ledger history; a later re-finalize
    /// merges instead of re-recording.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft and
    /// [`MovementError::IllegalTransition`] unless the booking is
    /// `FINALIZED`.
    pub fn unlock(&self, draft_id: &DraftId, actor: &ActorId) -> MovementResult<BookingHeader> {
        let _gate = self.store().single_op_guard();
        let header = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            row.unlock(actor)?;
            row.clone()
        };

        tracing::info!(draft_id = %header.draft_id, "booking unlocked for edit");
        self.emit_header(&header);
        Ok(header)
    }

    /// Abandon a draft. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft and
    /// [`MovementError::IllegalTransition`] when assets are still attached
    /// or the booking is past `CONFIRMED`.
    pub fn cancel(&self, draft_id: &DraftId, actor: &ActorId) -> MovementResult<BookingHeader> {
        // Exclusive: the zero-attached check must stay true through the
        // transition.
        let _gate = self.store().batch_op_guard();
        let header = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            let attached = self.store().attached_count(draft_id);
            if attached > 0 {
                return Err(MovementError::IllegalTransition {
                    from: row.status.to_string(),
                    attempted: format!("cancel with {attached} attached assets"),
                });
            }
            row.cancel(actor)?;
            row.clone()
        };

        tracing::info!(draft_id = %header.draft_id, "booking cancelled");
        self.emit_header(&header);
        Ok(header)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use depot_core::{AssetCode, SiteId};
    use depot_state::{AssetRecord, AssetStatus, BookingStatus};
    use depot_store::MovementStore;

    fn engine() -> BookingEngine {
        BookingEngine::new(Arc::new(MovementStore::new()))
    }

    fn actor() -> ActorId {
        ActorId::new("clerk1").unwrap()
    }

    fn draft(id: &str) -> DraftId {
        DraftId::new(id).unwrap()
    }

    fn seed_asset(engine: &BookingEngine, code: &str, status: AssetStatus) -> AssetCode {
        let asset_code = AssetCode::new(code).unwrap();
        engine
            .store()
            .insert_asset(AssetRecord::new(asset_code.clone(), status));
        asset_code
    }

    fn routing_patch(origin: &str, destination: &str) -> HeaderPatch {
        HeaderPatch {
            remark: None,
            origin: Some(SiteId::new(origin).unwrap()),
            destination: Some(SiteId::new(destination).unwrap()),
        }
    }

    // ── create_draft ─────────────────────────────────────────────────

    #[test]
    fn fresh_draft_of_every_type_is_initial_with_zero_attached() {
        let engine = engine();
        for (i, booking_type) in BookingType::all().iter().enumerate() {
            let id = draft(&format!("D{i}"));
            let header = engine
                .create_draft(&id, *booking_type, MovementObjective::Standard, &actor())
                .unwrap();
            assert_eq!(header.status, BookingStatus::Initial);
            assert!(header.ref_code.is_none());
            assert!(engine.attached_assets(&id).unwrap().is_empty());
        }
    }

    #[test]
    fn create_retry_refreshes_without_regressing_status() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::Outbound, MovementObjective::Standard, &actor())
            .unwrap();
        engine
            .update_header_metadata(&id, &HeaderPatch::default(), &actor())
            .unwrap();

        let retried = engine
            .create_draft(&id, BookingType::Outbound, MovementObjective::Standard, &actor())
            .unwrap();
        assert_eq!(retried.status, BookingStatus::Confirmed);
        assert_eq!(engine.list_headers().len(), 1);
    }

    #[test]
    fn create_rejects_identity_change() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::Outbound, MovementObjective::Standard, &actor())
            .unwrap();

        let err = engine
            .create_draft(&id, BookingType::Inbound, MovementObjective::Standard, &actor())
            .unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));

        let err = engine
            .create_draft(
                &id,
                BookingType::Outbound,
                MovementObjective::RepairDispatch,
                &actor(),
            )
            .unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));
    }

    // ── update_header_metadata ───────────────────────────────────────

    #[test]
    fn metadata_update_confirms_and_reroutes_attached_assets() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::Outbound, MovementObjective::Standard, &actor())
            .unwrap();
        let code = seed_asset(&engine, "A100", AssetStatus::Available);
        engine.scan(&code, &id, &actor()).unwrap();

        let header = engine
            .update_header_metadata(&id, &routing_patch("WH1", "SITE2"), &actor())
            .unwrap();
        assert_eq!(header.status, BookingStatus::Confirmed);

        let asset = engine.asset(&code).unwrap();
        assert_eq!(asset.origin.as_ref().unwrap().as_str(), "WH1");
        assert_eq!(asset.destination.as_ref().unwrap().as_str(), "SITE2");
    }

    #[test]
    fn metadata_update_skips_routing_for_non_routing_types() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(
                &id,
                BookingType::DefectRequest,
                MovementObjective::Standard,
                &actor(),
            )
            .unwrap();
        let code = seed_asset(&engine, "A100", AssetStatus::Available);
        engine.scan(&code, &id, &actor()).unwrap();

        engine
            .update_header_metadata(&id, &routing_patch("WH1", "SHOP"), &actor())
            .unwrap();

        // Header records the patch; the attached asset is untouched.
        let asset = engine.asset(&code).unwrap();
        assert!(asset.origin.is_none());
        assert!(asset.destination.is_none());
    }

    #[test]
    fn metadata_update_unknown_draft_is_not_found() {
        let engine = engine();
        let err = engine
            .update_header_metadata(&draft("NOPE"), &HeaderPatch::default(), &actor())
            .unwrap_err();
        assert!(matches!(err, MovementError::NotFound { kind: "booking", .. }));
    }

    // ── unlock ───────────────────────────────────────────────────────

    #[test]
    fn unlock_requires_finalized() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::Inbound, MovementObjective::Standard, &actor())
            .unwrap();
        let err = engine.unlock(&id, &actor()).unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));
    }

    // ── cancel ───────────────────────────────────────────────────────

    #[test]
    fn cancel_rejected_while_assets_attached() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::Outbound, MovementObjective::Standard, &actor())
            .unwrap();
        let code = seed_asset(&engine, "A100", AssetStatus::Available);
        engine.scan(&code, &id, &actor()).unwrap();

        let err = engine.cancel(&id, &actor()).unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));
        assert_eq!(engine.header(&id).unwrap().status, BookingStatus::Initial);

        // Returning the asset clears the guard.
        engine.return_one(&code, &actor()).unwrap();
        let header = engine.cancel(&id, &actor()).unwrap();
        assert_eq!(header.status, BookingStatus::Cancelled);
    }

    #[test]
    fn cancel_empty_draft_succeeds_from_confirmed() {
        let engine = engine();
        let id = draft("D1");
        engine
            .create_draft(&id, BookingType::RepairReturn, MovementObjective::Standard, &actor())
            .unwrap();
        engine
            .update_header_metadata(&id, &HeaderPatch::default(), &actor())
            .unwrap();

        let header = engine.cancel(&id, &actor()).unwrap();
        assert_eq!(header.status, BookingStatus::Cancelled);
        assert!(header.is_terminal());
    }

    #[test]
    fn cancel_unknown_draft_is_not_found() {
        let engine = engine();
        let err = engine.cancel(&draft("NOPE"), &actor()).unwrap_err();
        assert!(matches!(err, MovementError::NotFound { kind: "booking", .. }));
    }
}
