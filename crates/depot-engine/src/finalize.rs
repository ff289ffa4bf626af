//! # Finalize and Output Confirmation
//!
//! Finalize snapshots the attached set into the ledger and locks the
//! booking; output confirmation executes the movement, settling every
//! attached asset into the type's steady status and closing the header.
//!
//! A re-finalize after unlock merges instead of re-recording: rows whose
//! scan is already in the ledger are skipped (with at most a routing
//! refresh), rows for new scans are appended, and nothing is ever deleted.

use depot_core::{ActorId, DraftId, MovementError, MovementResult, Timestamp};
use depot_state::{BookingHeader, BookingStatus, HeaderPatch, LedgerAction, LedgerEntry};

use crate::engine::BookingEngine;

impl BookingEngine {
    /// Finalize a booking: apply an optional header patch, make sure a
    /// reference code is assigned, write one `MOVED` ledger row per newly
    /// recorded scan, and move the header to `FINALIZED`.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft and
    /// [`MovementError::IllegalTransition`] unless the booking is
    /// `CONFIRMED` or `UNLOCKED_FOR_EDIT`.
    pub fn finalize(
        &self,
        draft_id: &DraftId,
        actor: &ActorId,
        patch: Option<&HeaderPatch>,
    ) -> MovementResult<BookingHeader> {
        let _gate = self.store().batch_op_guard();
        let now = Timestamp::now();

        // Validate on a snapshot before the code assignment commits.
        let snapshot = self
            .store()
            .header(draft_id)
            .ok_or_else(|| Self::booking_not_found(draft_id))?;
        if !matches!(
            snapshot.status,
            BookingStatus::Confirmed | BookingStatus::UnlockedForEdit
        ) {
            return Err(MovementError::IllegalTransition {
                from: snapshot.status.to_string(),
                attempted: "finalize".to_string(),
            });
        }
        let was_unlocked = snapshot.status == BookingStatus::UnlockedForEdit;
        let ref_code = self.ensure_ref_code(&snapshot, actor, now)?;

        let header = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            row.mark_finalized(actor)?;
            if let Some(patch) = patch {
                row.apply_patch(patch);
            }
            row.clone()
        };

        // Stamp a routing patch onto the attached rows before they are
        // snapshotted into the ledger.
        let routing_patch = patch.map(HeaderPatch::touches_routing).unwrap_or(false);
        let mut rerouted = Vec::new();
        if self.profile(header.booking_type).requires_routing && routing_patch {
            for asset in self.store().attached_assets(draft_id) {
                if let Some(mut row) = self.store().asset_mut(&asset.asset_code) {
                    row.apply_routing(header.origin.as_ref(), header.destination.as_ref());
                    row.updated_at = now;
                    rerouted.push(row.clone());
                }
            }
        }

        // Ledger merge. First-time finalize bulk-copies the attached set;
        // re-finalize skips scans that already have a row.
        let attached = self.store().attached_assets(draft_id);
        let mut fresh_entries = Vec::with_capacity(attached.len());
        for asset in &attached {
            let recorded = if was_unlocked {
                self.store().reconcile_moved_entry(&ref_code, asset)?
            } else {
                None
            };
            if recorded.is_none() {
                fresh_entries.push(LedgerEntry::capture(
                    LedgerAction::Moved,
                    &ref_code,
                    draft_id,
                    header.booking_type,
                    asset,
                    asset.status,
                    actor,
                    now,
                )?);
            }
        }
        for entry in &fresh_entries {
            self.store().append_entry(entry.clone());
        }

        tracing::info!(
            draft_id = %draft_id,
            ref_code = %ref_code,
            attached = attached.len(),
            recorded = fresh_entries.len(),
            "booking finalized"
        );
        self.emit_header(&header);
        for asset in &rerouted {
            self.emit_asset(asset);
        }
        for entry in &fresh_entries {
            self.emit_entry(entry);
        }
        Ok(header)
    }

    /// Confirm the movement's output: one `CONFIRMED` ledger row per
    /// attached asset, every attached asset settled into the steady status
    /// and detached, and the header closed (`COMPLETED`, terminal).
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft and
    /// [`MovementError::IllegalTransition`] unless the booking is
    /// `FINALIZED`.
    pub fn confirm_output(
        &self,
        draft_id: &DraftId,
        actor: &ActorId,
    ) -> MovementResult<BookingHeader> {
        let _gate = self.store().batch_op_guard();
        let now = Timestamp::now();

        let snapshot = self
            .store()
            .header(draft_id)
            .ok_or_else(|| Self::booking_not_found(draft_id))?;
        if snapshot.status != BookingStatus::Finalized {
            return Err(MovementError::IllegalTransition {
                from: snapshot.status.to_string(),
                attempted: "confirm output for".to_string(),
            });
        }
        // Finalize guarantees a code; a hydrated row missing one is refused
        // rather than recorded uncoded.
        let ref_code = snapshot.ref_code.clone().ok_or_else(|| {
            MovementError::IllegalTransition {
                from: snapshot.status.to_string(),
                attempted: "confirm output without a reference code for".to_string(),
            }
        })?;
        let steady = self.profile(snapshot.booking_type).steady;

        // Build every completion row before mutating anything. The snapshot
        // keeps the scan fields; the recorded status is the steady one.
        let attached = self.store().attached_assets(draft_id);
        let mut entries = Vec::with_capacity(attached.len());
        for asset in &attached {
            entries.push(LedgerEntry::capture(
                LedgerAction::Confirmed,
                &ref_code,
                draft_id,
                snapshot.booking_type,
                asset,
                steady,
                actor,
                now,
            )?);
        }

        let header = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            row.complete(actor)?;
            row.clone()
        };

        let mut settled = Vec::with_capacity(attached.len());
        for (asset, entry) in attached.iter().zip(&entries) {
            self.store().append_entry(entry.clone());
            if let Some(mut row) = self.store().asset_mut(&asset.asset_code) {
                row.settle(steady, now);
                settled.push(row.clone());
            }
        }

        tracing::info!(
            draft_id = %draft_id,
            ref_code = %ref_code,
            assets = settled.len(),
            "movement confirmed, booking completed"
        );
        self.emit_header(&header);
        for entry in &entries {
            self.emit_entry(entry);
        }
        for asset in &settled {
            self.emit_asset(asset);
        }
        Ok(header)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
