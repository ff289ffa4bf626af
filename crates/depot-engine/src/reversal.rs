//! # Reversal
//!
//! Detaches assets from open bookings and restores what the scan found.
//! The restore target is resolved in order: the prior-state snapshot on the
//! asset row, then the last settled ledger row for the asset (hydrated rows
//! may have lost their snapshot), then the movement type's primary pre-scan
//! status.
//!
//! A return from a booking that has already been finalized and unlocked is
//! audited with a `RETURNED` ledger row; before that point the scan was
//! never recorded, so its reversal leaves no trace either.

use std::collections::HashSet;

use depot_core::{ActorId, AssetCode, MovementError, MovementResult, Timestamp};
use depot_state::{AssetRecord, AssetStatus, BookingStatus, LedgerAction, LedgerEntry};

use crate::engine::BookingEngine;

fn not_reserved(asset: &AssetRecord) -> MovementError {
    MovementError::InvalidPrecondition {
        asset_code: asset.asset_code.to_string(),
        actual: asset.status.to_string(),
        allowed: AssetStatus::all()
            .iter()
            .filter(|s| s.is_reserved())
            .map(ToString::to_string)
            .collect(),
    }
}

impl BookingEngine {
    /// Return a single asset from whatever open booking it is attached to.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown asset,
    /// [`MovementError::InvalidPrecondition`] if it is not attached, and
    /// [`MovementError::IllegalTransition`] if the owning booking is not in
    /// a scan-accepting status (a finalized booking must be unlocked first).
    pub fn return_one(
        &self,
        asset_code: &AssetCode,
        actor: &ActorId,
    ) -> MovementResult<AssetRecord> {
        let _gate = self.store().single_op_guard();
        self.return_locked(asset_code, actor, Timestamp::now())
    }

    /// Return a batch of assets, all or nothing: the whole batch is
    /// validated before the first detach, so any error leaves every asset
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// Any error [`Self::return_one`] can produce, plus
    /// [`MovementError::Conflict`] when the same asset is listed twice.
    pub fn return_many(
        &self,
        asset_codes: &[AssetCode],
        actor: &ActorId,
    ) -> MovementResult<Vec<AssetRecord>> {
        let _gate = self.store().batch_op_guard();
        let now = Timestamp::now();

        let mut seen = HashSet::with_capacity(asset_codes.len());
        for code in asset_codes {
            if !seen.insert(code) {
                return Err(MovementError::Conflict(format!(
                    "asset {code} listed more than once"
                )));
            }
            let asset = self
                .store()
                .asset(code)
                .ok_or_else(|| Self::asset_not_found(code))?;
            let Some(draft_id) = asset.draft_id.clone() else {
                return Err(not_reserved(&asset));
            };
            let header = self
                .store()
                .header(&draft_id)
                .ok_or_else(|| Self::booking_not_found(&draft_id))?;
            if !header.status.accepts_scans() {
                return Err(MovementError::IllegalTransition {
                    from: header.status.to_string(),
                    attempted: "return assets from".to_string(),
                });
            }
        }

        let mut restored = Vec::with_capacity(asset_codes.len());
        for code in asset_codes {
            restored.push(self.return_locked(code, actor, now)?);
        }
        Ok(restored)
    }

    /// Reversal body. The caller holds the operation gate.
    fn return_locked(
        &self,
        asset_code: &AssetCode,
        actor: &ActorId,
        now: Timestamp,
    ) -> MovementResult<AssetRecord> {
        let mut row = self
            .store()
            .asset_mut(asset_code)
            .ok_or_else(|| Self::asset_not_found(asset_code))?;
        let Some(draft_id) = row.draft_id.clone() else {
            return Err(not_reserved(&row));
        };

        let header = self
            .store()
            .header(&draft_id)
            .ok_or_else(|| Self::booking_not_found(&draft_id))?;
        if !header.status.accepts_scans() {
            return Err(MovementError::IllegalTransition {
                from: header.status.to_string(),
                attempted: "return assets from".to_string(),
            });
        }

        // Resolve the restore target. The ledger is consulted only when the
        // row carries no snapshot.
        let ledger_fallback = if row.prior.is_none() {
            self.store().last_settled_entry(asset_code)
        } else {
            None
        };
        let restore_to = row
            .prior
            .as_ref()
            .map(|p| p.status)
            .or_else(|| ledger_fallback.as_ref().map(|e| e.asset_status))
            .unwrap_or_else(|| self.profile(header.booking_type).primary_pre_scan());

        // An unlocked booking already has this scan in the ledger; record
        // the reversal while the scan fields are still on the row.
        let mut audit_entry = None;
        if header.status == BookingStatus::UnlockedForEdit {
            match row.ref_code.clone().or_else(|| header.ref_code.clone()) {
                Some(ref_code) => {
                    let entry = LedgerEntry::capture(
                        LedgerAction::Returned,
                        &ref_code,
                        &draft_id,
                        header.booking_type,
                        &row,
                        restore_to,
                        actor,
                        now,
                    )?;
                    self.store().append_entry(entry.clone());
                    audit_entry = Some(entry);
                }
                None => {
                    tracing::warn!(
                        asset_code = %asset_code,
                        draft_id = %draft_id,
                        "unlocked booking has no reference code, reversal not audited"
                    );
                }
            }
        }

        row.detach(restore_to, now);
        if let Some(entry) = &ledger_fallback {
            row.origin = entry.origin.clone();
            row.destination = entry.destination.clone();
        }
        let restored = row.clone();
        drop(row);

        tracing::info!(
            asset_code = %asset_code,
            draft_id = %draft_id,
            restored_status = %restored.status,
            audited = audit_entry.is_some(),
            "asset returned"
        );
        if let Some(entry) = &audit_entry {
            self.emit_entry(entry);
        }
        self.emit_asset(&restored);
        Ok(restored)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
