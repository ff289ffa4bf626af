//! # Booking Headers and Lifecycle
//!
//! Defines the booking header entity and its multi-stage lifecycle:
//!
//! ```text
//!                confirm             finalize              complete
//!    INITIAL ───────────▶ CONFIRMED ───────────▶ FINALIZED ───────────▶ COMPLETED
//!       │                     │                    │     ▲
//!       │ cancel              │ cancel      unlock │     │ finalize
//!       ▼                     ▼                    ▼     │
//!    CANCELLED            CANCELLED           UNLOCKED_FOR_EDIT
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal. Unlock reopens a finalized
//! booking for edits without touching its reference code or ledger history;
//! re-finalizing reconciles rather than re-records.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Booking headers live in a concurrent store and a database, where status
//! is not known at compile time. A runtime-validated enum serializes
//! directly and lets [`BookingStatus::valid_transitions()`] drive both the
//! guards here and the transition-matrix tests.

use serde::{Deserialize, Serialize};

use depot_core::{ActorId, DraftId, MovementError, MovementResult, RefCode, SiteId, Timestamp};

// ─── Booking Type ────────────────────────────────────────────────────

/// The four movement workflows.
///
/// Behavioral differences between them live entirely in the per-type
/// [`MovementProfile`](crate::MovementProfile); the engine code is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    /// Assets coming back from a customer site to the warehouse.
    Inbound,
    /// Assets going out from the warehouse to a customer site.
    Outbound,
    /// Defective assets collected for the repair workshop.
    DefectRequest,
    /// Repaired assets returning from the workshop to stock.
    RepairReturn,
}

impl BookingType {
    /// The canonical string name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "INBOUND",
            Self::Outbound => "OUTBOUND",
            Self::DefectRequest => "DEFECT_REQUEST",
            Self::RepairReturn => "REPAIR_RETURN",
        }
    }

    /// All booking types as a slice.
    pub fn all() -> &'static [BookingType] {
        &[
            Self::Inbound,
            Self::Outbound,
            Self::DefectRequest,
            Self::RepairReturn,
        ]
    }
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Movement Objective ──────────────────────────────────────────────

/// Why the movement is happening. Refines the reference code prefix for
/// mixed-purpose bookings: an outbound booking dispatching assets to a
/// repair vendor codes differently from a standard issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementObjective {
    /// The ordinary purpose of the booking type.
    #[default]
    Standard,
    /// Dispatch to an external repair vendor.
    RepairDispatch,
}

impl MovementObjective {
    /// The canonical string name of this objective.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::RepairDispatch => "REPAIR_DISPATCH",
        }
    }
}

impl std::fmt::Display for MovementObjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Booking Status ──────────────────────────────────────────────────

/// The lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Draft just opened; header metadata not yet confirmed.
    Initial,
    /// Header metadata confirmed; scanning may proceed.
    Confirmed,
    /// Snapshot written to the ledger; awaiting output confirmation.
    Finalized,
    /// Reopened for edits after finalize.
    UnlockedForEdit,
    /// Movement executed and settled. Terminal state.
    Completed,
    /// Abandoned before any asset was attached. Terminal state.
    Cancelled,
}

impl BookingStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Confirmed => "CONFIRMED",
            Self::Finalized => "FINALIZED",
            Self::UnlockedForEdit => "UNLOCKED_FOR_EDIT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a booking in this status accepts scans.
    pub fn accepts_scans(&self) -> bool {
        matches!(self, Self::Initial | Self::Confirmed | Self::UnlockedForEdit)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [BookingStatus] {
        match self {
            Self::Initial => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Finalized, Self::Cancelled],
            Self::Finalized => &[Self::UnlockedForEdit, Self::Completed],
            Self::UnlockedForEdit => &[Self::Finalized],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// All statuses as a slice.
    pub fn all() -> &'static [BookingStatus] {
        &[
            Self::Initial,
            Self::Confirmed,
            Self::Finalized,
            Self::UnlockedForEdit,
            Self::Completed,
            Self::Cancelled,
        ]
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Status Change Record ────────────────────────────────────────────

/// Record of a single status transition on a booking header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the transition.
    pub from_status: BookingStatus,
    /// Status after the transition.
    pub to_status: BookingStatus,
    /// Operator who triggered the transition.
    pub actor: ActorId,
    /// When the transition occurred (UTC).
    pub at: Timestamp,
}

// ─── Header Patch ────────────────────────────────────────────────────

/// Partial update to booking header metadata. `None` members leave the
/// corresponding field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderPatch {
    /// Free-text remark.
    pub remark: Option<String>,
    /// Declared origin site.
    pub origin: Option<SiteId>,
    /// Declared destination site.
    pub destination: Option<SiteId>,
}

impl HeaderPatch {
    /// Whether the patch touches a routing field.
    pub fn touches_routing(&self) -> bool {
        self.origin.is_some() || self.destination.is_some()
    }
}

// ─── Booking Header ──────────────────────────────────────────────────

/// The header row of one booking session.
///
/// Identified by a caller-supplied [`DraftId`] that stays stable across
/// retries. The header owns its status machine; operations that also touch
/// assets or the ledger are composed in the engine crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingHeader {
    /// Caller-supplied session key.
    pub draft_id: DraftId,
    /// The movement workflow. Never changes after creation.
    pub booking_type: BookingType,
    /// Purpose refinement; drives the reference code prefix.
    pub objective: MovementObjective,
    /// Current lifecycle status.
    pub status: BookingStatus,
    /// Human-readable reference code. Assigned at most once.
    pub ref_code: Option<RefCode>,
    /// Declared origin site (routing-aware types).
    pub origin: Option<SiteId>,
    /// Declared destination site (routing-aware types).
    pub destination: Option<SiteId>,
    /// Free-text remark.
    pub remark: Option<String>,
    /// Who opened the draft.
    pub created_by: ActorId,
    /// When the draft was opened.
    pub created_at: Timestamp,
    /// Who last touched the header.
    pub updated_by: ActorId,
    /// When the header was last touched.
    pub updated_at: Timestamp,
    /// Ordered log of all status transitions.
    pub status_log: Vec<StatusChange>,
}

impl BookingHeader {
    /// Open a new draft in `INITIAL` status.
    ///
    /// Creation itself is not logged as a transition; the first entry in
    /// `status_log` will be the confirm or cancel that follows.
    pub fn new(
        draft_id: DraftId,
        booking_type: BookingType,
        objective: MovementObjective,
        actor: ActorId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            draft_id,
            booking_type,
            objective,
            status: BookingStatus::Initial,
            ref_code: None,
            origin: None,
            destination: None,
            remark: None,
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
            status_log: Vec::new(),
        }
    }

    /// Whether the booking currently accepts scans.
    pub fn accepts_scans(&self) -> bool {
        self.status.accepts_scans()
    }

    /// Whether the booking is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a metadata patch and confirm the header.
    ///
    /// Legal from `INITIAL` or `CONFIRMED`; always ends in `CONFIRMED`.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] from any other status.
    pub fn confirm_metadata(&mut self, patch: &HeaderPatch, actor: &ActorId) -> MovementResult<()> {
        self.require(
            &[BookingStatus::Initial, BookingStatus::Confirmed],
            "update metadata on",
        )?;
        self.apply_patch(patch);
        if self.status == BookingStatus::Initial {
            self.transition(BookingStatus::Confirmed, actor);
        } else {
            self.touch(actor);
        }
        Ok(())
    }

    /// Apply a metadata patch without a status transition. Used by finalize,
    /// which performs its own transition afterwards.
    pub fn apply_patch(&mut self, patch: &HeaderPatch) {
        if let Some(remark) = &patch.remark {
            self.remark = Some(remark.clone());
        }
        if let Some(origin) = &patch.origin {
            self.origin = Some(origin.clone());
        }
        if let Some(destination) = &patch.destination {
            self.destination = Some(destination.clone());
        }
    }

    /// Assign the reference code. Idempotent when the same code is already
    /// assigned.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::Conflict`] if a different code is already
    /// assigned.
    pub fn assign_ref_code(&mut self, code: RefCode, actor: &ActorId) -> MovementResult<()> {
        match &self.ref_code {
            Some(existing) if *existing == code => Ok(()),
            Some(existing) => Err(MovementError::Conflict(format!(
                "booking {} already carries reference code {existing}",
                self.draft_id
            ))),
            None => {
                self.ref_code = Some(code);
                self.touch(actor);
                Ok(())
            }
        }
    }

    /// Move to `FINALIZED`. Legal from `CONFIRMED` or `UNLOCKED_FOR_EDIT`.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] from any other status;
    /// in particular, finalizing an `INITIAL` draft is rejected.
    pub fn mark_finalized(&mut self, actor: &ActorId) -> MovementResult<()> {
        self.require(
            &[BookingStatus::Confirmed, BookingStatus::UnlockedForEdit],
            "finalize",
        )?;
        self.transition(BookingStatus::Finalized, actor);
        Ok(())
    }

    /// Reopen a finalized booking for edits. Keeps the reference code.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] unless `FINALIZED`.
    pub fn unlock(&mut self, actor: &ActorId) -> MovementResult<()> {
        self.require(&[BookingStatus::Finalized], "unlock")?;
        self.transition(BookingStatus::UnlockedForEdit, actor);
        Ok(())
    }

    /// Close the booking after output confirmation. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] unless `FINALIZED`.
    pub fn complete(&mut self, actor: &ActorId) -> MovementResult<()> {
        self.require(&[BookingStatus::Finalized], "complete")?;
        self.transition(BookingStatus::Completed, actor);
        Ok(())
    }

    /// Abandon the booking. Terminal. Legal from `INITIAL` or `CONFIRMED`;
    /// the zero-attached-assets guard lives with the engine, which can see
    /// the asset rows.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::IllegalTransition`] from any other status.
    pub fn cancel(&mut self, actor: &ActorId) -> MovementResult<()> {
        self.require(&[BookingStatus::Initial, BookingStatus::Confirmed], "cancel")?;
        self.transition(BookingStatus::Cancelled, actor);
        Ok(())
    }

    /// Reject the call unless the current status is in `allowed`.
    fn require(&self, allowed: &[BookingStatus], attempted: &str) -> MovementResult<()> {
        if !allowed.contains(&self.status) {
            return Err(MovementError::IllegalTransition {
                from: self.status.to_string(),
                attempted: attempted.to_string(),
            });
        }
        Ok(())
    }

    /// Record a status transition.
    fn transition(&mut self, to: BookingStatus, actor: &ActorId) {
        let now = Timestamp::now();
        self.status_log.push(StatusChange {
            from_status: self.status,
            to_status: to,
            actor: actor.clone(),
            at: now,
        });
        self.status = to;
        self.updated_by = actor.clone();
        self.updated_at = now;
    }

    /// Refresh the audit columns without a status change.
    pub fn touch(&mut self, actor: &ActorId) {
        self.updated_by = actor.clone();
        self.updated_at = Timestamp::now();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> ActorId {
        ActorId::new("clerk1").unwrap()
    }

    fn make_draft(booking_type: BookingType) -> BookingHeader {
        BookingHeader::new(
            DraftId::new("D1").unwrap(),
            booking_type,
            MovementObjective::Standard,
            actor(),
        )
    }

    fn make_finalized() -> BookingHeader {
        let mut header = make_draft(BookingType::Outbound);
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        header.mark_finalized(&actor()).unwrap();
        header
    }

    // ── Happy-path lifecycle ─────────────────────────────────────────

    #[test]
    fn new_draft_is_initial_with_empty_log() {
        let header = make_draft(BookingType::Inbound);
        assert_eq!(header.status, BookingStatus::Initial);
        assert!(header.status_log.is_empty());
        assert!(header.ref_code.is_none());
        assert!(header.accepts_scans());
    }

    #[test]
    fn confirm_metadata_transitions_and_applies_patch() {
        let mut header = make_draft(BookingType::Outbound);
        let patch = HeaderPatch {
            remark: Some("weekly issue run".to_string()),
            origin: Some(SiteId::new("WH1").unwrap()),
            destination: Some(SiteId::new("SITE2").unwrap()),
        };
        header.confirm_metadata(&patch, &actor()).unwrap();

        assert_eq!(header.status, BookingStatus::Confirmed);
        assert_eq!(header.status_log.len(), 1);
        assert_eq!(header.status_log[0].from_status, BookingStatus::Initial);
        assert_eq!(header.origin.as_ref().unwrap().as_str(), "WH1");
        assert_eq!(header.remark.as_deref(), Some("weekly issue run"));
    }

    #[test]
    fn confirm_metadata_is_repeatable_while_confirmed() {
        let mut header = make_draft(BookingType::Outbound);
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        header
            .confirm_metadata(
                &HeaderPatch {
                    remark: Some("updated".to_string()),
                    ..Default::default()
                },
                &actor(),
            )
            .unwrap();

        assert_eq!(header.status, BookingStatus::Confirmed);
        // Only the INITIAL -> CONFIRMED edge is logged.
        assert_eq!(header.status_log.len(), 1);
        assert_eq!(header.remark.as_deref(), Some("updated"));
    }

    #[test]
    fn full_lifecycle_to_completed() {
        let mut header = make_draft(BookingType::Outbound);
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        header.mark_finalized(&actor()).unwrap();
        header.unlock(&actor()).unwrap();
        header.mark_finalized(&actor()).unwrap();
        header.complete(&actor()).unwrap();

        assert_eq!(header.status, BookingStatus::Completed);
        assert!(header.is_terminal());
        assert_eq!(header.status_log.len(), 5);
    }

    // ── Guards ───────────────────────────────────────────────────────

    #[test]
    fn finalize_from_initial_rejected() {
        let mut header = make_draft(BookingType::Inbound);
        let err = header.mark_finalized(&actor()).unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));
        assert_eq!(header.status, BookingStatus::Initial);
    }

    #[test]
    fn unlock_requires_finalized() {
        let mut header = make_draft(BookingType::Inbound);
        assert!(header.unlock(&actor()).is_err());
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        assert!(header.unlock(&actor()).is_err());
    }

    #[test]
    fn complete_requires_finalized() {
        let mut header = make_draft(BookingType::Outbound);
        assert!(header.complete(&actor()).is_err());
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        assert!(header.complete(&actor()).is_err());
    }

    #[test]
    fn cancel_only_before_finalize() {
        let mut header = make_finalized();
        let err = header.cancel(&actor()).unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));

        let mut fresh = make_draft(BookingType::DefectRequest);
        fresh.cancel(&actor()).unwrap();
        assert_eq!(fresh.status, BookingStatus::Cancelled);
        assert!(fresh.is_terminal());
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut header = make_draft(BookingType::Outbound);
        header.cancel(&actor()).unwrap();
        assert!(header.confirm_metadata(&HeaderPatch::default(), &actor()).is_err());
        assert!(header.mark_finalized(&actor()).is_err());
        assert!(header.unlock(&actor()).is_err());
        assert!(header.complete(&actor()).is_err());
        assert!(header.cancel(&actor()).is_err());
    }

    #[test]
    fn metadata_update_rejected_after_finalize() {
        let mut header = make_finalized();
        let err = header
            .confirm_metadata(&HeaderPatch::default(), &actor())
            .unwrap_err();
        assert!(matches!(err, MovementError::IllegalTransition { .. }));
    }

    // ── Reference code ───────────────────────────────────────────────

    #[test]
    fn ref_code_assigned_once() {
        let mut header = make_draft(BookingType::Outbound);
        let code = RefCode::new("O2508250001").unwrap();
        header.assign_ref_code(code.clone(), &actor()).unwrap();
        assert_eq!(header.ref_code, Some(code.clone()));

        // Same code is an idempotent no-op.
        header.assign_ref_code(code, &actor()).unwrap();

        // A different code is a conflict.
        let other = RefCode::new("O2508250002").unwrap();
        let err = header.assign_ref_code(other, &actor()).unwrap_err();
        assert!(matches!(err, MovementError::Conflict(_)));
    }

    #[test]
    fn unlock_keeps_ref_code() {
        let mut header = make_finalized();
        header
            .assign_ref_code(RefCode::new("O2508250001").unwrap(), &actor())
            .unwrap();
        header.unlock(&actor()).unwrap();
        assert!(header.ref_code.is_some());
    }

    // ── Serde ────────────────────────────────────────────────────────

    #[test]
    fn status_serde_matches_as_str() {
        for status in BookingStatus::all() {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn booking_type_serde_roundtrip() {
        for booking_type in BookingType::all() {
            let json = serde_json::to_string(booking_type).unwrap();
            let back: BookingType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *booking_type);
        }
    }

    #[test]
    fn header_serde_roundtrip() {
        let mut header = make_draft(BookingType::RepairReturn);
        header.confirm_metadata(&HeaderPatch::default(), &actor()).unwrap();
        let json = serde_json::to_string(&header).unwrap();
        let back: BookingHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
