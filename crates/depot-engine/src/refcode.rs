//! # Reference Code Assignment
//!
//! Codes are `<prefix><YYMMDD><NNNN>`: one prefix letter resolved from the
//! booking type and objective, the compact UTC date, and a four-digit daily
//! sequence. The next sequence is `1 + max(existing suffixes sharing the
//! prefix+date)`, computed by scanning existing header codes.
//!
//! The scan and the subsequent header write run under one generator lock;
//! without it two concurrent calls can compute the same "next" sequence and
//! collide.

use depot_core::{ActorId, DraftId, MovementError, MovementResult, RefCode, Timestamp};

use crate::engine::BookingEngine;

impl BookingEngine {
    /// Assign a reference code to a draft, minting the next sequence for
    /// its prefix and today's date. Idempotent: a draft that already has a
    /// code gets it back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] for an unknown draft,
    /// [`MovementError::IllegalTransition`] for a terminal one, and
    /// [`MovementError::Conflict`] when the prefix+date sequence space is
    /// exhausted.
    pub fn assign_ref_code(&self, draft_id: &DraftId, actor: &ActorId) -> MovementResult<RefCode> {
        let _gate = self.store().single_op_guard();
        self.assign_ref_code_locked(draft_id, actor, Timestamp::now())
    }

    /// Generator body. Callers hold an operation gate already; this takes
    /// only the generator lock.
    pub(crate) fn assign_ref_code_locked(
        &self,
        draft_id: &DraftId,
        actor: &ActorId,
        at: Timestamp,
    ) -> MovementResult<RefCode> {
        let _serial = self.refcode_lock().lock();

        let header = self
            .store()
            .header(draft_id)
            .ok_or_else(|| Self::booking_not_found(draft_id))?;
        if let Some(code) = header.ref_code {
            return Ok(code);
        }
        if header.status.is_terminal() {
            return Err(MovementError::IllegalTransition {
                from: header.status.to_string(),
                attempted: "assign a reference code to".to_string(),
            });
        }

        let prefix = self.profile(header.booking_type).prefix_for(header.objective);
        let date_part = at.compact_date();
        let sequence = match self.store().max_sequence(prefix, &date_part) {
            None => 1,
            Some(seq) if seq >= RefCode::MAX_SEQUENCE => {
                return Err(MovementError::Conflict(format!(
                    "sequence space exhausted for prefix {prefix} on {date_part}"
                )));
            }
            Some(seq) => seq + 1,
        };
        let code = RefCode::from_parts(prefix, &date_part, sequence)?;

        let assigned = {
            let mut row = self
                .store()
                .header_mut(draft_id)
                .ok_or_else(|| Self::booking_not_found(draft_id))?;
            row.assign_ref_code(code.clone(), actor)?;
            row.clone()
        };

        tracing::info!(draft_id = %draft_id, ref_code = %code, "reference code assigned");
        self.emit_header(&assigned);
        Ok(code)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
