//! # Movement Profiles
//!
//! A [`MovementProfile`] is the data that makes one booking type behave
//! differently from another: which asset statuses a scan accepts, which
//! reserved status it parks assets in, which steady status completion
//! settles them into, and whether the workflow routes between sites.
//! The engine itself is shared; only the profile differs.
//!
//! The built-in table covers the four workflows. Deployments can override
//! individual entries from a YAML document:
//!
//! ```yaml
//! outbound:
//!   prefix: O
//!   dispatch_prefix: S
//!   pre_scan: [AVAILABLE]
//!   in_draft: RESERVED_FOR_ISSUE
//!   steady: ISSUED
//!   requires_routing: true
//! ```
//!
//! Booking types absent from the document keep their built-in profile.
//! [`ProfileTable::from_yaml`] rejects documents whose merged table fails
//! [`ProfileTable::validate`].

use serde::{Deserialize, Serialize};

use crate::asset::AssetStatus;
use crate::booking::{BookingType, MovementObjective};

/// Error raised while loading a profile table.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The document is not valid YAML for a profile table.
    #[error("profile table parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The merged table violates a structural rule.
    #[error("invalid profile table: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// ─── Movement Profile ────────────────────────────────────────────────

/// Per-booking-type behavior table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementProfile {
    /// Reference code prefix for standard movements.
    pub prefix: char,
    /// Reference code prefix when the objective is a repair dispatch.
    /// `None` means the standard prefix applies.
    pub dispatch_prefix: Option<char>,
    /// Asset statuses a scan accepts, in preference order. The first
    /// entry is the status reversal restores when no better source of
    /// truth survives.
    pub pre_scan: Vec<AssetStatus>,
    /// Reserved status assets hold while attached to a draft.
    pub in_draft: AssetStatus,
    /// Steady status completion settles assets into.
    pub steady: AssetStatus,
    /// Whether this workflow declares origin and destination sites and
    /// participates in routing continuity checks.
    pub requires_routing: bool,
}

impl MovementProfile {
    /// The built-in profile for `booking_type`.
    pub fn builtin(booking_type: BookingType) -> Self {
        match booking_type {
            BookingType::Inbound => Self {
                prefix: 'I',
                dispatch_prefix: None,
                pre_scan: vec![AssetStatus::Issued],
                in_draft: AssetStatus::ReservedForReturn,
                steady: AssetStatus::Available,
                requires_routing: true,
            },
            BookingType::Outbound => Self {
                prefix: 'O',
                dispatch_prefix: Some('S'),
                pre_scan: vec![AssetStatus::Available],
                in_draft: AssetStatus::ReservedForIssue,
                steady: AssetStatus::Issued,
                requires_routing: true,
            },
            BookingType::DefectRequest => Self {
                prefix: 'D',
                dispatch_prefix: None,
                pre_scan: vec![AssetStatus::Available, AssetStatus::AwaitingPickup],
                in_draft: AssetStatus::ReservedForRepair,
                steady: AssetStatus::AwaitingRepair,
                requires_routing: false,
            },
            BookingType::RepairReturn => Self {
                prefix: 'R',
                dispatch_prefix: None,
                pre_scan: vec![AssetStatus::AwaitingRepair],
                in_draft: AssetStatus::ReservedFromRepair,
                steady: AssetStatus::Available,
                requires_routing: false,
            },
        }
    }

    /// The reference code prefix for the given objective.
    pub fn prefix_for(&self, objective: MovementObjective) -> char {
        match objective {
            MovementObjective::Standard => self.prefix,
            MovementObjective::RepairDispatch => self.dispatch_prefix.unwrap_or(self.prefix),
        }
    }

    /// The preferred pre-scan status, used as the reversal fallback.
    pub fn primary_pre_scan(&self) -> AssetStatus {
        self.pre_scan[0]
    }
}

fn default_inbound() -> MovementProfile {
    MovementProfile::builtin(BookingType::Inbound)
}

fn default_outbound() -> MovementProfile {
    MovementProfile::builtin(BookingType::Outbound)
}

fn default_defect_request() -> MovementProfile {
    MovementProfile::builtin(BookingType::DefectRequest)
}

fn default_repair_return() -> MovementProfile {
    MovementProfile::builtin(BookingType::RepairReturn)
}

// ─── Profile Table ───────────────────────────────────────────────────

/// The complete profile table, one entry per booking type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    #[serde(default = "default_inbound")]
    pub inbound: MovementProfile,
    #[serde(default = "default_outbound")]
    pub outbound: MovementProfile,
    #[serde(default = "default_defect_request")]
    pub defect_request: MovementProfile,
    #[serde(default = "default_repair_return")]
    pub repair_return: MovementProfile,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileTable {
    /// The built-in table covering the four workflows.
    pub fn builtin() -> Self {
        Self {
            inbound: default_inbound(),
            outbound: default_outbound(),
            defect_request: default_defect_request(),
            repair_return: default_repair_return(),
        }
    }

    /// The profile for `booking_type`.
    pub fn get(&self, booking_type: BookingType) -> &MovementProfile {
        match booking_type {
            BookingType::Inbound => &self.inbound,
            BookingType::Outbound => &self.outbound,
            BookingType::DefectRequest => &self.defect_request,
            BookingType::RepairReturn => &self.repair_return,
        }
    }

    /// Parse a YAML overlay document and validate the merged table.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Yaml`] when the document does not parse and
    /// [`ProfileError::Invalid`] when the merged table fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        let table: Self = serde_yaml::from_str(yaml)?;
        let problems = table.validate();
        if !problems.is_empty() {
            return Err(ProfileError::Invalid(problems));
        }
        Ok(table)
    }

    /// Check structural rules, returning a list of problems. An empty list
    /// means the table is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut prefixes: Vec<(char, &'static str)> = Vec::new();

        for booking_type in BookingType::all() {
            let profile = self.get(*booking_type);
            let name = booking_type.as_str();

            if !profile.prefix.is_ascii_uppercase() {
                problems.push(format!(
                    "{name}: prefix {:?} is not an uppercase ASCII letter",
                    profile.prefix
                ));
            }
            prefixes.push((profile.prefix, name));
            if let Some(dispatch) = profile.dispatch_prefix {
                if !dispatch.is_ascii_uppercase() {
                    problems.push(format!(
                        "{name}: dispatch prefix {dispatch:?} is not an uppercase ASCII letter"
                    ));
                }
                prefixes.push((dispatch, name));
            }

            if profile.pre_scan.is_empty() {
                problems.push(format!("{name}: pre_scan status list is empty"));
            }
            for status in &profile.pre_scan {
                if status.is_reserved() {
                    problems.push(format!(
                        "{name}: pre_scan status {status} is a reserved status"
                    ));
                }
            }
            if !profile.in_draft.is_reserved() {
                problems.push(format!(
                    "{name}: in-draft status {} is not a reserved status",
                    profile.in_draft
                ));
            }
            if profile.steady.is_reserved() {
                problems.push(format!(
                    "{name}: steady status {} is a reserved status",
                    profile.steady
                ));
            }
        }

        prefixes.sort_unstable();
        for window in prefixes.windows(2) {
            if window[0].0 == window[1].0 {
                problems.push(format!(
                    "prefix {:?} is claimed by both {} and {}",
                    window[0].0, window[0].1, window[1].1
                ));
            }
        }

        problems
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        assert!(ProfileTable::builtin().validate().is_empty());
    }

    #[test]
    fn builtin_prefixes() {
        let table = ProfileTable::builtin();
        assert_eq!(table.get(BookingType::Inbound).prefix, 'I');
        assert_eq!(table.get(BookingType::Outbound).prefix, 'O');
        assert_eq!(table.get(BookingType::DefectRequest).prefix, 'D');
        assert_eq!(table.get(BookingType::RepairReturn).prefix, 'R');
    }

    #[test]
    fn dispatch_prefix_only_changes_outbound() {
        let table = ProfileTable::builtin();
        let outbound = table.get(BookingType::Outbound);
        assert_eq!(outbound.prefix_for(MovementObjective::Standard), 'O');
        assert_eq!(outbound.prefix_for(MovementObjective::RepairDispatch), 'S');

        // No dispatch prefix declared: falls back to the standard one.
        let inbound = table.get(BookingType::Inbound);
        assert_eq!(inbound.prefix_for(MovementObjective::RepairDispatch), 'I');
    }

    #[test]
    fn defect_request_accepts_two_source_statuses() {
        let profile = MovementProfile::builtin(BookingType::DefectRequest);
        assert_eq!(
            profile.pre_scan,
            vec![AssetStatus::Available, AssetStatus::AwaitingPickup]
        );
        assert_eq!(profile.primary_pre_scan(), AssetStatus::Available);
    }

    #[test]
    fn yaml_overlay_keeps_untouched_entries() {
        let table = ProfileTable::from_yaml(
            r#"
outbound:
  prefix: X
  dispatch_prefix: Y
  pre_scan: [AVAILABLE]
  in_draft: RESERVED_FOR_ISSUE
  steady: ISSUED
  requires_routing: true
"#,
        )
        .unwrap();

        assert_eq!(table.outbound.prefix, 'X');
        assert_eq!(table.outbound.dispatch_prefix, Some('Y'));
        // The other three entries stay built-in.
        assert_eq!(table.inbound, MovementProfile::builtin(BookingType::Inbound));
        assert_eq!(
            table.repair_return,
            MovementProfile::builtin(BookingType::RepairReturn)
        );
    }

    #[test]
    fn yaml_rejects_duplicate_prefix() {
        let err = ProfileTable::from_yaml(
            r#"
outbound:
  prefix: I
  dispatch_prefix: null
  pre_scan: [AVAILABLE]
  in_draft: RESERVED_FOR_ISSUE
  steady: ISSUED
  requires_routing: true
"#,
        )
        .unwrap_err();
        match err {
            ProfileError::Invalid(problems) => {
                assert!(problems.iter().any(|p| p.contains("'I'")), "{problems:?}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn validate_catches_non_reserved_in_draft() {
        let mut table = ProfileTable::builtin();
        table.inbound.in_draft = AssetStatus::Issued;
        let problems = table.validate();
        assert!(problems.iter().any(|p| p.contains("in-draft")), "{problems:?}");
    }

    #[test]
    fn validate_catches_reserved_pre_scan_and_empty_list() {
        let mut table = ProfileTable::builtin();
        table.outbound.pre_scan = vec![AssetStatus::ReservedForIssue];
        assert!(!table.validate().is_empty());

        table.outbound.pre_scan = Vec::new();
        let problems = table.validate();
        assert!(problems.iter().any(|p| p.contains("empty")), "{problems:?}");
    }

    #[test]
    fn validate_catches_reserved_steady() {
        let mut table = ProfileTable::builtin();
        table.repair_return.steady = AssetStatus::ReservedFromRepair;
        assert!(!table.validate().is_empty());
    }

    #[test]
    fn yaml_parse_error_is_reported() {
        let err = ProfileTable::from_yaml("outbound: [not, a, map]").unwrap_err();
        assert!(matches!(err, ProfileError::Yaml(_)));
    }
}
