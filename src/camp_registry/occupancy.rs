//! Derived camp status
//!
//! The stored status column only ever receives values computed here (or an
//! explicit operator override through the camp service), so the derived field
//! cannot drift from the occupancy it reflects.

use super::types::CampStatus;

/// Recompute a camp's status after an occupancy or explicit-status change
///
/// Rules:
/// - at or above capacity the camp is `Full`, whatever it was before
///   (`Full` takes precedence over `Emergency`);
/// - a `Full` camp that drops below capacity reopens as `Active`;
/// - `Inactive` and `Emergency` are operator-set and are never auto-changed
///   by an occupancy decrement.
pub fn derive_status(current: CampStatus, occupancy: u32, capacity: u32) -> CampStatus {
    if occupancy >= capacity {
        CampStatus::Full
    } else if current == CampStatus::Full {
        CampStatus::Active
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaching_capacity_flips_to_full() {
        assert_eq!(derive_status(CampStatus::Active, 10, 10), CampStatus::Full);
        assert_eq!(derive_status(CampStatus::Active, 12, 10), CampStatus::Full);
    }

    #[test]
    fn test_full_reopens_as_active_below_capacity() {
        assert_eq!(derive_status(CampStatus::Full, 9, 10), CampStatus::Active);
    }

    #[test]
    fn test_active_stays_active_below_capacity() {
        assert_eq!(derive_status(CampStatus::Active, 5, 10), CampStatus::Active);
    }

    #[test]
    fn test_inactive_never_auto_reactivates() {
        assert_eq!(
            derive_status(CampStatus::Inactive, 3, 10),
            CampStatus::Inactive
        );
        assert_eq!(
            derive_status(CampStatus::Inactive, 0, 10),
            CampStatus::Inactive
        );
    }

    #[test]
    fn test_emergency_kept_while_room_remains() {
        assert_eq!(
            derive_status(CampStatus::Emergency, 5, 10),
            CampStatus::Emergency
        );
    }

    #[test]
    fn test_full_takes_precedence_over_emergency() {
        assert_eq!(
            derive_status(CampStatus::Emergency, 10, 10),
            CampStatus::Full
        );
    }
}
