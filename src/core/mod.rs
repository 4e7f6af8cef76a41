// Core algorithm exports
pub mod compatibility;
pub mod eligibility;
pub mod filters;
pub mod matcher;
pub mod stats;

pub use compatibility::{can_donate_to, compatible_donor_groups, compatible_recipient_groups, donor_groups_for_label};
pub use eligibility::{is_eligible, eligible_date, next_eligible_date, ELIGIBILITY_WINDOW_DAYS};
pub use filters::{matches_donor_criteria, matches_request_criteria, matches_hospital_criteria};
pub use matcher::{MatchingEngine, MatchingOptions};
pub use stats::{donation_stats, blood_group_stats, donor_summary};
