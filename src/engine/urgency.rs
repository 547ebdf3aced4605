use serde::{Deserialize, Serialize};
use time::Date;

/// Whole days from `reference` until `expiration`; negative once expired.
pub fn days_remaining(expiration: Date, reference: Date) -> i64 {
    (expiration - reference).whole_days()
}

/// Urgency derived from the number of days left before expiration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    /// Already expired.
    Danger,
    /// 0..=2 days left.
    Warning,
    /// 3..=7 days left.
    Info,
    /// More than a week left.
    Safe,
}

impl UrgencyTier {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => UrgencyTier::Danger,
            0..=2 => UrgencyTier::Warning,
            3..=7 => UrgencyTier::Info,
            _ => UrgencyTier::Safe,
        }
    }

    pub fn classify(expiration: Date, reference: Date) -> (i64, Self) {
        let days = days_remaining(expiration, reference);
        (days, Self::from_days(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(UrgencyTier::from_days(-30), UrgencyTier::Danger);
        assert_eq!(UrgencyTier::from_days(-1), UrgencyTier::Danger);
        assert_eq!(UrgencyTier::from_days(0), UrgencyTier::Warning);
        assert_eq!(UrgencyTier::from_days(2), UrgencyTier::Warning);
        assert_eq!(UrgencyTier::from_days(3), UrgencyTier::Info);
        assert_eq!(UrgencyTier::from_days(7), UrgencyTier::Info);
        assert_eq!(UrgencyTier::from_days(8), UrgencyTier::Safe);
        assert_eq!(UrgencyTier::from_days(365), UrgencyTier::Safe);
    }

    #[test]
    fn days_remaining_crosses_month_and_year() {
        assert_eq!(days_remaining(date!(2024 - 03 - 01), date!(2024 - 02 - 28)), 2);
        assert_eq!(days_remaining(date!(2023 - 12 - 30), date!(2024 - 01 - 02)), -3);
        assert_eq!(days_remaining(date!(2024 - 05 - 10), date!(2024 - 05 - 10)), 0);
    }

    #[test]
    fn classify_pairs_days_with_tier() {
        let today = date!(2024 - 06 - 15);
        assert_eq!(
            UrgencyTier::classify(date!(2024 - 06 - 14), today),
            (-1, UrgencyTier::Danger)
        );
        assert_eq!(
            UrgencyTier::classify(date!(2024 - 06 - 22), today),
            (7, UrgencyTier::Info)
        );
        assert_eq!(
            UrgencyTier::classify(date!(2024 - 06 - 23), today),
            (8, UrgencyTier::Safe)
        );
    }
}
