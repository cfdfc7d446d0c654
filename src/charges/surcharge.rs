use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{charges::money::to_decimal, models::PlatformSurchargeEntity};

/// Does the promotional surcharge apply to an order delivered on `date` in
/// `slot_id` containing products of `category_slugs`?
pub fn platform_surcharge_applies(
    surcharge: &PlatformSurchargeEntity,
    date: NaiveDate,
    slot_id: Option<i32>,
    category_slugs: &[String],
) -> bool {
    if !surcharge.is_active {
        return false;
    }
    if date < surcharge.starts_on || date > surcharge.ends_on {
        return false;
    }
    if let Some(restricted_slot) = surcharge.slot_id {
        if slot_id != Some(restricted_slot) {
            return false;
        }
    }
    match &surcharge.category_slug {
        Some(slug) => category_slugs.iter().any(|c| c == slug),
        None => true,
    }
}

pub fn platform_surcharge_total(
    surcharges: &[PlatformSurchargeEntity],
    date: NaiveDate,
    slot_id: Option<i32>,
    category_slugs: &[String],
) -> Decimal {
    surcharges
        .iter()
        .filter(|s| platform_surcharge_applies(s, date, slot_id, category_slugs))
        .map(|s| to_decimal(s.amount))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valentine_week() -> PlatformSurchargeEntity {
        PlatformSurchargeEntity {
            id: 1,
            name: "Valentine Week".into(),
            amount: 99.0,
            starts_on: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2025, 2, 16).unwrap(),
            slot_id: None,
            category_slug: Some("flowers".into()),
            is_active: true,
        }
    }

    fn feb(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    }

    #[test]
    fn category_restricted_surcharge_matches_only_that_category() {
        let surcharges = vec![valentine_week()];
        let flowers = vec!["flowers".to_string()];
        let cakes = vec!["cakes".to_string()];

        assert_eq!(
            platform_surcharge_total(&surcharges, feb(14), Some(1), &flowers),
            dec!(99)
        );
        assert_eq!(
            platform_surcharge_total(&surcharges, feb(14), Some(1), &cakes),
            Decimal::ZERO
        );
    }

    #[test]
    fn date_range_is_inclusive() {
        let s = valentine_week();
        let flowers = vec!["flowers".to_string()];
        assert!(platform_surcharge_applies(&s, feb(10), None, &flowers));
        assert!(platform_surcharge_applies(&s, feb(16), None, &flowers));
        assert!(!platform_surcharge_applies(&s, feb(17), None, &flowers));
        assert!(!platform_surcharge_applies(&s, feb(9), None, &flowers));
    }

    #[test]
    fn slot_restriction_requires_the_same_slot() {
        let s = PlatformSurchargeEntity {
            slot_id: Some(3),
            category_slug: None,
            ..valentine_week()
        };
        assert!(platform_surcharge_applies(&s, feb(14), Some(3), &[]));
        assert!(!platform_surcharge_applies(&s, feb(14), Some(4), &[]));
        assert!(!platform_surcharge_applies(&s, feb(14), None, &[]));
    }

    #[test]
    fn inactive_surcharge_never_applies() {
        let s = PlatformSurchargeEntity {
            is_active: false,
            ..valentine_week()
        };
        assert!(!platform_surcharge_applies(
            &s,
            feb(14),
            None,
            &["flowers".to_string()]
        ));
    }

    #[test]
    fn several_matching_surcharges_add_up() {
        let unrestricted = PlatformSurchargeEntity {
            id: 2,
            amount: 20.5,
            category_slug: None,
            ..valentine_week()
        };
        let surcharges = vec![valentine_week(), unrestricted];
        let total =
            platform_surcharge_total(&surcharges, feb(12), None, &["flowers".to_string()]);
        assert_eq!(total, dec!(119.5));
    }
}
