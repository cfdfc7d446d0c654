//! Vendor search strategies.
//!
//! - [`StrictAllocation`]: every eligibility rule, ranked by rating then load.
//! - [`PincodeOnlyFallbackAllocation`]: any approved vendor with an active
//!   pincode row, ranked by rating. Ignores city, online flag, vacation,
//!   hours, slot enrolment, holidays, capacity and stock.
//!
//! [`AllocationPolicy`] tries the primary strategy first and the fallback
//! only when the primary produced nothing.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::allocation::{
    directory::{VendorDirectory, VendorStatus},
    eligibility::{EligibilityQuery, eligible_vendors},
    ranker::{RankedVendor, rank, rank_by_rating},
};

/// Everything a strategy may look at besides the directory.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    /// City of the resolved delivery zone; `None` when the zone lookup failed.
    pub city_id: Option<i32>,
    /// `None` when the slot slug is not in the catalog.
    pub slot_id: Option<i32>,
    pub date: NaiveDate,
    pub product_ids: Vec<i32>,
    pub required_lead_time_hours: i32,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    Strict,
    Fallback,
}

impl AllocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationKind::Strict => "STRICT",
            AllocationKind::Fallback => "FALLBACK",
        }
    }
}

/// Label stored on orders that no strategy could place.
pub const UNASSIGNED: &str = "UNASSIGNED";

pub trait AllocationStrategy: Send + Sync + fmt::Debug {
    /// Candidate vendors, best first.
    fn candidates(&self, request: &AllocationRequest, directory: &VendorDirectory)
    -> Vec<RankedVendor>;

    /// Strict candidates must win a capacity reservation; fallback ones are
    /// booked unconditionally.
    fn kind(&self) -> AllocationKind;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrictAllocation;

impl AllocationStrategy for StrictAllocation {
    fn candidates(
        &self,
        request: &AllocationRequest,
        directory: &VendorDirectory,
    ) -> Vec<RankedVendor> {
        let (Some(city_id), Some(slot_id)) = (request.city_id, request.slot_id) else {
            return Vec::new();
        };

        let query = EligibilityQuery {
            city_id,
            slot_id,
            date: request.date,
            product_ids: &request.product_ids,
            required_lead_time_hours: request.required_lead_time_hours,
            now: request.now,
        };

        let eligible = eligible_vendors(&query, &directory.candidates)
            .into_iter()
            .map(|vendor| RankedVendor {
                vendor_id: vendor.vendor_id,
                rating: vendor.rating,
                booked_orders: vendor.booked_orders(request.date, slot_id),
            })
            .collect();
        rank(eligible)
    }

    fn kind(&self) -> AllocationKind {
        AllocationKind::Strict
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PincodeOnlyFallbackAllocation;

impl AllocationStrategy for PincodeOnlyFallbackAllocation {
    fn candidates(
        &self,
        request: &AllocationRequest,
        directory: &VendorDirectory,
    ) -> Vec<RankedVendor> {
        let serving = directory
            .candidates
            .iter()
            .filter(|vendor| vendor.pincode_active && vendor.status == VendorStatus::Approved)
            .map(|vendor| RankedVendor {
                vendor_id: vendor.vendor_id,
                rating: vendor.rating,
                booked_orders: request
                    .slot_id
                    .map(|slot_id| vendor.booked_orders(request.date, slot_id))
                    .unwrap_or(0),
            })
            .collect();
        rank_by_rating(serving)
    }

    fn kind(&self) -> AllocationKind {
        AllocationKind::Fallback
    }

    fn name(&self) -> &'static str {
        "pincode-only-fallback"
    }
}

#[derive(Debug)]
pub struct AllocationPolicy {
    primary: Box<dyn AllocationStrategy>,
    fallback: Box<dyn AllocationStrategy>,
}

impl AllocationPolicy {
    pub fn new(
        primary: Box<dyn AllocationStrategy>,
        fallback: Box<dyn AllocationStrategy>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &dyn AllocationStrategy {
        self.primary.as_ref()
    }

    pub fn fallback(&self) -> &dyn AllocationStrategy {
        self.fallback.as_ref()
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::new(
            Box::new(StrictAllocation),
            Box::new(PincodeOnlyFallbackAllocation),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;
    use crate::allocation::directory::{StockedProduct, VendorCandidate, WorkingDay};

    const SLOT: i32 = 1;
    const PRODUCT: i32 = 7;

    fn request() -> AllocationRequest {
        AllocationRequest {
            city_id: Some(1),
            slot_id: Some(SLOT),
            date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            product_ids: vec![PRODUCT],
            required_lead_time_hours: 2,
            now: Utc.with_ymd_and_hms(2024, 12, 20, 9, 0, 0).unwrap(),
        }
    }

    fn vendor(id: i32, rating: f64) -> VendorCandidate {
        VendorCandidate {
            vendor_id: id,
            city_id: 1,
            status: VendorStatus::Approved,
            is_online: true,
            vacation_start: None,
            vacation_end: None,
            rating,
            commission_rate: 12.0,
            pincode_active: true,
            pincode_charge: 0.0,
            working_hours: (0..7)
                .map(|day| WorkingDay {
                    day_of_week: day,
                    is_closed: false,
                })
                .collect(),
            slots: HashMap::from([(SLOT, true)]),
            holidays: vec![],
            capacities: vec![],
            products: HashMap::from([(
                PRODUCT,
                StockedProduct {
                    preparation_minutes: 60,
                    is_available: true,
                },
            )]),
        }
    }

    fn ids(ranked: &[RankedVendor]) -> Vec<i32> {
        ranked.iter().map(|v| v.vendor_id).collect()
    }

    #[test]
    fn strict_needs_a_resolved_zone_and_slot() {
        let directory = VendorDirectory::new(vec![vendor(1, 4.0)]);
        let no_zone = AllocationRequest {
            city_id: None,
            ..request()
        };
        let no_slot = AllocationRequest {
            slot_id: None,
            ..request()
        };
        assert!(StrictAllocation.candidates(&no_zone, &directory).is_empty());
        assert!(StrictAllocation.candidates(&no_slot, &directory).is_empty());
        assert_eq!(ids(&StrictAllocation.candidates(&request(), &directory)), vec![1]);
    }

    #[test]
    fn fallback_ignores_operational_constraints() {
        let closed_offline = VendorCandidate {
            is_online: false,
            working_hours: vec![],
            slots: HashMap::new(),
            products: HashMap::new(),
            city_id: 42,
            ..vendor(1, 4.2)
        };
        let directory = VendorDirectory::new(vec![closed_offline]);

        assert!(StrictAllocation.candidates(&request(), &directory).is_empty());
        assert_eq!(
            ids(&PincodeOnlyFallbackAllocation.candidates(&request(), &directory)),
            vec![1]
        );
    }

    #[test]
    fn fallback_still_requires_approval_and_active_pincode() {
        let pending = VendorCandidate {
            status: VendorStatus::Pending,
            ..vendor(1, 5.0)
        };
        let inactive_pincode = VendorCandidate {
            pincode_active: false,
            ..vendor(2, 5.0)
        };
        let directory = VendorDirectory::new(vec![pending, inactive_pincode, vendor(3, 1.0)]);
        assert_eq!(
            ids(&PincodeOnlyFallbackAllocation.candidates(&request(), &directory)),
            vec![3]
        );
    }

    #[test]
    fn default_policy_is_strict_then_fallback() {
        let policy = AllocationPolicy::default();
        assert_eq!(policy.primary().kind(), AllocationKind::Strict);
        assert_eq!(policy.fallback().kind(), AllocationKind::Fallback);
    }
}
