use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::allocation::directory::{VendorCandidate, VendorStatus};

#[derive(Debug, Clone)]
pub struct EligibilityQuery<'a> {
    pub city_id: i32,
    pub slot_id: i32,
    pub date: NaiveDate,
    pub product_ids: &'a [i32],
    pub required_lead_time_hours: i32,
    pub now: DateTime<Utc>,
}

/// First rule a vendor failed, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    PincodeInactive,
    OutsideCity,
    NotApproved,
    Offline,
    OnVacation,
    ClosedThatDay,
    SlotNotOffered,
    Holiday,
    AtCapacity,
    MissingProducts(Vec<i32>),
    LeadTimeExceeded { preparation_hours: i32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::PincodeInactive => write!(f, "pincode inactive"),
            Rejection::OutsideCity => write!(f, "outside city"),
            Rejection::NotApproved => write!(f, "not approved"),
            Rejection::Offline => write!(f, "offline"),
            Rejection::OnVacation => write!(f, "on vacation"),
            Rejection::ClosedThatDay => write!(f, "closed that day"),
            Rejection::SlotNotOffered => write!(f, "slot not offered"),
            Rejection::Holiday => write!(f, "holiday"),
            Rejection::AtCapacity => write!(f, "at capacity"),
            Rejection::MissingProducts(ids) => write!(f, "missing products {ids:?}"),
            Rejection::LeadTimeExceeded { preparation_hours } => {
                write!(f, "needs {preparation_hours}h of preparation")
            }
        }
    }
}

/// Hours needed to prepare `minutes` of work, rounded up.
pub fn preparation_hours(minutes: i32) -> i32 {
    let minutes = minutes.max(0);
    (minutes + 59) / 60
}

/// Runs the eligibility rules against one vendor, stopping at the first failure.
pub fn check(query: &EligibilityQuery<'_>, vendor: &VendorCandidate) -> Result<(), Rejection> {
    if !vendor.pincode_active {
        return Err(Rejection::PincodeInactive);
    }
    if vendor.city_id != query.city_id {
        return Err(Rejection::OutsideCity);
    }
    if vendor.status != VendorStatus::Approved {
        return Err(Rejection::NotApproved);
    }
    if !vendor.is_online {
        return Err(Rejection::Offline);
    }
    if vendor.is_on_vacation(query.now) {
        return Err(Rejection::OnVacation);
    }
    match vendor.working_day(query.date) {
        Some(day) if !day.is_closed => {}
        _ => return Err(Rejection::ClosedThatDay),
    }
    if !vendor.offers_slot(query.slot_id) {
        return Err(Rejection::SlotNotOffered);
    }
    if vendor
        .holiday_on(query.date)
        .is_some_and(|holiday| holiday.blocks(query.slot_id))
    {
        return Err(Rejection::Holiday);
    }
    // No capacity row means nothing has been booked yet.
    if vendor
        .capacity(query.date, query.slot_id)
        .is_some_and(|capacity| capacity.is_full())
    {
        return Err(Rejection::AtCapacity);
    }

    let missing: Vec<i32> = query
        .product_ids
        .iter()
        .copied()
        .filter(|id| !vendor.products.get(id).is_some_and(|p| p.is_available))
        .collect();
    if !missing.is_empty() {
        return Err(Rejection::MissingProducts(missing));
    }

    let slowest_minutes = query
        .product_ids
        .iter()
        .filter_map(|id| vendor.products.get(id))
        .map(|p| p.preparation_minutes)
        .max()
        .unwrap_or(0);
    let hours = preparation_hours(slowest_minutes);
    if hours > query.required_lead_time_hours {
        return Err(Rejection::LeadTimeExceeded {
            preparation_hours: hours,
        });
    }

    Ok(())
}

/// Narrows `candidates` to the vendors that pass every rule.
pub fn eligible_vendors<'c>(
    query: &EligibilityQuery<'_>,
    candidates: &'c [VendorCandidate],
) -> Vec<&'c VendorCandidate> {
    candidates
        .iter()
        .filter(|vendor| match check(query, vendor) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(vendor_id = vendor.vendor_id, %reason, "Vendor not eligible");
                false
            }
        })
        .collect()
}
