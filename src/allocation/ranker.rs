#[derive(Debug, Clone, PartialEq)]
pub struct RankedVendor {
    pub vendor_id: i32,
    pub rating: f64,
    pub booked_orders: i32,
}

/// Highest rating first, then the lighter load. Sorting is stable, so full
/// ties keep their input order.
pub fn rank(mut vendors: Vec<RankedVendor>) -> Vec<RankedVendor> {
    vendors.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| a.booked_orders.cmp(&b.booked_orders))
    });
    vendors
}

/// Rating only, used when load is unknown or irrelevant.
pub fn rank_by_rating(mut vendors: Vec<RankedVendor>) -> Vec<RankedVendor> {
    vendors.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    vendors
}
