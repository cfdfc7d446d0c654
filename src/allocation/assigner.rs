use crate::allocation::{
    capacity::{CapacityError, CapacityKey, CapacityStore},
    directory::VendorDirectory,
    strategy::{AllocationKind, AllocationPolicy, AllocationRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub vendor_id: i32,
    pub kind: AllocationKind,
    pub strategy: &'static str,
}

/// Picks the vendor for an order and books its capacity.
#[derive(Debug)]
pub struct VendorAssigner {
    policy: AllocationPolicy,
    default_max_orders: i32,
}

impl VendorAssigner {
    pub fn new(policy: AllocationPolicy, default_max_orders: i32) -> Self {
        Self {
            policy,
            default_max_orders,
        }
    }

    /// Walks the primary ranking and keeps the first vendor whose reservation
    /// succeeds. When the ranking is empty or every reservation is lost, the
    /// top fallback vendor is taken and booked without a ceiling check.
    ///
    /// `Ok(None)` means nobody serves the pincode and the order stays
    /// unassigned.
    pub async fn assign<S: CapacityStore>(
        &self,
        store: &mut S,
        request: &AllocationRequest,
        directory: &VendorDirectory,
    ) -> Result<Option<Assignment>, CapacityError> {
        let primary = self.policy.primary();
        let ranked = primary.candidates(request, directory);

        if let Some(slot_id) = request.slot_id {
            for candidate in &ranked {
                let key = CapacityKey {
                    vendor_id: candidate.vendor_id,
                    date: request.date,
                    slot_id,
                };
                if store.reserve(key, self.default_max_orders).await? {
                    tracing::info!(
                        vendor_id = candidate.vendor_id,
                        strategy = primary.name(),
                        "Vendor assigned"
                    );
                    return Ok(Some(Assignment {
                        vendor_id: candidate.vendor_id,
                        kind: primary.kind(),
                        strategy: primary.name(),
                    }));
                }
                tracing::debug!(
                    vendor_id = candidate.vendor_id,
                    "Capacity taken by a concurrent order, trying next vendor"
                );
            }
        }

        let fallback = self.policy.fallback();
        let Some(top) = fallback.candidates(request, directory).into_iter().next() else {
            tracing::warn!(
                strict_candidates = ranked.len(),
                "No vendor serves this delivery, order left unassigned"
            );
            return Ok(None);
        };

        if let Some(slot_id) = request.slot_id {
            let key = CapacityKey {
                vendor_id: top.vendor_id,
                date: request.date,
                slot_id,
            };
            store.record_booking(key, self.default_max_orders).await?;
        }

        tracing::warn!(
            vendor_id = top.vendor_id,
            strategy = fallback.name(),
            strict_candidates = ranked.len(),
            "Vendor assigned by fallback, strict rules were not satisfied"
        );
        Ok(Some(Assignment {
            vendor_id: top.vendor_id,
            kind: fallback.kind(),
            strategy: fallback.name(),
        }))
    }
}

impl Default for VendorAssigner {
    fn default() -> Self {
        Self::new(AllocationPolicy::default(), 10)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::allocation::{
        capacity::InMemoryCapacityStore,
        directory::{CapacitySnapshot, StockedProduct, VendorCandidate, VendorStatus, WorkingDay},
    };

    const SLOT: i32 = 3;
    const PRODUCT: i32 = 11;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
    }

    fn request() -> AllocationRequest {
        AllocationRequest {
            city_id: Some(1),
            slot_id: Some(SLOT),
            date: date(),
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
            commission_rate: 10.0,
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
                    preparation_minutes: 30,
                    is_available: true,
                },
            )]),
        }
    }

    fn key(vendor_id: i32) -> CapacityKey {
        CapacityKey {
            vendor_id,
            date: date(),
            slot_id: SLOT,
        }
    }

    #[tokio::test]
    async fn best_ranked_vendor_wins_and_is_booked() {
        let directory = VendorDirectory::new(vec![vendor(1, 4.1), vendor(2, 4.8)]);
        let mut store = InMemoryCapacityStore::new();

        let assignment = VendorAssigner::default()
            .assign(&mut store, &request(), &directory)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assignment.vendor_id, 2);
        assert_eq!(assignment.kind, AllocationKind::Strict);
        assert_eq!(store.get(&key(2)).unwrap().booked_orders, 1);
        assert!(store.get(&key(1)).is_none());
    }

    #[tokio::test]
    async fn lost_reservation_moves_to_next_candidate() {
        // Snapshot says there is room, but the store was filled in the meantime.
        let top = VendorCandidate {
            capacities: vec![CapacitySnapshot {
                date: date(),
                slot_id: SLOT,
                max_orders: 5,
                booked_orders: 4,
            }],
            ..vendor(1, 5.0)
        };
        let directory = VendorDirectory::new(vec![top, vendor(2, 4.0)]);
        let mut store = InMemoryCapacityStore::new();
        store.set(key(1), 5, 5);

        let assignment = VendorAssigner::default()
            .assign(&mut store, &request(), &directory)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assignment.vendor_id, 2);
        assert_eq!(assignment.kind, AllocationKind::Strict);
        assert_eq!(store.get(&key(1)).unwrap().booked_orders, 5);
    }

    #[tokio::test]
    async fn every_reservation_lost_falls_back_to_top_rated() {
        let directory = VendorDirectory::new(vec![vendor(1, 4.0), vendor(2, 4.5)]);
        let mut store = InMemoryCapacityStore::new();
        store.set(key(1), 2, 2);
        store.set(key(2), 2, 2);

        let assignment = VendorAssigner::default()
            .assign(&mut store, &request(), &directory)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assignment.vendor_id, 2);
        assert_eq!(assignment.kind, AllocationKind::Fallback);
        assert_eq!(store.get(&key(2)).unwrap().booked_orders, 3);
    }

    #[tokio::test]
    async fn unknown_slot_uses_fallback_without_booking() {
        let directory = VendorDirectory::new(vec![vendor(1, 4.0)]);
        let mut store = InMemoryCapacityStore::new();
        let request = AllocationRequest {
            slot_id: None,
            ..request()
        };

        let assignment = VendorAssigner::default()
            .assign(&mut store, &request, &directory)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(assignment.kind, AllocationKind::Fallback);
        assert!(store.get(&key(1)).is_none());
    }

    #[tokio::test]
    async fn nobody_serving_the_pincode_leaves_order_unassigned() {
        let mut store = InMemoryCapacityStore::new();
        let assignment = VendorAssigner::default()
            .assign(&mut store, &request(), &VendorDirectory::default())
            .await
            .unwrap();
        assert!(assignment.is_none());
    }
}
