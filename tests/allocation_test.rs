use std::{collections::HashMap, sync::Arc};

use chrono::{NaiveDate, TimeZone, Utc};
use storefront_orderservice::allocation::{
    AllocationKind, AllocationPolicy, AllocationRequest, VendorAssigner,
    capacity::{CapacityKey, CapacityStore, InMemoryCapacityStore},
    directory::{
        CapacitySnapshot, Holiday, StockedProduct, VendorCandidate, VendorDirectory, VendorStatus,
        WorkingDay,
    },
};

const EXPRESS: i32 = 2;
const CAKE: i32 = 101;

fn christmas() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
}

fn request() -> AllocationRequest {
    AllocationRequest {
        city_id: Some(1),
        slot_id: Some(EXPRESS),
        date: christmas(),
        product_ids: vec![CAKE],
        required_lead_time_hours: 4,
        now: Utc.with_ymd_and_hms(2024, 12, 24, 8, 0, 0).unwrap(),
    }
}

fn bakery(id: i32, rating: f64) -> VendorCandidate {
    VendorCandidate {
        vendor_id: id,
        city_id: 1,
        status: VendorStatus::Approved,
        is_online: true,
        vacation_start: None,
        vacation_end: None,
        rating,
        commission_rate: 15.0,
        pincode_active: true,
        pincode_charge: 0.0,
        working_hours: (0..7)
            .map(|day| WorkingDay {
                day_of_week: day,
                is_closed: false,
            })
            .collect(),
        slots: HashMap::from([(EXPRESS, true)]),
        holidays: vec![],
        capacities: vec![],
        products: HashMap::from([(
            CAKE,
            StockedProduct {
                preparation_minutes: 120,
                is_available: true,
            },
        )]),
    }
}

fn key(vendor_id: i32) -> CapacityKey {
    CapacityKey {
        vendor_id,
        date: christmas(),
        slot_id: EXPRESS,
    }
}

fn assigner() -> VendorAssigner {
    VendorAssigner::new(AllocationPolicy::default(), 10)
}

#[tokio::test]
async fn full_vendor_is_skipped_for_one_with_room() {
    let full = VendorCandidate {
        capacities: vec![CapacitySnapshot {
            date: christmas(),
            slot_id: EXPRESS,
            max_orders: 10,
            booked_orders: 10,
        }],
        ..bakery(1, 4.9)
    };
    let almost_full = VendorCandidate {
        capacities: vec![CapacitySnapshot {
            date: christmas(),
            slot_id: EXPRESS,
            max_orders: 10,
            booked_orders: 9,
        }],
        ..bakery(2, 4.0)
    };
    let directory = VendorDirectory::new(vec![full, almost_full]);
    let mut store = InMemoryCapacityStore::new();
    store.set(key(1), 10, 10);
    store.set(key(2), 10, 9);

    let assignment = assigner()
        .assign(&mut store, &request(), &directory)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(assignment.vendor_id, 2);
    assert_eq!(assignment.kind, AllocationKind::Strict);
    assert_eq!(store.get(&key(2)).unwrap().booked_orders, 10);
    assert_eq!(store.get(&key(1)).unwrap().booked_orders, 10);
}

#[tokio::test]
async fn full_day_holiday_sends_order_to_fallback() {
    let on_holiday = VendorCandidate {
        holidays: vec![Holiday {
            date: christmas(),
            blocked_slot_ids: Some(vec![]),
        }],
        ..bakery(1, 4.5)
    };
    let directory = VendorDirectory::new(vec![on_holiday]);
    let mut store = InMemoryCapacityStore::new();

    let assignment = assigner()
        .assign(&mut store, &request(), &directory)
        .await
        .unwrap()
        .unwrap();

    // The relaxed search still books the vendor.
    assert_eq!(assignment.vendor_id, 1);
    assert_eq!(assignment.kind, AllocationKind::Fallback);
    assert_eq!(store.get(&key(1)).unwrap().booked_orders, 1);
}

#[tokio::test]
async fn unknown_zone_still_finds_an_approved_vendor() {
    let directory = VendorDirectory::new(vec![
        VendorCandidate {
            status: VendorStatus::Suspended,
            ..bakery(1, 5.0)
        },
        bakery(2, 3.5),
    ]);
    let request = AllocationRequest {
        city_id: None,
        ..request()
    };
    let mut store = InMemoryCapacityStore::new();

    let assignment = assigner()
        .assign(&mut store, &request, &directory)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(assignment.vendor_id, 2);
    assert_eq!(assignment.kind, AllocationKind::Fallback);
}

#[tokio::test]
async fn sequential_orders_never_exceed_the_ceiling() {
    let directory = VendorDirectory::new(vec![bakery(1, 4.5), bakery(2, 4.5)]);
    let mut store = InMemoryCapacityStore::new();
    store.set(key(1), 3, 0);
    store.set(key(2), 2, 0);

    let mut strict = Vec::new();
    for _ in 0..5 {
        let assignment = assigner()
            .assign(&mut store, &request(), &directory)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assignment.kind, AllocationKind::Strict);
        strict.push(assignment.vendor_id);

        for vendor_id in [1, 2] {
            let counts = store.get(&key(vendor_id)).unwrap();
            assert!(counts.booked_orders <= counts.max_orders);
        }
    }

    assert_eq!(strict.iter().filter(|id| **id == 1).count(), 3);
    assert_eq!(strict.iter().filter(|id| **id == 2).count(), 2);
}

#[tokio::test]
async fn concurrent_reservations_respect_the_ceiling() {
    let store = InMemoryCapacityStore::new();
    store.set(key(1), 10, 0);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let mut store = store.clone();
        handles.push(tokio::spawn(async move {
            store.reserve(key(1), 10).await.unwrap()
        }));
    }

    let mut taken = 0;
    for handle in handles {
        if handle.await.unwrap() {
            taken += 1;
        }
    }

    assert_eq!(taken, 10);
    assert_eq!(store.get(&key(1)).unwrap().booked_orders, 10);
}

#[tokio::test]
async fn concurrent_orders_overflow_into_fallback_once_capacity_is_gone() {
    let directory = Arc::new(VendorDirectory::new(vec![bakery(1, 4.7)]));
    let assigner = Arc::new(assigner());
    let store = InMemoryCapacityStore::new();
    store.set(key(1), 10, 0);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let mut store = store.clone();
        let directory = Arc::clone(&directory);
        let assigner = Arc::clone(&assigner);
        handles.push(tokio::spawn(async move {
            assigner
                .assign(&mut store, &request(), &directory)
                .await
                .unwrap()
                .unwrap()
                .kind
        }));
    }

    let mut kinds = Vec::new();
    for handle in handles {
        kinds.push(handle.await.unwrap());
    }

    let strict = kinds.iter().filter(|k| **k == AllocationKind::Strict).count();
    let fallback = kinds.iter().filter(|k| **k == AllocationKind::Fallback).count();
    assert_eq!(strict, 10);
    assert_eq!(fallback, 10);
}
