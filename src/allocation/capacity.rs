//! Per (vendor, date, slot) order counters.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use chrono::NaiveDate;
use diesel::sql_types::{Date, Integer};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityKey {
    pub vendor_id: i32,
    pub date: NaiveDate,
    pub slot_id: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum CapacityError {
    #[error("capacity store query failed: {0}")]
    Store(#[from] diesel::result::Error),
}

pub trait CapacityStore {
    /// Books one order if the counter is below its ceiling. A missing row is
    /// created with `default_max_orders` and one booking. Returns whether the
    /// booking was taken.
    fn reserve(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> impl Future<Output = Result<bool, CapacityError>> + Send;

    /// Books one order regardless of the ceiling.
    fn record_booking(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> impl Future<Output = Result<(), CapacityError>> + Send;
}

const RESERVE_SQL: &str = "\
INSERT INTO vendor_capacities (vendor_id, delivery_date, slot_id, max_orders, booked_orders) \
VALUES ($1, $2, $3, $4, 1) \
ON CONFLICT (vendor_id, delivery_date, slot_id) DO UPDATE \
SET booked_orders = vendor_capacities.booked_orders + 1, updated_at = NOW() \
WHERE vendor_capacities.booked_orders < vendor_capacities.max_orders";

const RECORD_BOOKING_SQL: &str = "\
INSERT INTO vendor_capacities (vendor_id, delivery_date, slot_id, max_orders, booked_orders) \
VALUES ($1, $2, $3, $4, 1) \
ON CONFLICT (vendor_id, delivery_date, slot_id) DO UPDATE \
SET booked_orders = vendor_capacities.booked_orders + 1, updated_at = NOW()";

async fn upsert(
    conn: &mut AsyncPgConnection,
    sql: &'static str,
    key: CapacityKey,
    default_max_orders: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::sql_query(sql)
        .bind::<Integer, _>(key.vendor_id)
        .bind::<Date, _>(key.date)
        .bind::<Integer, _>(key.slot_id)
        .bind::<Integer, _>(default_max_orders)
        .execute(conn)
        .await
}

/// Outcome of one reservation savepoint.
enum ReserveAttempt {
    Full,
    Store(diesel::result::Error),
}

impl From<diesel::result::Error> for ReserveAttempt {
    fn from(err: diesel::result::Error) -> Self {
        Self::Store(err)
    }
}

/// Postgres-backed store. Borrow the order transaction's connection so a
/// reservation commits or rolls back together with the order.
pub struct PgCapacityStore<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> PgCapacityStore<'c> {
    pub fn new(conn: &'c mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

impl CapacityStore for PgCapacityStore<'_> {
    /// Each attempt runs in its own savepoint. A conflicting upsert whose
    /// `WHERE` fails still locks the row, so a refused attempt is rolled back
    /// to release it before the next vendor is tried.
    async fn reserve(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> Result<bool, CapacityError> {
        let attempt = self
            .conn
            .transaction::<_, ReserveAttempt, _>(move |conn| {
                Box::pin(async move {
                    match upsert(conn, RESERVE_SQL, key, default_max_orders).await? {
                        1 => Ok(()),
                        _ => Err(ReserveAttempt::Full),
                    }
                })
            })
            .await;

        match attempt {
            Ok(()) => Ok(true),
            Err(ReserveAttempt::Full) => Ok(false),
            Err(ReserveAttempt::Store(err)) => Err(err.into()),
        }
    }

    async fn record_booking(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> Result<(), CapacityError> {
        upsert(&mut *self.conn, RECORD_BOOKING_SQL, key, default_max_orders).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityCounts {
    pub max_orders: i32,
    pub booked_orders: i32,
}

/// Shared in-process store with the same semantics as the Postgres one.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCapacityStore {
    rows: Arc<Mutex<HashMap<CapacityKey, CapacityCounts>>>,
}

impl InMemoryCapacityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: CapacityKey, max_orders: i32, booked_orders: i32) {
        self.lock().insert(
            key,
            CapacityCounts {
                max_orders,
                booked_orders,
            },
        );
    }

    pub fn get(&self, key: &CapacityKey) -> Option<CapacityCounts> {
        self.lock().get(key).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CapacityKey, CapacityCounts>> {
        // A poisoned map still holds consistent counters; every update is a single insert.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CapacityStore for InMemoryCapacityStore {
    async fn reserve(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> Result<bool, CapacityError> {
        let mut rows = self.lock();
        let row = rows.entry(key).or_insert(CapacityCounts {
            max_orders: default_max_orders,
            booked_orders: 0,
        });
        if row.booked_orders < row.max_orders {
            row.booked_orders += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn record_booking(
        &mut self,
        key: CapacityKey,
        default_max_orders: i32,
    ) -> Result<(), CapacityError> {
        let mut rows = self.lock();
        rows.entry(key)
            .or_insert(CapacityCounts {
                max_orders: default_max_orders,
                booked_orders: 0,
            })
            .booked_orders += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CapacityKey {
        CapacityKey {
            vendor_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            slot_id: 2,
        }
    }

    #[tokio::test]
    async fn first_reservation_creates_row_with_default_ceiling() {
        let mut store = InMemoryCapacityStore::new();
        assert!(store.reserve(key(), 10).await.unwrap());
        assert_eq!(
            store.get(&key()),
            Some(CapacityCounts {
                max_orders: 10,
                booked_orders: 1
            })
        );
    }

    #[tokio::test]
    async fn sequential_reservations_stop_at_the_ceiling() {
        let mut store = InMemoryCapacityStore::new();
        store.set(key(), 3, 0);

        let mut taken = 0;
        for _ in 0..5 {
            if store.reserve(key(), 10).await.unwrap() {
                taken += 1;
            }
            let counts = store.get(&key()).unwrap();
            assert!(counts.booked_orders <= counts.max_orders);
        }
        assert_eq!(taken, 3);
        assert_eq!(store.get(&key()).unwrap().booked_orders, 3);
    }

    #[tokio::test]
    async fn recorded_bookings_ignore_the_ceiling() {
        let mut store = InMemoryCapacityStore::new();
        store.set(key(), 1, 1);
        store.record_booking(key(), 10).await.unwrap();
        assert_eq!(store.get(&key()).unwrap().booked_orders, 2);
    }
}
