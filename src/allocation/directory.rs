//! Read-only snapshot of the vendors serving a pincode, taken once per order.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    charges::{VendorCharges, money::to_decimal},
    models::{
        VendorAreaSurchargeEntity, VendorCapacityEntity, VendorEntity, VendorHolidayEntity,
        VendorPincodeEntity, VendorProductEntity, VendorSlotEntity, VendorWorkingHoursEntity,
    },
    schema::{
        vendor_area_surcharges, vendor_capacities, vendor_holidays, vendor_pincodes,
        vendor_products, vendor_slots, vendor_working_hours, vendors,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorStatus {
    Pending,
    Approved,
    Suspended,
    Terminated,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "PENDING",
            VendorStatus::Approved => "APPROVED",
            VendorStatus::Suspended => "SUSPENDED",
            VendorStatus::Terminated => "TERMINATED",
        }
    }

    /// Unknown values are treated as `Pending`, which never allocates.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => VendorStatus::Approved,
            "SUSPENDED" => VendorStatus::Suspended,
            "TERMINATED" => VendorStatus::Terminated,
            _ => VendorStatus::Pending,
        }
    }
}

/// Day-of-week index with Sunday = 0.
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingDay {
    pub day_of_week: i16,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holiday {
    pub date: NaiveDate,
    /// `None` or empty blocks the whole day.
    pub blocked_slot_ids: Option<Vec<i32>>,
}

impl Holiday {
    pub fn blocks(&self, slot_id: i32) -> bool {
        match &self.blocked_slot_ids {
            Some(slots) if !slots.is_empty() => slots.contains(&slot_id),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacitySnapshot {
    pub date: NaiveDate,
    pub slot_id: i32,
    pub max_orders: i32,
    pub booked_orders: i32,
}

impl CapacitySnapshot {
    pub fn is_full(&self) -> bool {
        self.booked_orders >= self.max_orders
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockedProduct {
    pub preparation_minutes: i32,
    pub is_available: bool,
}

/// Everything the allocator knows about one vendor serving the pincode.
#[derive(Debug, Clone)]
pub struct VendorCandidate {
    pub vendor_id: i32,
    pub city_id: i32,
    pub status: VendorStatus,
    pub is_online: bool,
    pub vacation_start: Option<DateTime<Utc>>,
    pub vacation_end: Option<DateTime<Utc>>,
    pub rating: f64,
    pub commission_rate: f64,
    pub pincode_active: bool,
    pub pincode_charge: f64,
    pub working_hours: Vec<WorkingDay>,
    /// slot id -> enabled
    pub slots: HashMap<i32, bool>,
    pub holidays: Vec<Holiday>,
    pub capacities: Vec<CapacitySnapshot>,
    /// product id -> stock row
    pub products: HashMap<i32, StockedProduct>,
}

impl VendorCandidate {
    pub fn is_on_vacation(&self, now: DateTime<Utc>) -> bool {
        match (self.vacation_start, self.vacation_end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    pub fn working_day(&self, date: NaiveDate) -> Option<&WorkingDay> {
        let day = day_of_week(date);
        self.working_hours.iter().find(|h| h.day_of_week == day)
    }

    pub fn offers_slot(&self, slot_id: i32) -> bool {
        self.slots.get(&slot_id).copied().unwrap_or(false)
    }

    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.iter().find(|h| h.date == date)
    }

    pub fn capacity(&self, date: NaiveDate, slot_id: i32) -> Option<&CapacitySnapshot> {
        self.capacities
            .iter()
            .find(|c| c.date == date && c.slot_id == slot_id)
    }

    /// Orders already booked for (date, slot); zero when no row exists yet.
    pub fn booked_orders(&self, date: NaiveDate, slot_id: i32) -> i32 {
        self.capacity(date, slot_id)
            .map(|c| c.booked_orders)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VendorDirectory {
    pub candidates: Vec<VendorCandidate>,
    /// vendor id -> active area surcharge for the order's zone
    pub area_surcharges: HashMap<i32, f64>,
}

impl VendorDirectory {
    pub fn new(candidates: Vec<VendorCandidate>) -> Self {
        Self {
            candidates,
            area_surcharges: HashMap::new(),
        }
    }

    pub fn candidate(&self, vendor_id: i32) -> Option<&VendorCandidate> {
        self.candidates.iter().find(|c| c.vendor_id == vendor_id)
    }

    pub fn vendor_charges(&self, vendor_id: i32) -> VendorCharges {
        let pincode_charge = self
            .candidate(vendor_id)
            .map(|c| c.pincode_charge)
            .filter(|charge| *charge > 0.0)
            .unwrap_or(0.0);
        let area_surcharge = self
            .area_surcharges
            .get(&vendor_id)
            .copied()
            .unwrap_or(0.0);

        VendorCharges {
            pincode_charge: to_decimal(pincode_charge),
            area_surcharge: to_decimal(area_surcharge),
        }
    }
}

pub struct DirectoryQuery<'a> {
    pub pincode: &'a str,
    pub slot_id: Option<i32>,
    pub zone_id: Option<i32>,
    pub date: NaiveDate,
    pub product_ids: &'a [i32],
}

/// Loads the snapshot of every vendor with a pincode row for `query.pincode`.
/// Rows are narrowed to the delivery date, its weekday and the slot.
pub async fn load_directory(
    conn: &mut AsyncPgConnection,
    query: DirectoryQuery<'_>,
) -> Result<VendorDirectory> {
    let pincode_rows: Vec<VendorPincodeEntity> = vendor_pincodes::table
        .filter(vendor_pincodes::pincode.eq(query.pincode))
        .select(VendorPincodeEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get vendor pincodes")?;

    if pincode_rows.is_empty() {
        return Ok(VendorDirectory::default());
    }

    let vendor_ids: Vec<i32> = pincode_rows.iter().map(|row| row.vendor_id).collect();

    let vendor_rows: Vec<VendorEntity> = vendors::table
        .filter(vendors::id.eq_any(&vendor_ids))
        .select(VendorEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get vendors")?;

    let hour_rows: Vec<VendorWorkingHoursEntity> = vendor_working_hours::table
        .filter(vendor_working_hours::vendor_id.eq_any(&vendor_ids))
        .filter(vendor_working_hours::day_of_week.eq(day_of_week(query.date)))
        .select(VendorWorkingHoursEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get vendor working hours")?;

    let holiday_rows: Vec<VendorHolidayEntity> = vendor_holidays::table
        .filter(vendor_holidays::vendor_id.eq_any(&vendor_ids))
        .filter(vendor_holidays::holiday_date.eq(query.date))
        .select(VendorHolidayEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get vendor holidays")?;

    let (slot_rows, capacity_rows) = match query.slot_id {
        Some(slot_id) => {
            let slot_rows: Vec<VendorSlotEntity> = vendor_slots::table
                .filter(vendor_slots::vendor_id.eq_any(&vendor_ids))
                .filter(vendor_slots::slot_id.eq(slot_id))
                .select(VendorSlotEntity::as_select())
                .get_results(conn)
                .await
                .context("Failed to get vendor slots")?;

            let capacity_rows: Vec<VendorCapacityEntity> = vendor_capacities::table
                .filter(vendor_capacities::vendor_id.eq_any(&vendor_ids))
                .filter(vendor_capacities::delivery_date.eq(query.date))
                .filter(vendor_capacities::slot_id.eq(slot_id))
                .select(VendorCapacityEntity::as_select())
                .get_results(conn)
                .await
                .context("Failed to get vendor capacities")?;

            (slot_rows, capacity_rows)
        }
        None => (Vec::new(), Vec::new()),
    };

    let product_rows: Vec<VendorProductEntity> = vendor_products::table
        .filter(vendor_products::vendor_id.eq_any(&vendor_ids))
        .filter(vendor_products::product_id.eq_any(query.product_ids))
        .select(VendorProductEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get vendor products")?;

    let area_rows: Vec<VendorAreaSurchargeEntity> = match query.zone_id {
        Some(zone_id) => vendor_area_surcharges::table
            .filter(vendor_area_surcharges::vendor_id.eq_any(&vendor_ids))
            .filter(vendor_area_surcharges::zone_id.eq(zone_id))
            .filter(vendor_area_surcharges::is_active.eq(true))
            .order_by(vendor_area_surcharges::id.asc())
            .select(VendorAreaSurchargeEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get vendor area surcharges")?,
        None => Vec::new(),
    };

    let vendors_by_id: HashMap<i32, VendorEntity> =
        vendor_rows.into_iter().map(|v| (v.id, v)).collect();

    let mut candidates: Vec<VendorCandidate> = pincode_rows
        .into_iter()
        .filter_map(|pincode| {
            let vendor = vendors_by_id.get(&pincode.vendor_id)?;
            Some(VendorCandidate {
                vendor_id: vendor.id,
                city_id: vendor.city_id,
                status: VendorStatus::parse(&vendor.status),
                is_online: vendor.is_online,
                vacation_start: vendor.vacation_start,
                vacation_end: vendor.vacation_end,
                rating: vendor.rating,
                commission_rate: vendor.commission_rate,
                pincode_active: pincode.is_active,
                pincode_charge: pincode.delivery_charge,
                working_hours: Vec::new(),
                slots: HashMap::new(),
                holidays: Vec::new(),
                capacities: Vec::new(),
                products: HashMap::new(),
            })
        })
        .collect();
    candidates.sort_by_key(|c| c.vendor_id);

    let mut by_vendor: HashMap<i32, &mut VendorCandidate> =
        candidates.iter_mut().map(|c| (c.vendor_id, c)).collect();

    for row in hour_rows {
        if let Some(c) = by_vendor.get_mut(&row.vendor_id) {
            c.working_hours.push(WorkingDay {
                day_of_week: row.day_of_week,
                is_closed: row.is_closed,
            });
        }
    }
    for row in slot_rows {
        if let Some(c) = by_vendor.get_mut(&row.vendor_id) {
            c.slots.insert(row.slot_id, row.is_enabled);
        }
    }
    for row in holiday_rows {
        if let Some(c) = by_vendor.get_mut(&row.vendor_id) {
            c.holidays.push(Holiday {
                date: row.holiday_date,
                blocked_slot_ids: row.blocked_slot_ids,
            });
        }
    }
    for row in capacity_rows {
        if let Some(c) = by_vendor.get_mut(&row.vendor_id) {
            c.capacities.push(CapacitySnapshot {
                date: row.delivery_date,
                slot_id: row.slot_id,
                max_orders: row.max_orders,
                booked_orders: row.booked_orders,
            });
        }
    }
    for row in product_rows {
        if let Some(c) = by_vendor.get_mut(&row.vendor_id) {
            c.products.insert(
                row.product_id,
                StockedProduct {
                    preparation_minutes: row.preparation_time,
                    is_available: row.is_available,
                },
            );
        }
    }

    let mut area_surcharges = HashMap::new();
    for row in area_rows {
        area_surcharges.entry(row.vendor_id).or_insert(row.amount);
    }

    Ok(VendorDirectory {
        candidates,
        area_surcharges,
    })
}
