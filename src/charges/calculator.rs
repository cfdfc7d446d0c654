use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    charges::{
        breakdown::{ChargeBreakdown, PreliminaryCharges, VendorCharges},
        money::to_decimal,
        surcharge::platform_surcharge_total,
    },
    common::config::OrderingConfig,
    models::PlatformSurchargeEntity,
};

/// City and zone terms of the base delivery charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneCharges {
    pub city_base_charge: f64,
    pub free_delivery_above: Option<f64>,
    pub zone_extra_charge: f64,
}

/// Slot terms: the platform base charge and the city-level override, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotCharges {
    pub base_charge: f64,
    pub city_override: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChargeInputs<'a> {
    pub subtotal: Decimal,
    /// `None` when the pincode resolved to no zone.
    pub zone: Option<ZoneCharges>,
    /// `None` when the slot slug is unknown.
    pub slot: Option<SlotCharges>,
    pub slot_id: Option<i32>,
    pub delivery_date: NaiveDate,
    pub category_slugs: &'a [String],
    pub platform_surcharges: &'a [PlatformSurchargeEntity],
    pub cash_on_delivery: bool,
}

#[derive(Debug, Clone)]
pub struct ChargeCalculator {
    cod_fee: Decimal,
    default_delivery_charge: Decimal,
}

impl ChargeCalculator {
    pub fn new(config: &OrderingConfig) -> Self {
        Self {
            cod_fee: to_decimal(config.cod_fee),
            default_delivery_charge: to_decimal(config.default_delivery_charge),
        }
    }

    /// City base plus zone extra, waived once the subtotal reaches the
    /// city's free-delivery threshold.
    pub fn base_delivery_charge(&self, subtotal: Decimal, zone: Option<&ZoneCharges>) -> Decimal {
        let Some(zone) = zone else {
            return self.default_delivery_charge;
        };

        let free = zone
            .free_delivery_above
            .is_some_and(|threshold| subtotal >= to_decimal(threshold));
        if free {
            Decimal::ZERO
        } else {
            to_decimal(zone.city_base_charge) + to_decimal(zone.zone_extra_charge)
        }
    }

    /// Never waived by the free-delivery threshold.
    pub fn slot_charge(&self, slot: Option<&SlotCharges>) -> Decimal {
        slot.map(|s| to_decimal(s.city_override.unwrap_or(s.base_charge)))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn preliminary(&self, inputs: &ChargeInputs<'_>) -> PreliminaryCharges {
        let delivery_charge = self.base_delivery_charge(inputs.subtotal, inputs.zone.as_ref())
            + self.slot_charge(inputs.slot.as_ref());
        let platform_surcharge = platform_surcharge_total(
            inputs.platform_surcharges,
            inputs.delivery_date,
            inputs.slot_id,
            inputs.category_slugs,
        );
        let cod_fee = if inputs.cash_on_delivery {
            self.cod_fee
        } else {
            Decimal::ZERO
        };

        PreliminaryCharges::new(inputs.subtotal, delivery_charge, platform_surcharge, cod_fee)
    }

    /// Delivery charge and surcharge for a known vendor, without a discount.
    pub fn compute_delivery_charge(
        &self,
        inputs: &ChargeInputs<'_>,
        vendor: VendorCharges,
    ) -> ChargeBreakdown {
        self.preliminary(inputs).with_vendor_surcharge(vendor)
    }
}
