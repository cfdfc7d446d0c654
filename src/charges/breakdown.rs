//! Two-stage charge assembly.
//!
//! [`PreliminaryCharges`] holds every term that is known before a vendor is
//! assigned. It has no serialisation and no persistence path; the only way to
//! reach a storable value is [`PreliminaryCharges::with_vendor_surcharge`],
//! which produces the final [`ChargeBreakdown`].

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::charges::money::{round_to_unit, to_f64};

/// Vendor-dependent charge terms, known once the assigner has picked a vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VendorCharges {
    /// Added to the delivery charge.
    pub pincode_charge: Decimal,
    /// Added to the surcharge.
    pub area_surcharge: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreliminaryCharges {
    subtotal: Decimal,
    discount: Decimal,
    delivery_charge: Decimal,
    platform_surcharge: Decimal,
    cod_fee: Decimal,
}

impl PreliminaryCharges {
    pub fn new(
        subtotal: Decimal,
        delivery_charge: Decimal,
        platform_surcharge: Decimal,
        cod_fee: Decimal,
    ) -> Self {
        Self {
            subtotal,
            discount: Decimal::ZERO,
            delivery_charge,
            platform_surcharge,
            cod_fee,
        }
    }

    /// Applies a coupon discount, rounded to whole currency units and capped
    /// at the subtotal.
    pub fn with_discount(self, discount: Decimal) -> Self {
        let discount = round_to_unit(discount.max(Decimal::ZERO)).min(self.subtotal);
        Self { discount, ..self }
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn delivery_charge(&self) -> Decimal {
        self.delivery_charge
    }

    pub fn platform_surcharge(&self) -> Decimal {
        self.platform_surcharge
    }

    /// Total without vendor terms. Only meant for logging.
    pub fn estimated_total(&self) -> Decimal {
        self.subtotal + self.delivery_charge + self.platform_surcharge + self.cod_fee
            - self.discount
    }

    pub fn with_vendor_surcharge(self, vendor: VendorCharges) -> ChargeBreakdown {
        let pincode_charge = vendor.pincode_charge.max(Decimal::ZERO);
        let area_surcharge = vendor.area_surcharge.max(Decimal::ZERO);

        ChargeBreakdown {
            subtotal: self.subtotal,
            discount: self.discount,
            delivery_charge: self.delivery_charge + pincode_charge,
            surcharge: self.platform_surcharge + area_surcharge,
            cod_fee: self.cod_fee,
        }
    }
}

/// Final charges of an order. Produced only after vendor assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeBreakdown {
    subtotal: Decimal,
    discount: Decimal,
    delivery_charge: Decimal,
    surcharge: Decimal,
    cod_fee: Decimal,
}

impl ChargeBreakdown {
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn delivery_charge(&self) -> Decimal {
        self.delivery_charge
    }

    pub fn surcharge(&self) -> Decimal {
        self.surcharge
    }

    pub fn cod_fee(&self) -> Decimal {
        self.cod_fee
    }

    pub fn total(&self) -> Decimal {
        self.subtotal + self.delivery_charge + self.surcharge + self.cod_fee - self.discount
    }

    pub fn amounts(&self) -> ChargeAmounts {
        ChargeAmounts {
            subtotal: to_f64(self.subtotal),
            discount: to_f64(self.discount),
            delivery_charge: to_f64(self.delivery_charge),
            surcharge: to_f64(self.surcharge),
            cod_fee: to_f64(self.cod_fee),
            total: to_f64(self.total()),
        }
    }
}

/// Storage/wire form of a [`ChargeBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ChargeAmounts {
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charge: f64,
    pub surcharge: f64,
    pub cod_fee: f64,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn vendor_terms_land_in_their_own_buckets() {
        let final_charges = PreliminaryCharges::new(dec!(300), dec!(248), dec!(50), dec!(0))
            .with_vendor_surcharge(VendorCharges {
                pincode_charge: dec!(30),
                area_surcharge: dec!(15.5),
            });

        assert_eq!(final_charges.delivery_charge(), dec!(278));
        assert_eq!(final_charges.surcharge(), dec!(65.5));
        assert_eq!(final_charges.total(), dec!(643.5));
    }

    #[test]
    fn discount_is_rounded_and_capped() {
        let charges = PreliminaryCharges::new(dec!(100), dec!(0), dec!(0), dec!(0))
            .with_discount(dec!(12.5));
        assert_eq!(charges.discount(), dec!(13));

        let capped = PreliminaryCharges::new(dec!(100), dec!(0), dec!(0), dec!(0))
            .with_discount(dec!(250));
        assert_eq!(capped.discount(), dec!(100));
    }

    #[test]
    fn total_includes_cod_fee_and_subtracts_discount() {
        let charges = PreliminaryCharges::new(dec!(600), dec!(0), dec!(0), dec!(40))
            .with_discount(dec!(60))
            .with_vendor_surcharge(VendorCharges::default());
        assert_eq!(charges.total(), dec!(580));
    }

    #[test]
    fn negative_vendor_terms_are_ignored() {
        let charges = PreliminaryCharges::new(dec!(100), dec!(10), dec!(0), dec!(0))
            .with_vendor_surcharge(VendorCharges {
                pincode_charge: dec!(-5),
                area_surcharge: dec!(-1),
            });
        assert_eq!(charges.delivery_charge(), dec!(10));
        assert_eq!(charges.surcharge(), dec!(0));
    }

    #[test]
    fn amounts_keep_two_decimals() {
        let amounts = PreliminaryCharges::new(dec!(99.999), dec!(0), dec!(0), dec!(0))
            .with_vendor_surcharge(VendorCharges::default())
            .amounts();
        assert_eq!(amounts.subtotal, 100.0);
        assert_eq!(amounts.total, 100.0);
    }
}
