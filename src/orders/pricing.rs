//! Cart validation and line pricing against live catalog rows.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    charges::money::to_decimal,
    common::app_error::AppError,
    models::{ProductAddonEntity, ProductEntity, ProductVariationEntity},
};

pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub quantity: i32,
    pub addon_ids: Vec<i32>,
    /// Upload key of a customer file (photo cake, card) awaiting promotion.
    pub pending_file_key: Option<String>,
}

/// Catalog rows referenced by a cart, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub products: HashMap<i32, ProductEntity>,
    pub variations: HashMap<i32, ProductVariationEntity>,
    pub addons: HashMap<i32, ProductAddonEntity>,
    /// Category id to slug.
    pub category_slugs: HashMap<i32, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedAddon {
    pub id: i32,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub variation_label: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub addons: Vec<PricedAddon>,
    /// Sum of addon prices for one unit.
    pub addon_total: Decimal,
    pub line_total: Decimal,
    pub pending_file_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub required_lead_time_hours: i32,
    /// Distinct, sorted.
    pub category_slugs: Vec<String>,
    /// Distinct, sorted.
    pub product_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    EmptyCart,
    InvalidQuantity { product_id: i32, quantity: i32 },
    Unresolved {
        products: Vec<i32>,
        variations: Vec<i32>,
        addons: Vec<i32>,
    },
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::EmptyCart => write!(f, "Order must contain at least one item"),
            PricingError::InvalidQuantity {
                product_id,
                quantity,
            } => write!(
                f,
                "Quantity {quantity} for product {product_id} must be between 1 and {MAX_LINE_QUANTITY}"
            ),
            PricingError::Unresolved {
                products,
                variations,
                addons,
            } => {
                let mut parts = Vec::new();
                if !products.is_empty() {
                    parts.push(format!("products [{}]", join_ids(products)));
                }
                if !variations.is_empty() {
                    parts.push(format!("variations [{}]", join_ids(variations)));
                }
                if !addons.is_empty() {
                    parts.push(format!("addons [{}]", join_ids(addons)));
                }
                write!(f, "Unavailable {}", parts.join(", "))
            }
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Current price of a variation, honouring its sale window.
pub fn effective_variation_price(variation: &ProductVariationEntity, now: DateTime<Utc>) -> f64 {
    match variation.sale_price {
        Some(sale_price)
            if variation.sale_from.is_none_or(|from| from <= now)
                && variation.sale_to.is_none_or(|to| now <= to) =>
        {
            sale_price
        }
        _ => variation.price,
    }
}

/// Validates every line against `catalog` and prices the cart. All missing
/// or inactive references are collected into one error.
pub fn price_cart(
    lines: &[CartLine],
    catalog: &Catalog,
    now: DateTime<Utc>,
    min_lead_time_hours: i32,
) -> Result<PricedCart, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }
    if let Some(line) = lines
        .iter()
        .find(|line| !(1..=MAX_LINE_QUANTITY).contains(&line.quantity))
    {
        return Err(PricingError::InvalidQuantity {
            product_id: line.product_id,
            quantity: line.quantity,
        });
    }

    let mut missing_products = BTreeSet::new();
    let mut missing_variations = BTreeSet::new();
    let mut missing_addons = BTreeSet::new();
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(product) = catalog
            .products
            .get(&line.product_id)
            .filter(|product| product.is_active)
        else {
            missing_products.insert(line.product_id);
            continue;
        };

        let variation = match line.variation_id {
            Some(variation_id) => match catalog
                .variations
                .get(&variation_id)
                .filter(|v| v.is_active && v.product_id == product.id)
            {
                Some(variation) => Some(variation),
                None => {
                    missing_variations.insert(variation_id);
                    continue;
                }
            },
            None => None,
        };

        let mut addons = Vec::with_capacity(line.addon_ids.len());
        for addon_id in &line.addon_ids {
            match catalog
                .addons
                .get(addon_id)
                .filter(|a| a.is_active && a.product_id == product.id)
            {
                Some(addon) => addons.push(PricedAddon {
                    id: addon.id,
                    name: addon.name.clone(),
                    price: addon.price,
                }),
                None => {
                    missing_addons.insert(*addon_id);
                }
            }
        }

        let unit_price = to_decimal(
            variation
                .map(|v| effective_variation_price(v, now))
                .unwrap_or(product.price),
        );
        let addon_total: Decimal = addons.iter().map(|a| to_decimal(a.price)).sum();
        let line_total = (unit_price + addon_total) * Decimal::from(line.quantity);

        priced.push(PricedLine {
            product_id: product.id,
            variation_id: variation.map(|v| v.id),
            variation_label: variation.map(|v| v.label.clone()),
            quantity: line.quantity,
            unit_price,
            addons,
            addon_total,
            line_total,
            pending_file_key: line.pending_file_key.clone(),
        });
    }

    if !missing_products.is_empty() || !missing_variations.is_empty() || !missing_addons.is_empty()
    {
        return Err(PricingError::Unresolved {
            products: missing_products.into_iter().collect(),
            variations: missing_variations.into_iter().collect(),
            addons: missing_addons.into_iter().collect(),
        });
    }

    let subtotal = priced.iter().map(|line| line.line_total).sum();
    let product_ids: BTreeSet<i32> = priced.iter().map(|line| line.product_id).collect();

    let slowest = product_ids
        .iter()
        .filter_map(|id| catalog.products.get(id))
        .map(|product| product.min_lead_time_hours)
        .max()
        .unwrap_or(0);

    let category_slugs: BTreeSet<String> = product_ids
        .iter()
        .filter_map(|id| catalog.products.get(id))
        .filter_map(|product| product.category_id)
        .filter_map(|category_id| catalog.category_slugs.get(&category_id).cloned())
        .collect();

    Ok(PricedCart {
        lines: priced,
        subtotal,
        required_lead_time_hours: slowest.max(min_lead_time_hours),
        category_slugs: category_slugs.into_iter().collect(),
        product_ids: product_ids.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 12, 10, 0, 0).unwrap()
    }

    fn product(id: i32, price: f64, lead: i32, category_id: Option<i32>) -> ProductEntity {
        ProductEntity {
            id,
            name: format!("Product {id}"),
            category_id,
            price,
            min_lead_time_hours: lead,
            is_active: true,
        }
    }

    fn variation(id: i32, product_id: i32, price: f64) -> ProductVariationEntity {
        ProductVariationEntity {
            id,
            product_id,
            label: "1 kg".to_string(),
            price,
            sale_price: None,
            sale_from: None,
            sale_to: None,
            is_active: true,
        }
    }

    fn addon(id: i32, product_id: i32, price: f64) -> ProductAddonEntity {
        ProductAddonEntity {
            id,
            product_id,
            name: format!("Addon {id}"),
            price,
            is_active: true,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            products: HashMap::from([
                (1, product(1, 500.0, 4, Some(10))),
                (2, product(2, 250.0, 1, Some(20))),
            ]),
            variations: HashMap::from([(5, variation(5, 1, 800.0))]),
            addons: HashMap::from([(9, addon(9, 1, 50.0))]),
            category_slugs: HashMap::from([(10, "cakes".to_string()), (20, "flowers".to_string())]),
        }
    }

    fn line(product_id: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id,
            variation_id: None,
            quantity,
            addon_ids: vec![],
            pending_file_key: None,
        }
    }

    #[test]
    fn subtotal_includes_variation_and_addons_per_unit() {
        let lines = vec![
            CartLine {
                variation_id: Some(5),
                addon_ids: vec![9],
                ..line(1, 2)
            },
            line(2, 1),
        ];
        let cart = price_cart(&lines, &catalog(), now(), 2).unwrap();

        assert_eq!(cart.lines[0].unit_price, dec!(800));
        assert_eq!(cart.lines[0].addon_total, dec!(50));
        assert_eq!(cart.lines[0].line_total, dec!(1700));
        assert_eq!(cart.subtotal, dec!(1950));
        assert_eq!(cart.category_slugs, vec!["cakes", "flowers"]);
        assert_eq!(cart.product_ids, vec![1, 2]);
    }

    #[test]
    fn lead_time_is_slowest_product_with_floor() {
        let cart = price_cart(&[line(1, 1), line(2, 1)], &catalog(), now(), 2).unwrap();
        assert_eq!(cart.required_lead_time_hours, 4);

        let quick = price_cart(&[line(2, 1)], &catalog(), now(), 2).unwrap();
        assert_eq!(quick.required_lead_time_hours, 2);
    }

    #[test]
    fn sale_price_applies_inside_window_only() {
        let on_sale = ProductVariationEntity {
            sale_price: Some(600.0),
            sale_from: Some(now() - Duration::days(1)),
            sale_to: Some(now() + Duration::days(1)),
            ..variation(5, 1, 800.0)
        };
        assert_eq!(effective_variation_price(&on_sale, now()), 600.0);
        assert_eq!(
            effective_variation_price(&on_sale, now() + Duration::days(2)),
            800.0
        );

        let open_ended = ProductVariationEntity {
            sale_price: Some(700.0),
            ..variation(5, 1, 800.0)
        };
        assert_eq!(effective_variation_price(&open_ended, now()), 700.0);
    }

    #[test]
    fn unresolved_references_are_reported_together() {
        let mut catalog = catalog();
        catalog.products.get_mut(&2).unwrap().is_active = false;
        catalog.variations.insert(6, variation(6, 2, 100.0));

        let lines = vec![
            line(2, 1),
            line(77, 1),
            CartLine {
                variation_id: Some(6),
                addon_ids: vec![9, 42],
                ..line(1, 1)
            },
        ];
        let err = price_cart(&lines, &catalog, now(), 2).unwrap_err();
        assert_eq!(
            err,
            PricingError::Unresolved {
                products: vec![2, 77],
                variations: vec![6],
                addons: vec![],
            }
        );
        assert_eq!(
            err.to_string(),
            "Unavailable products [2, 77], variations [6]"
        );
    }

    #[test]
    fn foreign_addon_is_rejected() {
        let mut catalog = catalog();
        catalog.addons.insert(11, addon(11, 2, 10.0));
        let lines = vec![CartLine {
            addon_ids: vec![11],
            ..line(1, 1)
        }];
        assert!(matches!(
            price_cart(&lines, &catalog, now(), 2),
            Err(PricingError::Unresolved { addons, .. }) if addons == vec![11]
        ));
    }

    #[test]
    fn quantity_bounds_and_empty_cart() {
        assert_eq!(
            price_cart(&[], &catalog(), now(), 2),
            Err(PricingError::EmptyCart)
        );
        assert!(matches!(
            price_cart(&[line(1, 0)], &catalog(), now(), 2),
            Err(PricingError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(price_cart(&[line(1, 100)], &catalog(), now(), 2).is_err());
        assert!(price_cart(&[line(1, 99)], &catalog(), now(), 2).is_ok());
    }
}
