//! Order creation: validation, pricing, charges, coupon, vendor assignment
//! and the transactional write.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    allocation::{
        AllocationPolicy, AllocationRequest, UNASSIGNED, VendorAssigner,
        capacity::PgCapacityStore,
        directory::{DirectoryQuery, load_directory},
    },
    charges::{
        ChargeAmounts, ChargeCalculator, ChargeInputs, SlotCharges, ZoneCharges,
        money::to_f64,
    },
    common::{app_error::AppError, config::OrderingConfig, middleware::Customer},
    coupons::{self, Redeemer},
    models::{
        AddressEntity, CityDeliveryConfigEntity, CityEntity, CityZoneEntity, CreateAddressEntity,
        CreateOrderEntity, CreateOrderItemEntity, DeliverySlotEntity, OrderEntity,
        OrderItemEntity, PlatformSurchargeEntity,
    },
    orders::{
        catalog::load_catalog,
        post_order::{AssignedVendor, PendingFile, PostOrderJob},
        pricing::{CartLine, price_cart},
    },
    schema::{
        addresses, cities, city_delivery_configs, city_zones, delivery_slots, order_items, orders,
        platform_surcharges,
    },
};

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CartLineReq {
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub quantity: i32,
    /// Addon ids.
    #[serde(default)]
    pub addons: Vec<i32>,
    pub pending_file_key: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressReq {
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub pincode: String,
}

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Online,
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "ONLINE",
            PaymentMethod::Cod => "COD",
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderReq {
    pub items: Vec<CartLineReq>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub delivery_date: String,
    /// Slot slug.
    pub delivery_slot: String,
    pub address_id: Option<i32>,
    pub address: Option<AddressReq>,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddressSource {
    Existing(i32),
    Inline(AddressReq),
}

/// A request that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub lines: Vec<CartLine>,
    pub delivery_date: NaiveDate,
    pub slot_slug: String,
    pub address: AddressSource,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

/// Accepts a plain date or a timestamp; timestamps are reduced to their UTC
/// calendar date.
pub fn parse_delivery_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| AppError::BadRequest(format!("Invalid delivery date: {value}")))
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_request(
    customer: &Customer,
    req: &CreateOrderReq,
    today: NaiveDate,
) -> Result<ValidatedOrder, AppError> {
    if req.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".into(),
        ));
    }

    let delivery_date = parse_delivery_date(&req.delivery_date)?;
    if delivery_date < today {
        return Err(AppError::BadRequest(
            "Delivery date cannot be in the past".into(),
        ));
    }

    let slot_slug = req.delivery_slot.trim().to_string();
    if slot_slug.is_empty() {
        return Err(AppError::BadRequest("Delivery slot is required".into()));
    }

    let address = match (req.address_id, &req.address) {
        (Some(id), None) => AddressSource::Existing(id),
        (None, Some(address)) => {
            if address.pincode.trim().is_empty() || address.line1.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Address line and pincode are required".into(),
                ));
            }
            AddressSource::Inline(AddressReq {
                pincode: address.pincode.trim().to_string(),
                ..address.clone()
            })
        }
        (None, None) => {
            return Err(AppError::BadRequest("Delivery address is required".into()));
        }
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Provide either addressId or address, not both".into(),
            ));
        }
    };

    let guest_email = non_blank(req.guest_email.as_ref());
    let guest_phone = non_blank(req.guest_phone.as_ref());
    if customer.is_guest() {
        if !guest_email.as_deref().is_some_and(|email| email.contains('@')) {
            return Err(AppError::BadRequest(
                "Guest checkout requires a valid guestEmail".into(),
            ));
        }
        if guest_phone.is_none() {
            return Err(AppError::BadRequest(
                "Guest checkout requires guestPhone".into(),
            ));
        }
        if matches!(address, AddressSource::Existing(_)) {
            return Err(AppError::BadRequest(
                "Guest checkout requires an inline address".into(),
            ));
        }
    }

    let coupon_code = match non_blank(req.coupon_code.as_ref()) {
        Some(code) => Some(coupons::validate_code_shape(&code)?),
        None => None,
    };

    let lines = req
        .items
        .iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            variation_id: item.variation_id,
            quantity: item.quantity,
            addon_ids: item.addons.clone(),
            pending_file_key: non_blank(item.pending_file_key.as_ref()),
        })
        .collect();

    Ok(ValidatedOrder {
        lines,
        delivery_date,
        slot_slug,
        address,
        coupon_code,
        payment_method: req.payment_method,
        guest_email: if customer.is_guest() { guest_email } else { None },
        guest_phone: if customer.is_guest() { guest_phone } else { None },
    })
}

/// Active zone holding `pincode`. Overlapping zones resolve to the lowest id.
pub fn resolve_zone<'z>(zones: &'z [CityZoneEntity], pincode: &str) -> Option<&'z CityZoneEntity> {
    zones
        .iter()
        .filter(|zone| zone.is_active && zone.pincodes.iter().any(|p| p == pincode))
        .min_by_key(|zone| zone.id)
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ComposedOrderRes {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
    pub charges: ChargeAmounts,
}

pub struct ComposedOrder {
    pub res: ComposedOrderRes,
    pub job: PostOrderJob,
}

#[derive(Debug)]
pub struct OrderComposer {
    config: OrderingConfig,
    calculator: ChargeCalculator,
    assigner: VendorAssigner,
}

impl OrderComposer {
    pub fn new(config: &OrderingConfig) -> Self {
        Self {
            config: config.clone(),
            calculator: ChargeCalculator::new(config),
            assigner: VendorAssigner::new(AllocationPolicy::default(), config.default_max_orders),
        }
    }

    /// Creates the order. Everything up to and including the order and item
    /// inserts either succeeds together or leaves no trace. The returned job
    /// carries the best-effort follow-up work.
    pub async fn compose(
        &self,
        conn: &mut AsyncPgConnection,
        customer: Customer,
        req: CreateOrderReq,
        now: DateTime<Utc>,
    ) -> Result<ComposedOrder, AppError> {
        let order = validate_request(&customer, &req, now.date_naive())?;

        let pincode = match &order.address {
            AddressSource::Existing(id) => {
                let address: AddressEntity = addresses::table
                    .find(*id)
                    .filter(addresses::customer_id.eq(customer.id))
                    .select(AddressEntity::as_select())
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get address")?
                    .ok_or(AppError::NotFound)?;
                address.pincode
            }
            AddressSource::Inline(address) => address.pincode.clone(),
        };

        let catalog = load_catalog(conn, &order.lines).await?;
        let cart = price_cart(
            &order.lines,
            &catalog,
            now,
            self.config.min_lead_time_hours,
        )?;

        let zones: Vec<CityZoneEntity> = city_zones::table
            .filter(city_zones::is_active.eq(true))
            .select(CityZoneEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get city zones")?;
        let zone = resolve_zone(&zones, &pincode);

        let city: Option<CityEntity> = match zone {
            Some(zone) => cities::table
                .find(zone.city_id)
                .filter(cities::is_active.eq(true))
                .select(CityEntity::as_select())
                .first(conn)
                .await
                .optional()
                .context("Failed to get city")?,
            None => None,
        };
        // A zone of an inactive city is treated as unknown.
        let zone = zone.filter(|_| city.is_some());

        let slot: Option<DeliverySlotEntity> = delivery_slots::table
            .filter(delivery_slots::slug.eq(&order.slot_slug))
            .filter(delivery_slots::is_active.eq(true))
            .select(DeliverySlotEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get delivery slot")?;

        let city_config: Option<CityDeliveryConfigEntity> = match (&city, &slot) {
            (Some(city), Some(slot)) => city_delivery_configs::table
                .find((city.id, slot.id))
                .filter(city_delivery_configs::is_enabled.eq(true))
                .select(CityDeliveryConfigEntity::as_select())
                .first(conn)
                .await
                .optional()
                .context("Failed to get city delivery config")?,
            _ => None,
        };

        let surcharges: Vec<PlatformSurchargeEntity> = platform_surcharges::table
            .filter(platform_surcharges::is_active.eq(true))
            .filter(platform_surcharges::starts_on.le(order.delivery_date))
            .filter(platform_surcharges::ends_on.ge(order.delivery_date))
            .select(PlatformSurchargeEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get platform surcharges")?;

        let zone_charges = zone.zip(city.as_ref()).map(|(zone, city)| ZoneCharges {
            city_base_charge: city.base_delivery_charge,
            free_delivery_above: city.free_delivery_above,
            zone_extra_charge: zone.extra_charge,
        });
        let slot_charges = slot.as_ref().map(|slot| SlotCharges {
            base_charge: slot.base_charge,
            city_override: city_config.as_ref().and_then(|c| c.charge_override),
        });
        let slot_id = slot.as_ref().map(|slot| slot.id);

        let preliminary = self.calculator.preliminary(&ChargeInputs {
            subtotal: cart.subtotal,
            zone: zone_charges,
            slot: slot_charges,
            slot_id,
            delivery_date: order.delivery_date,
            category_slugs: &cart.category_slugs,
            platform_surcharges: &surcharges,
            cash_on_delivery: order.payment_method == PaymentMethod::Cod,
        });

        let applied_coupon = match &order.coupon_code {
            Some(code) => {
                let redeemer = match (customer.id, order.guest_email.as_deref()) {
                    (Some(id), _) => Some(Redeemer::Customer(id)),
                    (None, Some(email)) => Some(Redeemer::Guest(email)),
                    (None, None) => None,
                };
                match redeemer {
                    Some(redeemer) => {
                        coupons::resolve_coupon(conn, code, cart.subtotal, redeemer, now).await?
                    }
                    None => None,
                }
            }
            None => None,
        };
        let preliminary = match &applied_coupon {
            Some(coupon) => preliminary.with_discount(coupon.discount),
            None => preliminary,
        };

        let directory = load_directory(
            conn,
            DirectoryQuery {
                pincode: &pincode,
                slot_id,
                zone_id: zone.map(|z| z.id),
                date: order.delivery_date,
                product_ids: &cart.product_ids,
            },
        )
        .await?;

        let request = AllocationRequest {
            city_id: zone.map(|z| z.city_id),
            slot_id,
            date: order.delivery_date,
            product_ids: cart.product_ids.clone(),
            required_lead_time_hours: cart.required_lead_time_hours,
            now,
        };

        tracing::debug!(
            subtotal = %cart.subtotal,
            estimated_total = %preliminary.estimated_total(),
            candidates = directory.candidates.len(),
            "Order priced, assigning vendor"
        );

        let assigner = &self.assigner;
        let directory_ref = &directory;
        let request_ref = &request;
        let lines = cart.lines;
        let coupon_id = applied_coupon.map(|c| c.coupon_id);

        let (order_row, item_rows, charges, assignment) = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let address_id = match order.address {
                        AddressSource::Existing(id) => id,
                        AddressSource::Inline(address) => diesel::insert_into(addresses::table)
                            .values(CreateAddressEntity {
                                customer_id: customer.id,
                                recipient_name: address.recipient_name,
                                phone: address.phone,
                                line1: address.line1,
                                line2: address.line2,
                                city: address.city,
                                pincode: address.pincode,
                            })
                            .returning(addresses::id)
                            .get_result(conn)
                            .await
                            .context("Failed to create address")?,
                    };

                    let mut store = PgCapacityStore::new(conn);
                    let assignment = assigner
                        .assign(&mut store, request_ref, directory_ref)
                        .await
                        .context("Failed to reserve vendor capacity")?;

                    let vendor_charges = assignment
                        .map(|a| directory_ref.vendor_charges(a.vendor_id))
                        .unwrap_or_default();
                    let charges = preliminary.with_vendor_surcharge(vendor_charges);

                    let order_row = diesel::insert_into(orders::table)
                        .values(CreateOrderEntity {
                            customer_id: customer.id,
                            guest_email: order.guest_email,
                            guest_phone: order.guest_phone,
                            vendor_id: assignment.map(|a| a.vendor_id),
                            address_id,
                            status: "PENDING".into(),
                            payment_method: order.payment_method.as_str().into(),
                            allocation: assignment
                                .map(|a| a.kind.as_str())
                                .unwrap_or(UNASSIGNED)
                                .into(),
                            delivery_date: order.delivery_date,
                            delivery_slot: order.slot_slug,
                            subtotal: to_f64(charges.subtotal()),
                            discount: to_f64(charges.discount()),
                            delivery_charge: to_f64(charges.delivery_charge()),
                            surcharge: to_f64(charges.surcharge()),
                            cod_fee: to_f64(charges.cod_fee()),
                            total: to_f64(charges.total()),
                            coupon_id,
                        })
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    let mut new_items = Vec::with_capacity(lines.len());
                    for line in lines {
                        new_items.push(CreateOrderItemEntity {
                            order_id: order_row.id,
                            product_id: line.product_id,
                            variation_id: line.variation_id,
                            variation_label: line.variation_label,
                            quantity: line.quantity,
                            price: to_f64(line.unit_price),
                            addons: serde_json::to_value(&line.addons)
                                .context("Failed to serialize addons")?,
                            addon_total: to_f64(line.addon_total),
                            pending_file_key: line.pending_file_key,
                        });
                    }

                    let item_rows = diesel::insert_into(order_items::table)
                        .values(&new_items)
                        .returning(OrderItemEntity::as_returning())
                        .get_results(conn)
                        .await
                        .context("Failed to create order items")?;

                    Ok::<_, AppError>((order_row, item_rows, charges, assignment))
                })
            })
            .await?;

        tracing::info!(
            order_id = order_row.id,
            vendor_id = ?order_row.vendor_id,
            allocation = %order_row.allocation,
            total = order_row.total,
            "Order created"
        );

        let job = PostOrderJob {
            order_id: order_row.id,
            vendor: assignment.and_then(|a| {
                directory.candidate(a.vendor_id).map(|c| AssignedVendor {
                    vendor_id: a.vendor_id,
                    commission_rate: c.commission_rate,
                })
            }),
            subtotal: order_row.subtotal,
            customer_id: order_row.customer_id,
            guest_email: order_row.guest_email.clone(),
            coupon_id: order_row.coupon_id,
            pending_files: item_rows
                .iter()
                .filter_map(|item| {
                    item.pending_file_key.clone().map(|key| PendingFile {
                        order_item_id: item.id,
                        key,
                    })
                })
                .collect(),
        };

        Ok(ComposedOrder {
            res: ComposedOrderRes {
                order: order_row,
                order_items: item_rows,
                charges: charges.amounts(),
            },
            job,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
    }

    fn member() -> Customer {
        Customer { id: Some(7) }
    }

    fn address() -> AddressReq {
        AddressReq {
            recipient_name: "Asha".into(),
            phone: "9876543210".into(),
            line1: "12 Sector 17".into(),
            line2: None,
            city: "Chandigarh".into(),
            pincode: " 160017 ".into(),
        }
    }

    fn req() -> CreateOrderReq {
        CreateOrderReq {
            items: vec![CartLineReq {
                product_id: 1,
                variation_id: None,
                quantity: 1,
                addons: vec![],
                pending_file_key: None,
            }],
            delivery_date: "2024-12-25".into(),
            delivery_slot: "midnight".into(),
            address_id: Some(3),
            address: None,
            coupon_code: None,
            payment_method: PaymentMethod::Online,
            guest_email: None,
            guest_phone: None,
        }
    }

    fn zone(id: i32, pincodes: &[&str], is_active: bool) -> CityZoneEntity {
        CityZoneEntity {
            id,
            city_id: 1,
            name: format!("Zone {id}"),
            pincodes: pincodes.iter().map(|p| p.to_string()).collect(),
            extra_charge: 0.0,
            is_active,
        }
    }

    #[test]
    fn delivery_date_accepts_date_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(parse_delivery_date("2024-12-25").unwrap(), expected);
        assert_eq!(
            parse_delivery_date("2024-12-25T00:00:00.000Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_delivery_date("2024-12-25T23:30:00+05:30").unwrap(),
            expected
        );
        assert!(matches!(
            parse_delivery_date("25/12/2024"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn member_order_is_validated() {
        let order = validate_request(&member(), &req(), today()).unwrap();
        assert_eq!(order.address, AddressSource::Existing(3));
        assert_eq!(order.slot_slug, "midnight");
        assert_eq!(order.lines.len(), 1);
        assert!(order.guest_email.is_none());
    }

    #[test]
    fn past_date_empty_cart_and_blank_slot_are_rejected() {
        let past = CreateOrderReq {
            delivery_date: "2024-12-19".into(),
            ..req()
        };
        let empty = CreateOrderReq {
            items: vec![],
            ..req()
        };
        let blank_slot = CreateOrderReq {
            delivery_slot: "  ".into(),
            ..req()
        };
        for bad in [past, empty, blank_slot] {
            assert!(matches!(
                validate_request(&member(), &bad, today()),
                Err(AppError::BadRequest(_))
            ));
        }
        let same_day = CreateOrderReq {
            delivery_date: "2024-12-20".into(),
            ..req()
        };
        assert!(validate_request(&member(), &same_day, today()).is_ok());
    }

    #[test]
    fn exactly_one_address_source() {
        let both = CreateOrderReq {
            address: Some(address()),
            ..req()
        };
        let neither = CreateOrderReq {
            address_id: None,
            ..req()
        };
        assert!(validate_request(&member(), &both, today()).is_err());
        assert!(validate_request(&member(), &neither, today()).is_err());
    }

    #[test]
    fn guests_need_contact_details_and_inline_address() {
        let guest = Customer::default();
        let inline = CreateOrderReq {
            address_id: None,
            address: Some(address()),
            guest_email: Some("asha@example.com".into()),
            guest_phone: Some("9876543210".into()),
            ..req()
        };
        let order = validate_request(&guest, &inline, today()).unwrap();
        assert_eq!(order.guest_email.as_deref(), Some("asha@example.com"));
        match order.address {
            AddressSource::Inline(address) => assert_eq!(address.pincode, "160017"),
            other => panic!("unexpected address source {other:?}"),
        }

        let no_email = CreateOrderReq {
            guest_email: None,
            ..inline.clone()
        };
        let saved_address = CreateOrderReq {
            address_id: Some(3),
            address: None,
            ..inline.clone()
        };
        assert!(validate_request(&guest, &no_email, today()).is_err());
        assert!(validate_request(&guest, &saved_address, today()).is_err());
    }

    #[test]
    fn malformed_coupon_is_a_bad_request() {
        let bad = CreateOrderReq {
            coupon_code: Some("10% OFF".into()),
            ..req()
        };
        assert!(matches!(
            validate_request(&member(), &bad, today()),
            Err(AppError::BadRequest(_))
        ));

        let blank = CreateOrderReq {
            coupon_code: Some("   ".into()),
            ..req()
        };
        let order = validate_request(&member(), &blank, today()).unwrap();
        assert!(order.coupon_code.is_none());
    }

    #[test]
    fn zone_lookup_skips_inactive_and_prefers_lowest_id() {
        let zones = vec![
            zone(5, &["160017", "160018"], true),
            zone(2, &["160017"], false),
            zone(3, &["160017"], true),
        ];
        assert_eq!(resolve_zone(&zones, "160017").map(|z| z.id), Some(3));
        assert_eq!(resolve_zone(&zones, "160018").map(|z| z.id), Some(5));
        assert!(resolve_zone(&zones, "110001").is_none());
    }

    #[test]
    fn payment_method_defaults_to_online() {
        let parsed: CreateOrderReq = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": 1, "quantity": 2, "addons": [4] }],
            "deliveryDate": "2024-12-25",
            "deliverySlot": "standard",
            "addressId": 3
        }))
        .unwrap();
        assert_eq!(parsed.payment_method, PaymentMethod::Online);
        assert_eq!(parsed.items[0].addons, vec![4]);

        let cod: PaymentMethod = serde_json::from_value(serde_json::json!("COD")).unwrap();
        assert_eq!(cod, PaymentMethod::Cod);
    }
}
