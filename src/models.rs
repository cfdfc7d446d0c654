use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

// Platform catalogs

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::cities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CityEntity {
    pub id: i32,
    pub name: String,
    pub base_delivery_charge: f64,
    pub free_delivery_above: Option<f64>,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::city_zones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CityZoneEntity {
    pub id: i32,
    pub city_id: i32,
    pub name: String,
    pub pincodes: Vec<String>,
    pub extra_charge: f64,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::delivery_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliverySlotEntity {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub base_charge: f64,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::city_delivery_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CityDeliveryConfigEntity {
    pub city_id: i32,
    pub slot_id: i32,
    pub charge_override: Option<f64>,
    pub is_enabled: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryEntity {
    pub id: i32,
    pub slug: String,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub name: String,
    pub category_id: Option<i32>,
    pub price: f64,
    pub min_lead_time_hours: i32,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::product_variations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductVariationEntity {
    pub id: i32,
    pub product_id: i32,
    pub label: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub sale_from: Option<DateTime<Utc>>,
    pub sale_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::product_addons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductAddonEntity {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::platform_surcharges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlatformSurchargeEntity {
    pub id: i32,
    pub name: String,
    pub amount: f64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub slot_id: Option<i32>,
    pub category_slug: Option<String>,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponEntity {
    pub id: i32,
    pub code: String,
    pub discount_type: String,
    pub discount_value: f64,
    pub max_discount: Option<f64>,
    pub min_order_amount: Option<f64>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub per_user_limit: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::coupon_usages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateCouponUsageEntity {
    pub coupon_id: i32,
    pub order_id: i32,
    pub customer_id: Option<i32>,
    pub guest_email: Option<String>,
}

// Vendors

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorEntity {
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub status: String,
    pub is_online: bool,
    pub vacation_start: Option<DateTime<Utc>>,
    pub vacation_end: Option<DateTime<Utc>>,
    pub rating: f64,
    pub commission_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_pincodes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorPincodeEntity {
    pub vendor_id: i32,
    pub pincode: String,
    pub delivery_charge: f64,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_working_hours)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorWorkingHoursEntity {
    pub vendor_id: i32,
    pub day_of_week: i16,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorSlotEntity {
    pub vendor_id: i32,
    pub slot_id: i32,
    pub is_enabled: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_holidays)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorHolidayEntity {
    pub vendor_id: i32,
    pub holiday_date: NaiveDate,
    pub blocked_slot_ids: Option<Vec<i32>>,
    pub reason: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_capacities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorCapacityEntity {
    pub vendor_id: i32,
    pub delivery_date: NaiveDate,
    pub slot_id: i32,
    pub max_orders: i32,
    pub booked_orders: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorProductEntity {
    pub vendor_id: i32,
    pub product_id: i32,
    pub preparation_time: i32,
    pub is_available: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendor_area_surcharges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorAreaSurchargeEntity {
    pub id: i32,
    pub vendor_id: i32,
    pub zone_id: i32,
    pub amount: f64,
    pub is_active: bool,
}

// Addresses

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressEntity {
    pub id: i32,
    pub customer_id: Option<i32>,
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub pincode: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::addresses)]
pub struct CreateAddressEntity {
    pub customer_id: Option<i32>,
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub pincode: String,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub id: i32,
    pub customer_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(belongs_to(CartEntity, foreign_key = cart_id))]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemEntity {
    pub id: i32,
    pub cart_id: i32,
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub quantity: i32,
    pub addon_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub customer_id: i32,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CreateCartItemEntity {
    pub cart_id: i32,
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub quantity: i32,
    pub addon_ids: Vec<i32>,
}

// Orders

#[derive(Queryable, Serialize, Selectable, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub customer_id: Option<i32>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub vendor_id: Option<i32>,
    pub address_id: i32,
    pub status: String,
    pub payment_method: String,
    pub allocation: String,
    pub delivery_date: NaiveDate,
    pub delivery_slot: String,
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charge: f64,
    pub surcharge: f64,
    pub cod_fee: f64,
    pub total: f64,
    pub coupon_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub customer_id: Option<i32>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub vendor_id: Option<i32>,
    pub address_id: i32,
    pub status: String,
    pub payment_method: String,
    pub allocation: String,
    pub delivery_date: NaiveDate,
    pub delivery_slot: String,
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charge: f64,
    pub surcharge: f64,
    pub cod_fee: f64,
    pub total: f64,
    pub coupon_id: Option<i32>,
}

#[derive(Queryable, Serialize, Selectable, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub variation_label: Option<String>,
    pub quantity: i32,
    pub price: f64,
    pub addons: Value,
    pub addon_total: f64,
    pub pending_file_key: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub variation_label: Option<String>,
    pub quantity: i32,
    pub price: f64,
    pub addons: Value,
    pub addon_total: f64,
    pub pending_file_key: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderStatusHistoryEntity {
    pub order_id: i32,
    pub status: String,
    pub note: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::partner_earnings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreatePartnerEarningEntity {
    pub order_id: i32,
    pub vendor_id: i32,
    pub gross_amount: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub net_amount: f64,
}

// Payments

#[derive(Queryable, Serialize, Selectable, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: Uuid,
    pub order_id: i32,
    pub amount: f64,
    pub status: String,
    pub provider: String,
    pub provider_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreatePaymentEntity {
    pub order_id: i32,
    pub amount: f64,
    pub provider: String,
    pub status: String,
}
