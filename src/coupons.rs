//! Coupon validation and discount computation.
//!
//! A coupon that fails any rule contributes no discount and is not attached
//! to the order, so its usage counters are never touched.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;

use crate::{
    charges::money::{round_to_unit, to_decimal},
    common::app_error::AppError,
    models::CouponEntity,
    schema::{coupon_usages, coupons},
};

const MAX_CODE_LEN: usize = 32;

/// Trims the code and checks its shape. Malformed codes are a client error,
/// unlike unknown or expired ones.
pub fn validate_code_shape(code: &str) -> Result<String, AppError> {
    let code = code.trim();
    let well_formed = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !well_formed {
        return Err(AppError::BadRequest(format!(
            "Invalid coupon code: expected 1 to {MAX_CODE_LEN} letters, digits, '-' or '_'"
        )));
    }
    Ok(code.to_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percent,
    Flat,
}

impl DiscountType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "PERCENT" | "PERCENTAGE" => Some(DiscountType::Percent),
            "FLAT" | "FIXED" => Some(DiscountType::Flat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponRejection {
    #[error("coupon is inactive")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("order is below the coupon minimum")]
    BelowMinimum,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("per-customer usage limit reached")]
    PerUserLimitReached,
    #[error("unknown discount type {0}")]
    UnknownDiscountType(String),
}

/// Discount the coupon grants on `subtotal`, before whole-unit rounding.
/// `usage_count` is how often the current customer or guest already used it.
pub fn evaluate(
    coupon: &CouponEntity,
    subtotal: Decimal,
    usage_count: i64,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if coupon.valid_from.is_some_and(|from| now < from) {
        return Err(CouponRejection::NotStarted);
    }
    if coupon.valid_to.is_some_and(|to| now > to) {
        return Err(CouponRejection::Expired);
    }
    if coupon
        .min_order_amount
        .is_some_and(|min| subtotal < to_decimal(min))
    {
        return Err(CouponRejection::BelowMinimum);
    }
    if coupon
        .usage_limit
        .is_some_and(|limit| coupon.used_count >= limit)
    {
        return Err(CouponRejection::UsageLimitReached);
    }
    if coupon
        .per_user_limit
        .is_some_and(|limit| usage_count >= i64::from(limit))
    {
        return Err(CouponRejection::PerUserLimitReached);
    }

    let value = to_decimal(coupon.discount_value);
    let discount = match DiscountType::parse(&coupon.discount_type) {
        Some(DiscountType::Percent) => {
            let raw = subtotal * value / Decimal::ONE_HUNDRED;
            match coupon.max_discount {
                Some(cap) => raw.min(to_decimal(cap)),
                None => raw,
            }
        }
        Some(DiscountType::Flat) => value,
        None => {
            return Err(CouponRejection::UnknownDiscountType(
                coupon.discount_type.clone(),
            ));
        }
    };

    Ok(discount.max(Decimal::ZERO).min(subtotal))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedCoupon {
    pub coupon_id: i32,
    /// Whole currency units.
    pub discount: Decimal,
}

/// Who is redeeming the coupon, for per-user limits.
#[derive(Debug, Clone, Copy)]
pub enum Redeemer<'a> {
    Customer(i32),
    Guest(&'a str),
}

/// Looks up `code` and evaluates it. Returns `None` when the code is unknown
/// or any rule fails.
pub async fn resolve_coupon(
    conn: &mut AsyncPgConnection,
    code: &str,
    subtotal: Decimal,
    redeemer: Redeemer<'_>,
    now: DateTime<Utc>,
) -> Result<Option<AppliedCoupon>> {
    let coupon: Option<CouponEntity> = coupons::table
        .filter(coupons::code.eq(code))
        .select(CouponEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get coupon")?;

    let Some(coupon) = coupon else {
        tracing::info!(code, "Unknown coupon code ignored");
        return Ok(None);
    };

    let usage_count: i64 = match redeemer {
        Redeemer::Customer(customer_id) => coupon_usages::table
            .filter(coupon_usages::coupon_id.eq(coupon.id))
            .filter(coupon_usages::customer_id.eq(customer_id))
            .count()
            .get_result(conn)
            .await
            .context("Failed to count coupon usages")?,
        Redeemer::Guest(email) => coupon_usages::table
            .filter(coupon_usages::coupon_id.eq(coupon.id))
            .filter(coupon_usages::guest_email.eq(email))
            .count()
            .get_result(conn)
            .await
            .context("Failed to count coupon usages")?,
    };

    match evaluate(&coupon, subtotal, usage_count, now) {
        Ok(discount) => Ok(Some(AppliedCoupon {
            coupon_id: coupon.id,
            discount: round_to_unit(discount),
        })),
        Err(reason) => {
            tracing::info!(coupon_id = coupon.id, %reason, "Coupon not applied");
            Ok(None)
        }
    }
}
