use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use futures::{FutureExt, future::BoxFuture};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::{
    api::files::{order_file_destination, promote_pending_file},
    charges::money::{to_decimal, to_f64},
    common::db::DbPool,
    models::{
        CreateCouponUsageEntity, CreateOrderStatusHistoryEntity, CreatePartnerEarningEntity,
    },
    orders::post_order::{AssignedVendor, PostOrderEffect, PostOrderEffects, PostOrderJob},
    schema::{
        cart_items, carts, coupon_usages, coupons, order_items, order_status_history,
        partner_earnings,
    },
};

/// Commission and payout of a vendor for an order subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Earning {
    pub gross: Decimal,
    pub commission: Decimal,
    pub net: Decimal,
}

pub fn partner_earning(subtotal: f64, commission_rate: f64) -> Earning {
    let gross = to_decimal(subtotal);
    let commission = gross * to_decimal(commission_rate) / Decimal::ONE_HUNDRED;
    Earning {
        gross,
        commission,
        net: gross - commission,
    }
}

/// Post-order effects backed by the order database and the file service.
#[derive(Clone)]
pub struct StoreEffects {
    db_pool: DbPool,
    http_client: Client,
    file_service_url: String,
}

impl StoreEffects {
    pub fn new(db_pool: DbPool, http_client: Client, file_service_url: String) -> Self {
        Self {
            db_pool,
            http_client,
            file_service_url,
        }
    }

    async fn record_status_history(&self, job: &PostOrderJob) -> Result<()> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::insert_into(order_status_history::table)
            .values(CreateOrderStatusHistoryEntity {
                order_id: job.order_id,
                status: "PENDING".into(),
                note: Some("Order placed".into()),
            })
            .execute(conn)
            .await
            .context("Failed to insert order status history")?;
        Ok(())
    }

    async fn accrue_partner_earning(
        &self,
        job: &PostOrderJob,
        vendor: AssignedVendor,
    ) -> Result<()> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let earning = partner_earning(job.subtotal, vendor.commission_rate);
        diesel::insert_into(partner_earnings::table)
            .values(CreatePartnerEarningEntity {
                order_id: job.order_id,
                vendor_id: vendor.vendor_id,
                gross_amount: to_f64(earning.gross),
                commission_rate: vendor.commission_rate,
                commission_amount: to_f64(earning.commission),
                net_amount: to_f64(earning.net),
            })
            .on_conflict(partner_earnings::order_id)
            .do_nothing()
            .execute(conn)
            .await
            .context("Failed to insert partner earning")?;
        Ok(())
    }

    async fn promote_files(&self, job: &PostOrderJob) -> Result<()> {
        for file in &job.pending_files {
            let destination = order_file_destination(job.order_id, file.order_item_id);
            let path = promote_pending_file(
                &self.http_client,
                &self.file_service_url,
                &file.key,
                &destination,
            )
            .await
            .with_context(|| format!("Failed to promote pending file {}", file.key))?;

            let conn = &mut self
                .db_pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::update(order_items::table.find(file.order_item_id))
                .set(order_items::file_path.eq(path))
                .execute(conn)
                .await
                .context("Failed to update order item file path")?;
        }
        Ok(())
    }

    async fn record_coupon_usage(&self, job: &PostOrderJob, coupon_id: i32) -> Result<()> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let usage = CreateCouponUsageEntity {
            coupon_id,
            order_id: job.order_id,
            customer_id: job.customer_id,
            guest_email: job.guest_email.clone(),
        };

        conn.transaction(move |conn| {
            Box::pin(async move {
                diesel::update(coupons::table.find(coupon_id))
                    .set(coupons::used_count.eq(coupons::used_count + 1))
                    .execute(conn)
                    .await
                    .context("Failed to increment coupon usage")?;

                diesel::insert_into(coupon_usages::table)
                    .values(usage)
                    .execute(conn)
                    .await
                    .context("Failed to insert coupon usage")?;

                Ok::<(), anyhow::Error>(())
            })
        })
        .await
    }

    async fn clear_cart(&self, customer_id: i32) -> Result<()> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let cart_ids = carts::table
            .filter(carts::customer_id.eq(customer_id))
            .select(carts::id);

        let removed = diesel::delete(cart_items::table.filter(cart_items::cart_id.eq_any(cart_ids)))
            .execute(conn)
            .await
            .context("Failed to clear cart")?;

        tracing::debug!(customer_id, removed, "Cart cleared");
        Ok(())
    }
}

impl PostOrderEffects for StoreEffects {
    fn run<'a>(
        &'a self,
        job: &'a PostOrderJob,
        effect: PostOrderEffect,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            match effect {
                PostOrderEffect::StatusHistory => self.record_status_history(job).await,
                PostOrderEffect::PartnerEarning => match job.vendor {
                    Some(vendor) => self.accrue_partner_earning(job, vendor).await,
                    None => Ok(()),
                },
                PostOrderEffect::FilePromotion => self.promote_files(job).await,
                PostOrderEffect::CouponUsage => match job.coupon_id {
                    Some(coupon_id) => self.record_coupon_usage(job, coupon_id).await,
                    None => Ok(()),
                },
                PostOrderEffect::CartClearing => match job.customer_id {
                    Some(customer_id) => self.clear_cart(customer_id).await,
                    None => Ok(()),
                },
            }
        }
        .boxed()
    }
}
