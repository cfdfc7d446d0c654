//! Best-effort work that follows a committed order.
//!
//! Jobs travel over an unbounded channel to a worker started at boot. Each
//! effect of a job runs concurrently under its own timeout; failures and
//! timeouts are logged and never reach the customer or the order row.

use std::{fmt, sync::Arc, time::Duration};

use futures::future::{BoxFuture, join_all};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostOrderEffect {
    StatusHistory,
    PartnerEarning,
    FilePromotion,
    CouponUsage,
    CartClearing,
}

impl PostOrderEffect {
    pub const ALL: [PostOrderEffect; 5] = [
        PostOrderEffect::StatusHistory,
        PostOrderEffect::PartnerEarning,
        PostOrderEffect::FilePromotion,
        PostOrderEffect::CouponUsage,
        PostOrderEffect::CartClearing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostOrderEffect::StatusHistory => "status_history",
            PostOrderEffect::PartnerEarning => "partner_earning",
            PostOrderEffect::FilePromotion => "file_promotion",
            PostOrderEffect::CouponUsage => "coupon_usage",
            PostOrderEffect::CartClearing => "cart_clearing",
        }
    }
}

impl fmt::Display for PostOrderEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignedVendor {
    pub vendor_id: i32,
    pub commission_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub order_item_id: i32,
    pub key: String,
}

/// Snapshot of a committed order, enough to run every effect without
/// re-reading the order.
#[derive(Debug, Clone, PartialEq)]
pub struct PostOrderJob {
    pub order_id: i32,
    pub vendor: Option<AssignedVendor>,
    pub subtotal: f64,
    pub customer_id: Option<i32>,
    pub guest_email: Option<String>,
    pub coupon_id: Option<i32>,
    pub pending_files: Vec<PendingFile>,
}

impl PostOrderJob {
    /// Effects that have something to do for this order.
    pub fn effects(&self) -> Vec<PostOrderEffect> {
        PostOrderEffect::ALL
            .into_iter()
            .filter(|effect| match effect {
                PostOrderEffect::StatusHistory => true,
                PostOrderEffect::PartnerEarning => self.vendor.is_some(),
                PostOrderEffect::FilePromotion => !self.pending_files.is_empty(),
                PostOrderEffect::CouponUsage => self.coupon_id.is_some(),
                PostOrderEffect::CartClearing => self.customer_id.is_some(),
            })
            .collect()
    }
}

pub trait PostOrderEffects: Send + Sync + 'static {
    fn run<'a>(
        &'a self,
        job: &'a PostOrderJob,
        effect: PostOrderEffect,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    Completed,
    Failed,
    TimedOut,
}

/// Runs every applicable effect of `job` concurrently, each bounded by
/// `timeout`.
pub async fn process_job<E: PostOrderEffects + ?Sized>(
    effects: &E,
    job: &PostOrderJob,
    timeout: Duration,
) -> Vec<(PostOrderEffect, EffectOutcome)> {
    let runs = job.effects().into_iter().map(|effect| async move {
        let outcome = match tokio::time::timeout(timeout, effects.run(job, effect)).await {
            Ok(Ok(())) => EffectOutcome::Completed,
            Ok(Err(err)) => {
                tracing::warn!(
                    order_id = job.order_id,
                    effect = %effect,
                    error = ?err,
                    "Post-order effect failed"
                );
                EffectOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(
                    order_id = job.order_id,
                    effect = %effect,
                    timeout_ms = timeout.as_millis() as u64,
                    "Post-order effect timed out"
                );
                EffectOutcome::TimedOut
            }
        };
        (effect, outcome)
    });

    let outcomes = join_all(runs).await;
    tracing::debug!(order_id = job.order_id, ?outcomes, "Post-order job finished");
    outcomes
}

#[derive(Debug, Clone)]
pub struct PostOrderQueue {
    tx: mpsc::UnboundedSender<PostOrderJob>,
}

impl PostOrderQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PostOrderJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hands the job to the worker. Never blocks the caller.
    pub fn enqueue(&self, job: PostOrderJob) {
        let order_id = job.order_id;
        if self.tx.send(job).is_err() {
            tracing::error!(order_id, "Post-order worker is gone, effects dropped");
        }
    }
}

/// Drains the queue until every sender is dropped. Jobs are processed on
/// their own tasks so a slow job does not hold back the next one.
pub async fn run_worker<E: PostOrderEffects>(
    mut rx: mpsc::UnboundedReceiver<PostOrderJob>,
    effects: Arc<E>,
    timeout: Duration,
) {
    tracing::info!("Post-order worker started");

    let mut running = tokio::task::JoinSet::new();
    while let Some(job) = rx.recv().await {
        let effects = Arc::clone(&effects);
        running.spawn(async move {
            process_job(effects.as_ref(), &job, timeout).await;
        });
        while running.try_join_next().is_some() {}
    }

    while running.join_next().await.is_some() {}
    tracing::info!("Post-order worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> PostOrderJob {
        PostOrderJob {
            order_id: 1,
            vendor: None,
            subtotal: 500.0,
            customer_id: None,
            guest_email: Some("guest@example.com".to_string()),
            coupon_id: None,
            pending_files: vec![],
        }
    }

    #[test]
    fn guest_order_without_extras_only_records_history() {
        assert_eq!(job().effects(), vec![PostOrderEffect::StatusHistory]);
    }

    #[test]
    fn every_effect_applies_to_a_full_order() {
        let full = PostOrderJob {
            vendor: Some(AssignedVendor {
                vendor_id: 3,
                commission_rate: 15.0,
            }),
            customer_id: Some(9),
            coupon_id: Some(2),
            pending_files: vec![PendingFile {
                order_item_id: 4,
                key: "uploads/tmp/photo.jpg".to_string(),
            }],
            ..job()
        };
        assert_eq!(full.effects(), PostOrderEffect::ALL.to_vec());
    }

    #[tokio::test]
    async fn enqueue_after_worker_exit_does_not_panic() {
        let (queue, rx) = PostOrderQueue::channel();
        drop(rx);
        queue.enqueue(job());
    }
}
