use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    models::{CreateOrderStatusHistoryEntity, OrderEntity, PaymentEntity},
    schema::{order_status_history, orders, payments},
};

/// Defines the simulated payment gateway callbacks.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/payments",
        OpenApiRouter::new().routes(utoipa_axum::routes!(mock_pay)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct MockPayRes {
    updated_payment: PaymentEntity,
    updated_order: OrderEntity,
}

/// Mock payment operation for demonstration purposes.
#[utoipa::path(
    post,
    path = "/{id}/mock-pay",
    tags = ["Payments"],
    params(
        ("id" = Uuid, Path, description = "Payment ID to mark as paid")
    ),
    responses(
        (status = 200, description = "Payment successfully marked as paid", body = StdResponse<MockPayRes, String>),
        (status = 404, description = "No pending payment for a pending order")
    )
)]
pub async fn mock_pay(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (updated_payment, updated_order) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let updated_payment = diesel::update(
                    payments::table
                        .find(id)
                        .filter(payments::status.eq("PENDING")),
                )
                .set((
                    payments::status.eq("PAID"),
                    payments::updated_at.eq(diesel::dsl::now),
                ))
                .returning(PaymentEntity::as_returning())
                .get_result(conn)
                .await
                .optional()
                .context("Failed to update payment status")?
                .ok_or(AppError::NotFound)?;

                let updated_order = diesel::update(
                    orders::table
                        .find(updated_payment.order_id)
                        .filter(orders::status.eq("PENDING")),
                )
                .set((
                    orders::status.eq("CONFIRMED"),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
                .optional()
                .context("Failed to update order status")?
                .ok_or(AppError::NotFound)?;

                diesel::insert_into(order_status_history::table)
                    .values(CreateOrderStatusHistoryEntity {
                        order_id: updated_order.id,
                        status: "CONFIRMED".into(),
                        note: Some(format!("Payment {id} received")),
                    })
                    .execute(conn)
                    .await
                    .context("Failed to insert order status history")?;

                Ok::<(PaymentEntity, OrderEntity), AppError>((updated_payment, updated_order))
            })
        })
        .await?;

    tracing::info!(order_id = updated_order.id, payment_id = %id, "Order confirmed");

    Ok(StdResponse {
        data: Some(MockPayRes {
            updated_order,
            updated_payment,
        }),
        message: Some("Payment paid successfully"),
    })
}
