use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, Customer},
    },
    models::{CreatePaymentEntity, OrderEntity, PaymentEntity},
    orders::composer::{ComposedOrderRes, CreateOrderReq, OrderComposer, PaymentMethod},
    routes::orders::{GetOrderRes, with_items},
    schema::{orders, payments},
};

/// Defines customer-facing order routes. Guests may only place orders.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/customers/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_my_orders))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(create_payment_for_order))
            .route_layer(axum::middleware::from_fn(middleware::customer_identity)),
    )
}

fn require_customer(customer: &Customer) -> Result<i32, AppError> {
    customer.id.ok_or(AppError::Unauthorized)
}

/// Place an order. Works for signed-in customers and guests.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Customer Orders"],
    security((), ("customerId" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<ComposedOrderRes, String>),
        (status = 400, description = "Invalid cart, address, date, slot or coupon"),
        (status = 404, description = "Address not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let composed = OrderComposer::new(&state.config.ordering)
        .compose(conn, customer, body, Utc::now())
        .await?;

    state.post_order.enqueue(composed.job);

    Ok(StdResponse {
        data: Some(composed.res),
        message: Some("Created order successfully"),
    })
}

/// Fetch all orders belonging to the signed-in customer.
#[utoipa::path(
    get,
    path = "/my-orders",
    tags = ["Customer Orders"],
    security(("customerId" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<GetOrderRes>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = require_customer(&customer)?;
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let orders: Vec<OrderEntity> = orders::table
        .filter(orders::customer_id.eq(customer_id))
        .order_by(orders::updated_at.desc())
        .select(OrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get my orders")?;

    Ok(StdResponse {
        data: Some(with_items(conn, orders).await?),
        message: Some("Get my orders successfully"),
    })
}

/// Fetch a specific order belonging to the signed-in customer.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Customer Orders"],
    security(("customerId" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = require_customer(&customer)?;
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
        .filter(orders::customer_id.eq(customer_id))
        .select(OrderEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get order")?
        .ok_or(AppError::NotFound)?;

    let res = with_items(conn, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;

    Ok(StdResponse {
        data: Some(res),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePaymentForOrderReq {
    pub provider: String,
}

/// Create a simulated online payment for a pending order.
#[utoipa::path(
    post,
    path = "/{id}/payment",
    tags = ["Customer Orders"],
    security(("customerId" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to create payment for")
    ),
    request_body = CreatePaymentForOrderReq,
    responses(
        (status = 200, description = "Created payment successfully", body = StdResponse<PaymentEntity, String>),
        (status = 400, description = "Unknown provider or cash-on-delivery order"),
        (status = 404, description = "No pending order with this id")
    )
)]
async fn create_payment_for_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(body): Json<CreatePaymentForOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = require_customer(&customer)?;

    match body.provider.as_str() {
        "qr_payment" | "card" => {}
        _ => {
            return Err(AppError::BadRequest(format!(
                "{} is not a valid payment provider",
                body.provider
            )));
        }
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
        .filter(orders::customer_id.eq(customer_id))
        .filter(orders::status.eq("PENDING"))
        .select(OrderEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get order")?
        .ok_or(AppError::NotFound)?;

    if order.payment_method == PaymentMethod::Cod.as_str() {
        return Err(AppError::BadRequest(
            "Cash-on-delivery orders are paid on delivery".into(),
        ));
    }

    let payment = diesel::insert_into(payments::table)
        .values(CreatePaymentEntity {
            order_id: order.id,
            amount: order.total,
            provider: body.provider,
            status: "PENDING".into(),
        })
        .returning(PaymentEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create payment")?;

    Ok(StdResponse {
        data: Some(payment),
        message: Some("Created payment successfully"),
    })
}
