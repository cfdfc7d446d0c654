use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    models::{OrderEntity, OrderItemEntity},
    schema::{order_items, orders},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(get_orders)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct GetOrderRes {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
}

/// Pairs each order with its items, keeping the order of `orders`.
pub async fn with_items(
    conn: &mut AsyncPgConnection,
    orders: Vec<OrderEntity>,
) -> Result<Vec<GetOrderRes>> {
    let order_ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by(order_items::id.asc())
        .select(OrderItemEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    let mut group: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        group.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| GetOrderRes {
            order_items: group.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Fetch a specific order.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
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
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
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

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    /// Only orders assigned to this vendor.
    vendor_id: Option<i32>,
    /// `STRICT`, `FALLBACK` or `UNASSIGNED`.
    allocation: Option<String>,
}

/// Fetch all orders, newest first. Operations use the allocation filter to
/// review fallback and unassigned orders.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    params(OrderFilter),
    responses(
        (status = 200, description = "List all orders", body = StdResponse<Vec<GetOrderRes>, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut query = orders::table
        .select(OrderEntity::as_select())
        .order_by(orders::created_at.desc())
        .into_boxed();
    if let Some(vendor_id) = filter.vendor_id {
        query = query.filter(orders::vendor_id.eq(vendor_id));
    }
    if let Some(allocation) = filter.allocation {
        query = query.filter(orders::allocation.eq(allocation.to_uppercase()));
    }

    let orders: Vec<OrderEntity> = query
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    Ok(StdResponse {
        data: Some(with_items(conn, orders).await?),
        message: Some("Get orders successfully"),
    })
}
