use anyhow::Context;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper, upsert::excluded};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, Customer},
    },
    models::{CartEntity, CartItemEntity, CreateCartEntity, CreateCartItemEntity},
    orders::pricing::MAX_LINE_QUANTITY,
    schema::{cart_items, carts},
};

/// Defines the signed-in customer's persistent cart routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/customers/cart",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart, replace_cart))
            .route_layer(axum::middleware::from_fn(middleware::customer_identity)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct GetCartRes {
    pub cart: Option<CartEntity>,
    pub cart_items: Vec<CartItemEntity>,
}

async fn load_cart(conn: &mut AsyncPgConnection, customer_id: i32) -> anyhow::Result<GetCartRes> {
    let cart: Option<CartEntity> = carts::table
        .filter(carts::customer_id.eq(customer_id))
        .select(CartEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get cart")?;

    let cart_items: Vec<CartItemEntity> = match &cart {
        Some(cart) => cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .order_by(cart_items::id.asc())
            .select(CartItemEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get cart items")?,
        None => Vec::new(),
    };

    Ok(GetCartRes { cart, cart_items })
}

/// Fetch the signed-in customer's cart.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Carts"],
    security(("customerId" = [])),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<GetCartRes, String>),
        (status = 401, description = "Guests have no persistent cart")
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = customer.id.ok_or(AppError::Unauthorized)?;
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(StdResponse {
        data: Some(load_cart(conn, customer_id).await?),
        message: Some("Get cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemReq {
    pub product_id: i32,
    pub variation_id: Option<i32>,
    pub quantity: i32,
    #[serde(default)]
    pub addons: Vec<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReplaceCartReq {
    pub items: Vec<CartItemReq>,
}

/// Replace the contents of the signed-in customer's cart. Prices are not
/// stored; they are resolved when the order is placed.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Carts"],
    security(("customerId" = [])),
    request_body = ReplaceCartReq,
    responses(
        (status = 200, description = "Updated cart successfully", body = StdResponse<GetCartRes, String>),
        (status = 400, description = "Invalid quantity")
    )
)]
async fn replace_cart(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(body): Json<ReplaceCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = customer.id.ok_or(AppError::Unauthorized)?;

    if let Some(item) = body
        .items
        .iter()
        .find(|item| !(1..=MAX_LINE_QUANTITY).contains(&item.quantity))
    {
        return Err(AppError::BadRequest(format!(
            "Quantity {} for product {} must be between 1 and {MAX_LINE_QUANTITY}",
            item.quantity, item.product_id
        )));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let cart_id: i32 = diesel::insert_into(carts::table)
                    .values(CreateCartEntity { customer_id })
                    .on_conflict(carts::customer_id)
                    .do_update()
                    .set(carts::customer_id.eq(excluded(carts::customer_id)))
                    .returning(carts::id)
                    .get_result(conn)
                    .await
                    .context("Failed to upsert cart")?;

                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
                    .execute(conn)
                    .await
                    .context("Failed to clear cart items")?;

                let items: Vec<CreateCartItemEntity> = body
                    .items
                    .into_iter()
                    .map(|item| CreateCartItemEntity {
                        cart_id,
                        product_id: item.product_id,
                        variation_id: item.variation_id,
                        quantity: item.quantity,
                        addon_ids: item.addons,
                    })
                    .collect();

                if !items.is_empty() {
                    diesel::insert_into(cart_items::table)
                        .values(&items)
                        .execute(conn)
                        .await
                        .context("Failed to insert cart items")?;
                }

                diesel::update(carts::table.find(cart_id))
                    .set(carts::updated_at.eq(diesel::dsl::now))
                    .execute(conn)
                    .await
                    .context("Failed to touch cart")?;

                Ok::<_, AppError>(load_cart(conn, customer_id).await?)
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(cart),
        message: Some("Updated cart successfully"),
    })
}
