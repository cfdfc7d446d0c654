use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    models::{CategoryEntity, ProductAddonEntity, ProductEntity, ProductVariationEntity},
    orders::pricing::{CartLine, Catalog},
    schema::{categories, product_addons, product_variations, products},
};

/// Loads the catalog rows referenced by `lines`, active or not. Activity is
/// judged by the pricing step so that every problem is reported at once.
pub async fn load_catalog(conn: &mut AsyncPgConnection, lines: &[CartLine]) -> Result<Catalog> {
    let product_ids: Vec<i32> = lines.iter().map(|line| line.product_id).collect();
    let variation_ids: Vec<i32> = lines.iter().filter_map(|line| line.variation_id).collect();
    let addon_ids: Vec<i32> = lines
        .iter()
        .flat_map(|line| line.addon_ids.iter().copied())
        .collect();

    let product_rows: Vec<ProductEntity> = products::table
        .filter(products::id.eq_any(&product_ids))
        .select(ProductEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get products")?;

    let variation_rows: Vec<ProductVariationEntity> = if variation_ids.is_empty() {
        Vec::new()
    } else {
        product_variations::table
            .filter(product_variations::id.eq_any(&variation_ids))
            .select(ProductVariationEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get product variations")?
    };

    let addon_rows: Vec<ProductAddonEntity> = if addon_ids.is_empty() {
        Vec::new()
    } else {
        product_addons::table
            .filter(product_addons::id.eq_any(&addon_ids))
            .select(ProductAddonEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get product addons")?
    };

    let category_ids: Vec<i32> = product_rows.iter().filter_map(|p| p.category_id).collect();
    let category_rows: Vec<CategoryEntity> = categories::table
        .filter(categories::id.eq_any(&category_ids))
        .select(CategoryEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get categories")?;

    Ok(Catalog {
        products: product_rows.into_iter().map(|p| (p.id, p)).collect(),
        variations: variation_rows.into_iter().map(|v| (v.id, v)).collect(),
        addons: addon_rows.into_iter().map(|a| (a.id, a)).collect(),
        category_slugs: category_rows.into_iter().map(|c| (c.id, c.slug)).collect(),
    })
}
