use anyhow::Result;
use utoipa::openapi::{
    OpenApi,
    security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::common::middleware::CUSTOMER_ID_HEADER;

pub fn create_swagger_ui(mut openapi: OpenApi) -> Result<SwaggerUi> {
    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
        "customerId",
        SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(CUSTOMER_ID_HEADER))),
    );

    Ok(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
}
