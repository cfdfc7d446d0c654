use axum::{extract::Request, middleware::Next, response::Response};

/// Header set by the upstream gateway once it has authenticated a customer.
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// Identity of the caller. `id` is `None` for guest checkouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Customer {
    pub id: Option<i32>,
}

impl Customer {
    pub fn is_guest(&self) -> bool {
        self.id.is_none()
    }
}

/// Resolves the caller's identity and makes it available as `Extension<Customer>`.
/// A missing or malformed header means the request is treated as a guest.
pub async fn customer_identity(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(CUSTOMER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i32>().ok())
        .filter(|id| *id > 0);

    req.extensions_mut().insert(Customer { id });
    next.run(req).await
}
