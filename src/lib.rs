pub mod allocation;
pub mod api;
pub mod charges;
pub mod common;
pub mod coupons;
pub mod models;
pub mod orders;
pub mod routes;
pub mod schema;
