//! Order placement and its follow-up work.

pub mod catalog;
pub mod composer;
pub mod effects;
pub mod post_order;
pub mod pricing;
